//! In-memory stand-in for the billing server and its payment plugin.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        billing::BillingPort,
        checkout_gateway::{CheckoutGatewayPort, CheckoutRedirect, CheckoutSetup},
    },
    domain::entities::{
        account::{Account, AccountId, NewAccount},
        invoice::{Invoice, InvoiceItem},
        payment_method::{NewPaymentMethod, PaymentMethodId},
        subscription::{NewSubscription, PhaseType, SubscriptionId},
    },
    test_utils::{create_test_account, test_date},
};

const PROVIDER_CHECKOUT_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr";

#[derive(Default)]
struct BillingState {
    accounts: HashMap<AccountId, Account>,
    payment_methods: Vec<NewPaymentMethod>,
    subscriptions: Vec<(SubscriptionId, NewSubscription)>,
    invoices: HashMap<AccountId, Vec<Invoice>>,
    /// Invoices that show up after the given number of further polls.
    pending_invoices: HashMap<AccountId, (usize, Invoice)>,
    invoice_polls: usize,
    checkout_setups: Vec<CheckoutSetup>,
}

// ============================================================================
// InMemoryBilling
// ============================================================================

/// Implements both `BillingPort` and `CheckoutGatewayPort`, records every
/// write, and generates an invoice for each new subscription.
pub struct InMemoryBilling {
    state: Mutex<BillingState>,
    invoice_delay_polls: usize,
    generate_invoices: bool,
    reject_payment_methods: bool,
    reject_subscriptions: bool,
    fail_invoice_listing: bool,
    fail_checkout_setup: bool,
}

impl Default for InMemoryBilling {
    fn default() -> Self {
        Self {
            state: Mutex::new(BillingState::default()),
            invoice_delay_polls: 0,
            generate_invoices: true,
            reject_payment_methods: false,
            reject_subscriptions: false,
            fail_invoice_listing: false,
            fail_checkout_setup: false,
        }
    }
}

impl InMemoryBilling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoices appear only after `polls` empty listings.
    pub fn with_invoice_delay(mut self, polls: usize) -> Self {
        self.invoice_delay_polls = polls;
        self
    }

    /// Subscriptions never produce an invoice.
    pub fn without_invoicing(mut self) -> Self {
        self.generate_invoices = false;
        self
    }

    /// The payment plugin refuses the provider token.
    pub fn rejecting_payment_methods(mut self) -> Self {
        self.reject_payment_methods = true;
        self
    }

    pub fn rejecting_subscriptions(mut self) -> Self {
        self.reject_subscriptions = true;
        self
    }

    /// Every invoice listing fails with a server error.
    pub fn failing_invoice_listing(mut self) -> Self {
        self.fail_invoice_listing = true;
        self
    }

    /// Checkout setup answers without a redirect.
    pub fn failing_checkout_setup(mut self) -> Self {
        self.fail_checkout_setup = true;
        self
    }

    pub fn seed_account(&self, name: &str, currency: &str) -> Account {
        self.insert_account(create_test_account(|a| {
            a.name = Some(name.to_string());
            a.currency = Some(currency.to_string());
        }))
    }

    pub fn insert_account(&self, account: Account) -> Account {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(account.account_id.clone(), account.clone());
        account
    }

    /// Append an invoice to the account's listing.
    pub fn push_invoice(&self, account_id: &AccountId, invoice: Invoice) {
        self.state
            .lock()
            .unwrap()
            .invoices
            .entry(account_id.clone())
            .or_default()
            .push(invoice);
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    pub fn payment_method_count(&self) -> usize {
        self.state.lock().unwrap().payment_methods.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().unwrap().subscriptions.len()
    }

    pub fn invoice_polls(&self) -> usize {
        self.state.lock().unwrap().invoice_polls
    }

    pub fn payment_methods(&self) -> Vec<NewPaymentMethod> {
        self.state.lock().unwrap().payment_methods.clone()
    }

    pub fn subscriptions(&self) -> Vec<NewSubscription> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .map(|(_, sub)| sub.clone())
            .collect()
    }

    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn checkout_setups(&self) -> Vec<CheckoutSetup> {
        self.state.lock().unwrap().checkout_setups.clone()
    }

    fn trial_invoice(account: &Account, id: &SubscriptionId, sub: &NewSubscription) -> Invoice {
        let trial_price = sub
            .plan
            .price_overrides
            .iter()
            .find(|o| o.phase_type == PhaseType::Trial)
            .and_then(|o| o.fixed_price)
            .unwrap_or_default();

        Invoice {
            invoice_id: format!("inv-{}", uuid::Uuid::new_v4()),
            amount: trial_price,
            currency: account.currency.clone(),
            invoice_date: Some(test_date()),
            items: vec![InvoiceItem {
                invoice_item_id: Some(format!("item-{}", uuid::Uuid::new_v4())),
                subscription_id: Some(id.to_string()),
                amount: trial_price,
                phase_name: Some(sub.plan.phase_name(PhaseType::Trial)),
                start_date: Some(test_date()),
                end_date: None,
                description: None,
            }],
        }
    }
}

#[async_trait]
impl BillingPort for InMemoryBilling {
    async fn create_account(&self, account: &NewAccount) -> AppResult<Account> {
        let created = create_test_account(|a| {
            a.name = Some(account.name.clone());
            a.currency = Some(account.currency.clone());
        });
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(created.account_id.clone(), created.clone());
        Ok(created)
    }

    async fn get_account(&self, account_id: &AccountId) -> AppResult<Option<Account>> {
        Ok(self.state.lock().unwrap().accounts.get(account_id).cloned())
    }

    async fn create_payment_method(
        &self,
        payment_method: &NewPaymentMethod,
    ) -> AppResult<PaymentMethodId> {
        if self.reject_payment_methods {
            return Err(AppError::Upstream {
                status: 502,
                message: "Payment plugin rejected the token".into(),
            });
        }

        let mut state = self.state.lock().unwrap();
        if !state.accounts.contains_key(&payment_method.account_id) {
            return Err(AppError::Upstream {
                status: 404,
                message: "Account does not exist".into(),
            });
        }
        state.payment_methods.push(payment_method.clone());
        Ok(PaymentMethodId::new(format!("pm-{}", uuid::Uuid::new_v4())))
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> AppResult<SubscriptionId> {
        if self.reject_subscriptions {
            return Err(AppError::Upstream {
                status: 400,
                message: "Could not find a product matching 'Sports'".into(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get(&subscription.account_id)
            .cloned()
            .ok_or_else(|| AppError::Upstream {
                status: 404,
                message: "Account does not exist".into(),
            })?;

        let id = SubscriptionId::new(format!("sub-{}", uuid::Uuid::new_v4()));
        if self.generate_invoices {
            let invoice = Self::trial_invoice(&account, &id, subscription);
            state
                .pending_invoices
                .insert(account.account_id.clone(), (self.invoice_delay_polls, invoice));
        }
        state.subscriptions.push((id.clone(), subscription.clone()));
        Ok(id)
    }

    async fn list_invoices(&self, account_id: &AccountId) -> AppResult<Vec<Invoice>> {
        let mut state = self.state.lock().unwrap();
        state.invoice_polls += 1;
        if self.fail_invoice_listing {
            return Err(AppError::Upstream {
                status: 500,
                message: "Internal server error".into(),
            });
        }

        let ready = match state.pending_invoices.get_mut(account_id) {
            Some((0, _)) => true,
            Some((remaining, _)) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if ready {
            if let Some((_, invoice)) = state.pending_invoices.remove(account_id) {
                state
                    .invoices
                    .entry(account_id.clone())
                    .or_default()
                    .insert(0, invoice);
            }
        }

        Ok(state.invoices.get(account_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CheckoutGatewayPort for InMemoryBilling {
    async fn setup_checkout(&self, setup: &CheckoutSetup) -> AppResult<CheckoutRedirect> {
        if self.fail_checkout_setup {
            return Err(AppError::UnexpectedProviderResponse(
                "expected a redirect, got 200 OK".into(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        state.checkout_setups.push(setup.clone());

        let mut location: url::Url = PROVIDER_CHECKOUT_URL
            .parse()
            .map_err(|e| AppError::Internal(format!("{e}")))?;
        location
            .query_pairs_mut()
            .append_pair("cmd", "_express-checkout")
            .append_pair("token", &format!("EC-{}", state.checkout_setups.len()));
        Ok(CheckoutRedirect { location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invoice_appears_after_delay() {
        let billing = InMemoryBilling::new().with_invoice_delay(1);
        let account = billing.seed_account("John Doe", "USD");
        billing
            .create_subscription(&NewSubscription {
                account_id: account.account_id.clone(),
                plan: crate::domain::entities::subscription::SubscriptionPlan::sports_monthly_trial(),
            })
            .await
            .unwrap();

        assert!(billing.list_invoices(&account.account_id).await.unwrap().is_empty());
        let invoices = billing.list_invoices(&account.account_id).await.unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].amount, 10.0);
        assert_eq!(billing.invoice_polls(), 2);
    }
}
