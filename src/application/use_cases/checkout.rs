use std::{sync::Arc, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        billing::BillingPort,
        checkout_gateway::{CheckoutGatewayPort, CheckoutRedirect, CheckoutSetup, CheckoutUrls},
    },
    domain::entities::{
        account::{Account, AccountId, NewAccount},
        checkout_step::CheckoutStep,
        invoice::Invoice,
        payment_method::{NewPaymentMethod, PaymentMethodId},
        subscription::{NewSubscription, PhaseType, SubscriptionId, SubscriptionPlan},
    },
};

/// Bounds for waiting on the invoice generated by a new subscription.
#[derive(Debug, Clone)]
pub struct InvoiceWait {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Polls after the first one.
    pub max_attempts: usize,
    /// Hard limit on the whole wait, polls and sleeps included.
    pub timeout: Duration,
}

impl Default for InvoiceWait {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            max_attempts: 8,
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub demo_account: NewAccount,
    pub plugin_name: String,
    /// Public origin of this app, used for the provider return and cancel URLs.
    pub app_origin: Url,
    pub billing_agreement_description: String,
    pub invoice_wait: InvoiceWait,
}

#[derive(Debug, Clone)]
pub struct CheckoutStarted {
    pub account: Account,
    pub redirect: CheckoutRedirect,
}

#[derive(Debug, Clone)]
pub struct CheckoutCompleted {
    pub account: Account,
    pub payment_method_id: PaymentMethodId,
    pub subscription_id: SubscriptionId,
    pub invoice: Invoice,
    /// Label shown next to each invoice line.
    pub phase_label: String,
}

/// Provider callback outcome, taken from the `q` parameter of the return URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Approved,
    Cancelled,
}

impl CallbackOutcome {
    pub const APPROVED: &'static str = "SUCCESS";
    pub const CANCELLED: &'static str = "FAILURE";

    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackOutcome::Approved => Self::APPROVED,
            CallbackOutcome::Cancelled => Self::CANCELLED,
        }
    }

    /// Anything but an explicit cancellation proceeds with the charge.
    pub fn from_query(q: Option<&str>) -> Self {
        match q {
            Some(value) if value.eq_ignore_ascii_case(Self::CANCELLED) => {
                CallbackOutcome::Cancelled
            }
            _ => CallbackOutcome::Approved,
        }
    }
}

#[derive(Clone)]
pub struct CheckoutUseCases {
    billing: Arc<dyn BillingPort>,
    gateway: Arc<dyn CheckoutGatewayPort>,
    settings: CheckoutSettings,
    plan: SubscriptionPlan,
}

impl CheckoutUseCases {
    pub fn new(
        billing: Arc<dyn BillingPort>,
        gateway: Arc<dyn CheckoutGatewayPort>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            billing,
            gateway,
            settings,
            plan: SubscriptionPlan::sports_monthly_trial(),
        }
    }

    /// Creates a fresh account and asks the provider where to send the
    /// browser. Each call creates a new account.
    #[instrument(skip(self))]
    pub async fn begin_checkout(&self) -> AppResult<CheckoutStarted> {
        let step = CheckoutStep::Start;

        let account = self
            .billing
            .create_account(&self.settings.demo_account)
            .await
            .inspect_err(|e| warn!(step = %step, error = %e, "account creation failed"))?;

        if account.account_id.is_empty() {
            return Err(AppError::Internal(
                "Billing server returned an empty account id".into(),
            ));
        }
        let step = advance(step, &account.account_id);

        let setup = CheckoutSetup {
            account_id: account.account_id.clone(),
            currency: account
                .currency
                .clone()
                .unwrap_or_else(|| self.settings.demo_account.currency.clone()),
            plugin_name: self.settings.plugin_name.clone(),
            urls: self.checkout_urls(&account.account_id)?,
            billing_agreement_description: self.settings.billing_agreement_description.clone(),
        };

        let redirect = self
            .gateway
            .setup_checkout(&setup)
            .await
            .inspect_err(|e| warn!(step = %step, error = %e, "checkout setup failed"))?;
        advance(step, &account.account_id);

        Ok(CheckoutStarted { account, redirect })
    }

    /// Attaches the provider token, subscribes the account to the demo plan
    /// and returns the first invoice once the server has produced one.
    ///
    /// The account lookup comes first, so an unknown account fails before
    /// anything is created.
    #[instrument(skip(self, token))]
    pub async fn complete_checkout(
        &self,
        account_id: &AccountId,
        token: &str,
    ) -> AppResult<CheckoutCompleted> {
        if account_id.is_empty() {
            return Err(AppError::InvalidInput("accountId must not be empty".into()));
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::InvalidInput("token must not be empty".into()));
        }

        let step = CheckoutStep::CallbackReceived;

        let account = self
            .billing
            .get_account(account_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let payment_method = NewPaymentMethod {
            account_id: account.account_id.clone(),
            plugin_name: self.settings.plugin_name.clone(),
            token: token.to_string(),
            is_default: true,
        };
        let payment_method_id = self
            .billing
            .create_payment_method(&payment_method)
            .await
            .inspect_err(|e| warn!(step = %step, error = %e, "payment method creation failed"))?;
        let step = advance(step, &account.account_id);

        let subscription = NewSubscription {
            account_id: account.account_id.clone(),
            plan: self.plan.clone(),
        };
        let subscription_id = self
            .billing
            .create_subscription(&subscription)
            .await
            .inspect_err(|e| warn!(step = %step, error = %e, "subscription creation failed"))?;
        let step = advance(step, &account.account_id);

        let invoice = self
            .wait_for_invoice(&account.account_id)
            .await
            .inspect_err(|e| warn!(step = %step, error = %e, "invoice not available"))?;
        advance(step, &account.account_id);

        Ok(CheckoutCompleted {
            account,
            payment_method_id,
            subscription_id,
            invoice,
            phase_label: self.plan.phase_name(PhaseType::Trial),
        })
    }

    /// The user backed out on the provider page. Nothing is created.
    pub fn cancel_checkout(&self, account_id: &AccountId) {
        info!(account_id = %account_id, "checkout cancelled by user");
    }

    /// Return and cancel URLs carrying the account id back to `/charge`.
    pub fn checkout_urls(&self, account_id: &AccountId) -> AppResult<CheckoutUrls> {
        Ok(CheckoutUrls {
            return_url: self.callback_url(account_id, CallbackOutcome::Approved)?,
            cancel_url: self.callback_url(account_id, CallbackOutcome::Cancelled)?,
        })
    }

    /// Resolved under the origin's path, so a prefix like `/demo` is kept.
    fn callback_url(&self, account_id: &AccountId, outcome: CallbackOutcome) -> AppResult<Url> {
        let mut base = self.settings.app_origin.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base
            .join("charge")
            .map_err(|e| AppError::Internal(format!("Invalid app origin: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("q", outcome.as_str())
            .append_pair("accountId", account_id.as_str());
        Ok(url)
    }

    /// Polls the invoice listing until one shows up. Only reads are repeated;
    /// transport or server errors end the wait immediately.
    async fn wait_for_invoice(&self, account_id: &AccountId) -> AppResult<Invoice> {
        let wait = &self.settings.invoice_wait;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(wait.initial_delay)
            .with_max_delay(wait.max_delay)
            .with_max_times(wait.max_attempts);

        let poll = (|| self.first_invoice(account_id))
            .retry(backoff)
            .when(|e| matches!(e, AppError::InvoiceNotReady))
            .notify(|_, delay: Duration| {
                debug!(account_id = %account_id, ?delay, "invoice not generated yet");
            });

        tokio::time::timeout(wait.timeout, poll)
            .await
            .map_err(|_| AppError::InvoiceNotReady)?
    }

    async fn first_invoice(&self, account_id: &AccountId) -> AppResult<Invoice> {
        self.billing
            .list_invoices(account_id)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::InvoiceNotReady)
    }
}

fn advance(step: CheckoutStep, account_id: &AccountId) -> CheckoutStep {
    let next = step.next().unwrap_or(step);
    info!(account_id = %account_id, step = %next, "checkout step reached");
    next
}
