use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    domain::entities::{
        account::{Account, AccountId, NewAccount},
        invoice::Invoice,
        payment_method::{NewPaymentMethod, PaymentMethodId},
        subscription::{NewSubscription, SubscriptionId},
    },
};

/// Billing server operations used by the checkout flow.
///
/// Every mutating call is attributed to the configured audit user; the
/// implementation is responsible for attaching credentials and audit data.
#[async_trait]
pub trait BillingPort: Send + Sync {
    async fn create_account(&self, account: &NewAccount) -> AppResult<Account>;

    /// Returns `Ok(None)` when the server does not know the account.
    async fn get_account(&self, account_id: &AccountId) -> AppResult<Option<Account>>;

    async fn create_payment_method(
        &self,
        payment_method: &NewPaymentMethod,
    ) -> AppResult<PaymentMethodId>;

    async fn create_subscription(&self, subscription: &NewSubscription)
    -> AppResult<SubscriptionId>;

    /// Invoices of the account, with items, in server order.
    async fn list_invoices(&self, account_id: &AccountId) -> AppResult<Vec<Invoice>>;
}
