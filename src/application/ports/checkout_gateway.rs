use async_trait::async_trait;
use url::Url;

use crate::{app_error::AppResult, domain::entities::account::AccountId};

/// URLs the provider sends the browser back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub return_url: Url,
    pub cancel_url: Url,
}

/// Parameters for setting up a provider-hosted checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSetup {
    pub account_id: AccountId,
    pub currency: String,
    /// Payment plugin hosting the checkout endpoint.
    pub plugin_name: String,
    pub urls: CheckoutUrls,
    pub billing_agreement_description: String,
}

/// Where the browser has to go to approve the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub location: Url,
}

/// Payment provider checkout setup.
///
/// A successful setup is a redirect; anything else is an error.
#[async_trait]
pub trait CheckoutGatewayPort: Send + Sync {
    async fn setup_checkout(&self, setup: &CheckoutSetup) -> AppResult<CheckoutRedirect>;
}
