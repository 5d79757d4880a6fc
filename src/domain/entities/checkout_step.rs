use strum::Display;

/// Progress of one checkout attempt. Steps only move forward; a failure at
/// any step ends the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CheckoutStep {
    Start,
    AccountCreated,
    ProviderRedirectIssued,
    CallbackReceived,
    PaymentMethodAdded,
    SubscriptionCreated,
    InvoiceRendered,
}

impl CheckoutStep {
    pub fn next(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Start => Some(CheckoutStep::AccountCreated),
            CheckoutStep::AccountCreated => Some(CheckoutStep::ProviderRedirectIssued),
            CheckoutStep::ProviderRedirectIssued => Some(CheckoutStep::CallbackReceived),
            CheckoutStep::CallbackReceived => Some(CheckoutStep::PaymentMethodAdded),
            CheckoutStep::PaymentMethodAdded => Some(CheckoutStep::SubscriptionCreated),
            CheckoutStep::SubscriptionCreated => Some(CheckoutStep::InvoiceRendered),
            CheckoutStep::InvoiceRendered => None,
        }
    }
}
