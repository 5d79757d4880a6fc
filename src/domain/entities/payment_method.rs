use serde::{Deserialize, Serialize};

use super::account::AccountId;

/// Identifier of a payment method registered on an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentMethodId(pub String);

impl PaymentMethodId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentMethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A provider token to be attached to an account through a payment plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentMethod {
    pub account_id: AccountId,
    pub plugin_name: String,
    /// Opaque token issued by the payment provider on callback.
    pub token: String,
    pub is_default: bool,
}
