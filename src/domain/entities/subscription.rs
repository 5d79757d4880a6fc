use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::account::AccountId;

/// Identifier of a subscription created on the billing server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ProductCategory {
    Base,
    AddOn,
    Standalone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum BillingPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    NoBillingPeriod,
}

/// Catalog plan phase. Phase names on the server follow
/// `<product>-<period>-<phase>` in lowercase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PhaseType {
    Trial,
    Discount,
    Fixedterm,
    Evergreen,
}

/// Replaces the price of one plan phase for this subscription only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasePriceOverride {
    pub phase_type: PhaseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_price: Option<f64>,
}

impl PhasePriceOverride {
    pub fn fixed(phase_type: PhaseType, price: f64) -> Self {
        Self {
            phase_type,
            fixed_price: Some(price),
            recurring_price: None,
        }
    }
}

/// Product and plan selection for a new subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPlan {
    pub product_name: String,
    pub product_category: ProductCategory,
    pub billing_period: BillingPeriod,
    pub price_list: String,
    pub price_overrides: Vec<PhasePriceOverride>,
}

/// Fixed price charged for the trial phase of the demo plan.
pub const TRIAL_FIXED_PRICE: f64 = 10.0;

impl SubscriptionPlan {
    /// The demo plan: monthly `Sports` base product whose trial phase is
    /// overridden to a non-zero fixed price so the provider actually charges.
    pub fn sports_monthly_trial() -> Self {
        Self {
            product_name: "Sports".to_string(),
            product_category: ProductCategory::Base,
            billing_period: BillingPeriod::Monthly,
            price_list: "DEFAULT".to_string(),
            price_overrides: vec![PhasePriceOverride::fixed(
                PhaseType::Trial,
                TRIAL_FIXED_PRICE,
            )],
        }
    }

    /// Server-side name of the given phase of this plan.
    pub fn phase_name(&self, phase: PhaseType) -> String {
        format!(
            "{}-{}-{}",
            self.product_name.to_lowercase(),
            self.billing_period.as_ref().to_lowercase(),
            phase.as_ref().to_lowercase()
        )
    }
}

/// Subscription creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub account_id: AccountId,
    pub plan: SubscriptionPlan,
}
