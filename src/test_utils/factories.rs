//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::NaiveDate;
use secrecy::SecretString;

use crate::{
    domain::entities::{
        account::{Account, AccountId},
        invoice::{Invoice, InvoiceItem},
    },
    infra::config::AppConfig,
    use_cases::checkout::CheckoutSettings,
};

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Create a test account with sensible defaults.
pub fn create_test_account(overrides: impl FnOnce(&mut Account)) -> Account {
    let mut account = Account {
        account_id: AccountId::new(uuid::Uuid::new_v4().to_string()),
        name: Some("John Doe".to_string()),
        currency: Some("USD".to_string()),
    };
    overrides(&mut account);
    account
}

/// Create a test invoice holding one trial line.
pub fn create_test_invoice(overrides: impl FnOnce(&mut Invoice)) -> Invoice {
    let mut invoice = Invoice {
        invoice_id: format!("inv-{}", uuid::Uuid::new_v4()),
        amount: 10.0,
        currency: Some("USD".to_string()),
        invoice_date: Some(test_date()),
        items: vec![create_test_invoice_item(|_| {})],
    };
    overrides(&mut invoice);
    invoice
}

pub fn create_test_invoice_item(overrides: impl FnOnce(&mut InvoiceItem)) -> InvoiceItem {
    let mut item = InvoiceItem {
        invoice_item_id: Some(format!("item-{}", uuid::Uuid::new_v4())),
        subscription_id: Some("sub-test".to_string()),
        amount: 10.0,
        phase_name: Some("sports-monthly-trial".to_string()),
        start_date: Some(test_date()),
        end_date: None,
        description: None,
    };
    overrides(&mut item);
    item
}

/// Config with local defaults and millisecond-scale invoice polling.
pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:4567".parse().unwrap(),
        app_origin: "http://localhost:4567".parse().unwrap(),
        kb_url: "http://127.0.0.1:8080".parse().unwrap(),
        publishable_key: None,
        kb_username: "admin".to_string(),
        kb_password: SecretString::new("password".into()),
        kb_api_key: "bob".to_string(),
        kb_api_secret: SecretString::new("lazar".into()),
        audit_user: "demo".to_string(),
        audit_reason: "New subscription".to_string(),
        audit_comment: "test run".to_string(),
        payment_plugin_name: "killbill-paypal-express".to_string(),
        demo_account_name: "John Doe".to_string(),
        demo_account_currency: "USD".to_string(),
        subscription_call_timeout_secs: 0,
        invoice_poll_initial_delay_ms: 1,
        invoice_poll_max_delay_ms: 5,
        invoice_poll_max_attempts: 3,
        invoice_settle_timeout_secs: 2,
        http_connect_timeout_secs: 1,
        http_request_timeout_secs: 2,
    }
}

pub fn test_checkout_settings() -> CheckoutSettings {
    test_config().checkout_settings()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::use_cases::checkout::InvoiceWait;

    #[test]
    fn test_checkout_settings_use_fast_polling() {
        let settings = test_checkout_settings();
        assert_eq!(
            settings.invoice_wait.initial_delay,
            Duration::from_millis(1)
        );
        assert_eq!(settings.invoice_wait.max_attempts, 3);
        assert_eq!(settings.demo_account.name, "John Doe");
        assert_eq!(settings.app_origin.as_str(), "http://localhost:4567/");
    }

    #[test]
    fn test_factories_apply_overrides() {
        let account = create_test_account(|a| a.currency = Some("EUR".into()));
        assert_eq!(account.currency.as_deref(), Some("EUR"));
        assert!(!account.account_id.is_empty());

        let invoice = create_test_invoice(|i| i.items.clear());
        assert!(invoice.items.is_empty());
    }

    #[test]
    fn test_default_invoice_wait_is_bounded() {
        let wait = InvoiceWait::default();
        assert!(wait.initial_delay <= wait.max_delay);
        assert!(wait.timeout >= wait.max_delay);
    }
}
