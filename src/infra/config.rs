use std::{net::SocketAddr, time::Duration};

use env_helpers::get_env_default;
use secrecy::SecretString;
use url::Url;

use crate::{
    domain::entities::account::NewAccount,
    infra::{
        http_client::HttpClientSettings,
        killbill_client::{AuditContext, KillBillCredentials},
    },
    use_cases::checkout::{CheckoutSettings, InvoiceWait},
};

pub const BILLING_AGREEMENT_DESCRIPTION: &str = "Your subscription";

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Public origin of this app; the provider sends the browser back here.
    pub app_origin: Url,
    /// Billing server base URL.
    pub kb_url: Url,
    /// Provider publishable key, if the deployment has one.
    pub publishable_key: Option<SecretString>,
    pub kb_username: String,
    pub kb_password: SecretString,
    pub kb_api_key: String,
    pub kb_api_secret: SecretString,
    pub audit_user: String,
    pub audit_reason: String,
    pub audit_comment: String,
    /// Payment plugin used both for checkout setup and payment methods.
    pub payment_plugin_name: String,
    pub demo_account_name: String,
    pub demo_account_currency: String,
    /// When non-zero, subscription creation asks the server to wait for
    /// completion up to this many seconds.
    pub subscription_call_timeout_secs: u64,
    pub invoice_poll_initial_delay_ms: u64,
    pub invoice_poll_max_delay_ms: u64,
    pub invoice_poll_max_attempts: usize,
    pub invoice_settle_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:4567".parse().unwrap());
        let app_origin: Url =
            get_env_default("APP_ORIGIN", "http://localhost:4567".parse().unwrap());
        let kb_url: Url = get_env_default("KB_URL", "http://127.0.0.1:8080".parse().unwrap());
        let publishable_key: Option<SecretString> = std::env::var("PUBLISHABLE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| SecretString::new(key.into()));

        let kb_username: String = get_env_default("KB_USERNAME", "admin".to_string());
        let kb_password =
            SecretString::new(get_env_default("KB_PASSWORD", "password".to_string()).into());
        let kb_api_key: String = get_env_default("KB_API_KEY", "bob".to_string());
        let kb_api_secret =
            SecretString::new(get_env_default("KB_API_SECRET", "lazar".to_string()).into());

        let audit_user: String = get_env_default("KB_AUDIT_USER", "demo".to_string());
        let audit_reason: String =
            get_env_default("KB_AUDIT_REASON", "New subscription".to_string());
        let audit_comment: String =
            get_env_default("KB_AUDIT_COMMENT", "Triggered by checkout demo".to_string());

        let payment_plugin_name: String =
            get_env_default("PAYMENT_PLUGIN_NAME", "killbill-paypal-express".to_string());
        let demo_account_name: String =
            get_env_default("DEMO_ACCOUNT_NAME", "John Doe".to_string());
        let demo_account_currency: String =
            get_env_default("DEMO_ACCOUNT_CURRENCY", "USD".to_string());

        let subscription_call_timeout_secs: u64 =
            get_env_default("SUBSCRIPTION_CALL_TIMEOUT_SECS", 0);
        let invoice_poll_initial_delay_ms: u64 =
            get_env_default("INVOICE_POLL_INITIAL_DELAY_MS", 500);
        let invoice_poll_max_delay_ms: u64 = get_env_default("INVOICE_POLL_MAX_DELAY_MS", 4_000);
        let invoice_poll_max_attempts: usize = get_env_default("INVOICE_POLL_MAX_ATTEMPTS", 8);
        let invoice_settle_timeout_secs: u64 = get_env_default("INVOICE_SETTLE_TIMEOUT_SECS", 20);
        let http_connect_timeout_secs: u64 = get_env_default("HTTP_CONNECT_TIMEOUT_SECS", 5);
        let http_request_timeout_secs: u64 = get_env_default("HTTP_REQUEST_TIMEOUT_SECS", 30);

        Self {
            bind_addr,
            app_origin,
            kb_url,
            publishable_key,
            kb_username,
            kb_password,
            kb_api_key,
            kb_api_secret,
            audit_user,
            audit_reason,
            audit_comment,
            payment_plugin_name,
            demo_account_name,
            demo_account_currency,
            subscription_call_timeout_secs,
            invoice_poll_initial_delay_ms,
            invoice_poll_max_delay_ms,
            invoice_poll_max_attempts,
            invoice_settle_timeout_secs,
            http_connect_timeout_secs,
            http_request_timeout_secs,
        }
    }

    pub fn killbill_credentials(&self) -> KillBillCredentials {
        KillBillCredentials {
            username: self.kb_username.clone(),
            password: self.kb_password.clone(),
            api_key: self.kb_api_key.clone(),
            api_secret: self.kb_api_secret.clone(),
        }
    }

    pub fn audit_context(&self) -> AuditContext {
        AuditContext {
            created_by: self.audit_user.clone(),
            reason: self.audit_reason.clone(),
            comment: self.audit_comment.clone(),
        }
    }

    pub fn subscription_call_timeout(&self) -> Option<Duration> {
        (self.subscription_call_timeout_secs > 0)
            .then(|| Duration::from_secs(self.subscription_call_timeout_secs))
    }

    pub fn http_client_settings(&self) -> HttpClientSettings {
        HttpClientSettings {
            connect_timeout: Duration::from_secs(self.http_connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http_request_timeout_secs),
        }
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            demo_account: NewAccount::new(&self.demo_account_name, &self.demo_account_currency),
            plugin_name: self.payment_plugin_name.clone(),
            app_origin: self.app_origin.clone(),
            billing_agreement_description: BILLING_AGREEMENT_DESCRIPTION.to_string(),
            invoice_wait: InvoiceWait {
                initial_delay: Duration::from_millis(self.invoice_poll_initial_delay_ms),
                max_delay: Duration::from_millis(self.invoice_poll_max_delay_ms),
                max_attempts: self.invoice_poll_max_attempts,
                timeout: Duration::from_secs(self.invoice_settle_timeout_secs),
            },
        }
    }
}
