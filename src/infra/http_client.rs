//! HTTP client factory for outbound calls to the billing server.
//!
//! Redirects are never followed: the payment plugin answers checkout setup
//! with a redirect meant for the browser, and the caller needs to see it.

use reqwest::{Client, redirect};
use std::time::Duration;

/// Default connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (total request/response time).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct HttpClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Build an HTTP client with the given timeouts and redirects disabled.
pub fn try_build_client(settings: &HttpClientSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(redirect::Policy::none())
        .build()
}
