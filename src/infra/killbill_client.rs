use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        billing::BillingPort,
        checkout_gateway::{CheckoutGatewayPort, CheckoutRedirect, CheckoutSetup},
    },
    domain::entities::{
        account::{Account, AccountId, NewAccount},
        invoice::Invoice,
        payment_method::{NewPaymentMethod, PaymentMethodId},
        subscription::{
            BillingPeriod, NewSubscription, PhasePriceOverride, ProductCategory, SubscriptionId,
        },
    },
};

const API_KEY_HEADER: &str = "X-Killbill-ApiKey";
const API_SECRET_HEADER: &str = "X-Killbill-ApiSecret";
const CREATED_BY_HEADER: &str = "X-Killbill-CreatedBy";
const REASON_HEADER: &str = "X-Killbill-Reason";
const COMMENT_HEADER: &str = "X-Killbill-Comment";

/// Tenant and user credentials sent with every request.
pub struct KillBillCredentials {
    pub username: String,
    pub password: SecretString,
    pub api_key: String,
    pub api_secret: SecretString,
}

/// Audit trail attached to every mutating request.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub created_by: String,
    pub reason: String,
    pub comment: String,
}

/// REST client for the billing server and its payment plugin endpoints.
pub struct KillBillClient {
    client: Client,
    base_url: Url,
    credentials: KillBillCredentials,
    audit: AuditContext,
    subscription_call_timeout: Option<Duration>,
}

impl KillBillClient {
    /// `client` must not follow redirects, see `infra::http_client`.
    pub fn new(
        client: Client,
        base_url: Url,
        credentials: KillBillCredentials,
        audit: AuditContext,
    ) -> Self {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            credentials,
            audit,
            subscription_call_timeout: None,
        }
    }

    /// Ask the server to hold subscription creation open until the
    /// resulting invoice and payment are done, up to `timeout`.
    pub fn with_subscription_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.subscription_call_timeout = timeout;
        self
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.username,
            self.credentials.password.expose_secret()
        ));
        format!("Basic {}", encoded)
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Billing server URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header(API_SECRET_HEADER, self.credentials.api_secret.expose_secret())
    }

    fn audited(&self, method: Method, url: Url) -> RequestBuilder {
        self.request(method, url)
            .header(CREATED_BY_HEADER, &self.audit.created_by)
            .header(REASON_HEADER, &self.audit.reason)
            .header(COMMENT_HEADER, &self.audit.comment)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        request
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Billing server request failed: {}", e)))
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    async fn fetch_account(&self, url: Url) -> AppResult<Option<Account>> {
        let response = self.send(self.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Entity creation answers `201 Created` with the new resource in `Location`.
    async fn created_location(&self, response: Response) -> AppResult<Url> {
        let status = response.status();
        if !status.is_success() {
            return Err(self.upstream_error(response).await);
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Billing server answered {} without a Location header",
                    status
                ))
            })?;

        self.base_url
            .join(location)
            .map_err(|e| AppError::Internal(format!("Invalid Location header: {}", e)))
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> AppResult<T> {
        if !response.status().is_success() {
            return Err(self.upstream_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse billing server response");
            AppError::Internal(format!("Failed to parse billing server response: {}", e))
        })
    }

    async fn upstream_error(&self, response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        tracing::error!(status = %status, body = %body, "Billing server API error");

        let message = serde_json::from_str::<KillBillErrorResponse>(&body)
            .ok()
            .and_then(|error| error.message)
            .unwrap_or(body);

        AppError::Upstream {
            status: status.as_u16(),
            message,
        }
    }
}

/// Last path segment of a resource URL, i.e. the id of the created entity.
fn id_from_location(location: &Url) -> AppResult<String> {
    location
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(str::to_string)
        .ok_or_else(|| AppError::Internal(format!("No resource id in Location {}", location)))
}

#[async_trait]
impl BillingPort for KillBillClient {
    async fn create_account(&self, account: &NewAccount) -> AppResult<Account> {
        let body = AccountBody {
            name: &account.name,
            currency: &account.currency,
        };

        let url = self.endpoint(&["1.0", "kb", "accounts"])?;
        let response = self
            .send(self.audited(Method::POST, url).json(&body))
            .await?;
        let location = self.created_location(response).await?;

        self.fetch_account(location).await?.ok_or_else(|| {
            AppError::Internal("Created account could not be read back".into())
        })
    }

    async fn get_account(&self, account_id: &AccountId) -> AppResult<Option<Account>> {
        let mut url = self.endpoint(&["1.0", "kb", "accounts", account_id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("accountWithBalance", "false")
            .append_pair("accountWithBalanceAndCBA", "false");
        self.fetch_account(url).await
    }

    async fn create_payment_method(
        &self,
        payment_method: &NewPaymentMethod,
    ) -> AppResult<PaymentMethodId> {
        let body = PaymentMethodBody {
            account_id: payment_method.account_id.as_str(),
            plugin_name: &payment_method.plugin_name,
            plugin_info: PluginInfoBody {
                properties: vec![PluginProperty {
                    key: "token",
                    value: &payment_method.token,
                    is_updatable: false,
                }],
            },
        };

        let mut url = self.endpoint(&[
            "1.0",
            "kb",
            "accounts",
            payment_method.account_id.as_str(),
            "paymentMethods",
        ])?;
        url.query_pairs_mut()
            .append_pair("isDefault", if payment_method.is_default { "true" } else { "false" });

        let response = self
            .send(self.audited(Method::POST, url).json(&body))
            .await?;
        let location = self.created_location(response).await?;
        id_from_location(&location).map(PaymentMethodId::new)
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> AppResult<SubscriptionId> {
        let plan = &subscription.plan;
        let body = SubscriptionBody {
            account_id: subscription.account_id.as_str(),
            product_name: &plan.product_name,
            product_category: plan.product_category,
            billing_period: plan.billing_period,
            price_list: &plan.price_list,
            price_overrides: &plan.price_overrides,
        };

        let mut url = self.endpoint(&["1.0", "kb", "subscriptions"])?;
        if let Some(timeout) = self.subscription_call_timeout {
            url.query_pairs_mut()
                .append_pair("callCompletion", "true")
                .append_pair("callTimeoutSec", &timeout.as_secs().to_string());
        }

        let response = self
            .send(self.audited(Method::POST, url).json(&body))
            .await?;
        let location = self.created_location(response).await?;
        id_from_location(&location).map(SubscriptionId::new)
    }

    async fn list_invoices(&self, account_id: &AccountId) -> AppResult<Vec<Invoice>> {
        let mut url = self.endpoint(&["1.0", "kb", "accounts", account_id.as_str(), "invoices"])?;
        url.query_pairs_mut().append_pair("withItems", "true");

        let response = self.send(self.request(Method::GET, url)).await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl CheckoutGatewayPort for KillBillClient {
    /// The plugin answers a successful setup with a redirect to the provider's
    /// hosted checkout. The redirect is returned, not followed.
    async fn setup_checkout(&self, setup: &CheckoutSetup) -> AppResult<CheckoutRedirect> {
        let body = SetupCheckoutBody {
            kb_account_id: setup.account_id.as_str(),
            currency: &setup.currency,
            options: SetupCheckoutOptions {
                return_url: setup.urls.return_url.as_str(),
                cancel_return_url: setup.urls.cancel_url.as_str(),
                billing_agreement: BillingAgreement {
                    description: &setup.billing_agreement_description,
                },
            },
        };

        let url = self.endpoint(&["plugins", setup.plugin_name.as_str(), "1.0", "setup-checkout"])?;
        let response = self
            .send(self.request(Method::POST, url).json(&body))
            .await?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    AppError::UnexpectedProviderResponse(format!(
                        "{} redirect without a Location header",
                        status
                    ))
                })?;
            let location = self.base_url.join(location).map_err(|e| {
                AppError::UnexpectedProviderResponse(format!("Invalid Location header: {}", e))
            })?;
            return Ok(CheckoutRedirect { location });
        }

        if status.is_success() {
            return Err(AppError::UnexpectedProviderResponse(format!(
                "expected a redirect, got {}",
                status
            )));
        }

        Err(self.upstream_error(response).await)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountBody<'a> {
    name: &'a str,
    currency: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentMethodBody<'a> {
    account_id: &'a str,
    plugin_name: &'a str,
    plugin_info: PluginInfoBody<'a>,
}

#[derive(Debug, Serialize)]
struct PluginInfoBody<'a> {
    properties: Vec<PluginProperty<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PluginProperty<'a> {
    key: &'a str,
    value: &'a str,
    is_updatable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionBody<'a> {
    account_id: &'a str,
    product_name: &'a str,
    product_category: ProductCategory,
    billing_period: BillingPeriod,
    price_list: &'a str,
    price_overrides: &'a [PhasePriceOverride],
}

/// The plugin endpoint takes snake_case keys, unlike the core API.
#[derive(Debug, Serialize)]
struct SetupCheckoutBody<'a> {
    kb_account_id: &'a str,
    currency: &'a str,
    options: SetupCheckoutOptions<'a>,
}

#[derive(Debug, Serialize)]
struct SetupCheckoutOptions<'a> {
    return_url: &'a str,
    cancel_return_url: &'a str,
    billing_agreement: BillingAgreement<'a>,
}

#[derive(Debug, Serialize)]
struct BillingAgreement<'a> {
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct KillBillErrorResponse {
    message: Option<String>,
}
