use crate::{
    adapters::http::app_state::AppState,
    application::ports::{billing::BillingPort, checkout_gateway::CheckoutGatewayPort},
    infra::{
        config::AppConfig, error::InfraError, http_client::try_build_client,
        killbill_client::KillBillClient,
    },
    use_cases::checkout::CheckoutUseCases,
};
use std::fs::File;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let http_client = try_build_client(&config.http_client_settings()).map_err(InfraError::from)?;
    let killbill = Arc::new(
        KillBillClient::new(
            http_client,
            config.kb_url.clone(),
            config.killbill_credentials(),
            config.audit_context(),
        )
        .with_subscription_call_timeout(config.subscription_call_timeout()),
    );

    if config.publishable_key.is_some() {
        info!("Publishable key configured");
    } else {
        warn!("PUBLISHABLE_KEY not set; running without a publishable key");
    }
    info!(
        kb_url = %config.kb_url,
        plugin = %config.payment_plugin_name,
        "Billing server client ready"
    );

    let checkout_use_cases = CheckoutUseCases::new(
        killbill.clone() as Arc<dyn BillingPort>,
        killbill as Arc<dyn CheckoutGatewayPort>,
        config.checkout_settings(),
    );

    Ok(AppState {
        config: Arc::new(config),
        checkout_use_cases: Arc::new(checkout_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kb_checkout=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs); console only if the file can't be created
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("cannot create app.log: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
