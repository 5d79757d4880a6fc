//! Browser-facing checkout routes.

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
};
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::views,
    domain::entities::account::AccountId,
    use_cases::checkout::CallbackOutcome,
};

/// Query string the provider appends to the return and cancel URLs.
#[derive(Deserialize)]
struct ChargeParams {
    #[serde(rename = "accountId")]
    account_id: String,
    token: Option<String>,
    q: Option<String>,
}

/// GET /
async fn landing() -> Html<String> {
    Html(views::landing_page())
}

/// GET /redirect
/// Creates a billing account and sends the browser to the provider.
async fn begin_checkout(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let started = app_state.checkout_use_cases.begin_checkout().await?;

    tracing::info!(
        account_id = %started.account.account_id,
        location = %started.redirect.location,
        "redirecting to payment provider"
    );

    Ok(Redirect::to(started.redirect.location.as_str()))
}

/// GET /charge?accountId=...&token=...
/// Provider callback. Charges the account unless the user cancelled.
async fn charge(
    State(app_state): State<AppState>,
    Query(params): Query<ChargeParams>,
) -> AppResult<impl IntoResponse> {
    let account_id = AccountId::new(params.account_id);

    if CallbackOutcome::from_query(params.q.as_deref()) == CallbackOutcome::Cancelled {
        app_state.checkout_use_cases.cancel_checkout(&account_id);
        return Ok(Html(views::cancelled_page(&account_id)));
    }

    let token = params
        .token
        .ok_or_else(|| AppError::InvalidInput("Missing token".into()))?;

    let completed = app_state
        .checkout_use_cases
        .complete_checkout(&account_id, &token)
        .await?;

    Ok(Html(views::invoice_page(
        &completed.invoice,
        &completed.phase_label,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/redirect", get(begin_checkout))
        .route("/charge", get(charge))
}
