use std::sync::Arc;

use axum::extract::FromRef;

use crate::{infra::config::AppConfig, use_cases::checkout::CheckoutUseCases};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub checkout_use_cases: Arc<CheckoutUseCases>,
}

impl FromRef<AppState> for Arc<CheckoutUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.checkout_use_cases.clone()
    }
}
