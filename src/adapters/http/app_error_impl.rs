use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let code = self.code();
        match self {
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, Some(msg)),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, None),
            AppError::Upstream { message, .. } => {
                error_resp(StatusCode::BAD_GATEWAY, code, Some(message))
            }
            AppError::UnexpectedProviderResponse(_) => {
                error_resp(StatusCode::BAD_GATEWAY, code, None)
            }
            AppError::InvoiceNotReady => error_resp(StatusCode::GATEWAY_TIMEOUT, code, None),
            AppError::Internal(_) => error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
