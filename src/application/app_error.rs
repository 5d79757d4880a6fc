use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Upstream rejected request ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected payment provider response: {0}")]
    UnexpectedProviderResponse(String),

    #[error("No invoice available yet")]
    InvoiceNotReady,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    UpstreamRejected,
    UnexpectedProviderResponse,
    InvoiceNotReady,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UpstreamRejected => "UPSTREAM_REJECTED",
            ErrorCode::UnexpectedProviderResponse => "UNEXPECTED_PROVIDER_RESPONSE",
            ErrorCode::InvoiceNotReady => "INVOICE_NOT_READY",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Upstream { .. } => ErrorCode::UpstreamRejected,
            AppError::UnexpectedProviderResponse(_) => ErrorCode::UnexpectedProviderResponse,
            AppError::InvoiceNotReady => ErrorCode::InvoiceNotReady,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
