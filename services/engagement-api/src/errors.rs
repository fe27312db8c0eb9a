use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use elosya_ledger::Error as LedgerError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<prometheus::Error> for ApiError {
    fn from(err: prometheus::Error) -> Self {
        ApiError::Internal(format!("Metrics error: {}", err))
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        match self {
            ApiError::Ledger(err) if err.is_client_error() => {
                tracing::debug!(error = %err, "Request rejected");
            }
            _ if status_code.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => {}
        }

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
                LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                LedgerError::Conflict(_) => StatusCode::CONFLICT,
                LedgerError::Concurrency(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    fn error_type(&self) -> &str {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::NotFound(_) => "not_found",
                LedgerError::InsufficientBalance { .. } => "insufficient_balance",
                LedgerError::InvalidInput(_) => "invalid_input",
                LedgerError::Conflict(_) => "duplicate_error",
                LedgerError::Concurrency(_) => "service_unavailable",
                LedgerError::Config(_) => "config_error",
                _ => "storage_error",
            },
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Internal(_) => "internal_error",
        }
    }
}
