use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::ledger::LedgerError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Seats exhausted: {0}")]
    SeatsExhausted(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error")]
    StorageError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::SeatsExhausted(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::SeatsExhausted(_) => "SEATS_EXHAUSTED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::StorageError(_) => "STORAGE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::StorageError(detail) => {
                error!(error = %detail, "Storage error");
            }
            other => {
                error!(error = ?other, "Application error");
            }
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(entity) => AppError::NotFound(format!("{entity} not found")),
            LedgerError::InvalidState(msg) => AppError::InvalidState(msg.to_string()),
            LedgerError::SeatsExhausted => {
                AppError::SeatsExhausted("No seats available for this match".to_string())
            }
            LedgerError::ConcurrencyConflict => AppError::Conflict(
                "The seat inventory changed underneath this request, please retry".to_string(),
            ),
            LedgerError::Storage(detail) => AppError::StorageError(detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level messages to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidState(msg)
            | AppError::SeatsExhausted(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::StorageError(_) => "A storage error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
