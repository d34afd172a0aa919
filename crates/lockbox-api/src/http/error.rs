//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use lockbox_types::error::{CryptoError, VaultError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Vault lifecycle errors.
    Vault(VaultError),
    /// Authentication failure.
    Unauthorized(String),
    /// Request validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<VaultError> for AppError {
    fn from(e: VaultError) -> Self {
        AppError::Vault(e)
    }
}

impl From<CryptoError> for AppError {
    fn from(e: CryptoError) -> Self {
        AppError::Vault(VaultError::Crypto(e))
    }
}

impl AppError {
    /// Status code, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Vault(VaultError::NotFound) => (
                StatusCode::NOT_FOUND,
                "ITEM_NOT_FOUND",
                "Vault item not found".to_string(),
            ),
            AppError::Vault(VaultError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Vault(VaultError::Crypto(CryptoError::InvalidConfiguration(msg))) => {
                (StatusCode::BAD_REQUEST, "INVALID_CONFIGURATION", msg.clone())
            }
            AppError::Vault(VaultError::Crypto(CryptoError::MalformedRecord)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_RECORD",
                "Stored record is malformed".to_string(),
            ),
            AppError::Vault(VaultError::Crypto(CryptoError::DecryptionFailed)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DECRYPTION_FAILED",
                "decryption failed".to_string(),
            ),
            AppError::Vault(VaultError::Cancelled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CANCELLED",
                "Server is shutting down".to_string(),
            ),
            AppError::Vault(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "VAULT_ERROR",
                e.to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let request_id = uuid::Uuid::now_v7().to_string();
        let body = ApiResponse::error(code, &message, request_id, 0);

        (status, body).into_response()
    }
}
