//! Error types for the webhooks crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Errors that can occur in webhook operations.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Webhook URL failed validation.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Webhook URL points at a private or internal destination.
    #[error("SSRF protection: {0}")]
    SsrfDetected(String),

    /// Endpoint did not accept the connectivity probe.
    #[error("Webhook URL test failed: {0}")]
    ProbeFailed(String),

    /// Tenant has reached the configuration limit.
    #[error("Configuration limit ({limit}) reached for tenant")]
    ConfigurationLimitExceeded { limit: i64 },

    /// Webhook configuration not found.
    #[error("Webhook configuration not found")]
    ConfigurationNotFound,

    /// Webhook configuration exists but is disabled.
    #[error("Webhook configuration is inactive")]
    ConfigurationInactive,

    /// Delivery log not found.
    #[error("Webhook delivery log not found")]
    DeliveryNotFound,

    /// Secret encryption or decryption failed.
    #[error("Encryption error: {0}")]
    EncryptionFailed(String),

    /// Request is missing tenant identity.
    #[error("Not authenticated")]
    Unauthorized,

    /// Request body failed validation.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body returned to API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type identifier.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            WebhookError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            WebhookError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "invalid_url"),
            WebhookError::SsrfDetected(_) => (StatusCode::BAD_REQUEST, "ssrf_detected"),
            WebhookError::ProbeFailed(_) => (StatusCode::BAD_REQUEST, "probe_failed"),
            WebhookError::ConfigurationLimitExceeded { .. } => {
                (StatusCode::CONFLICT, "configuration_limit_exceeded")
            }
            WebhookError::ConfigurationNotFound => {
                (StatusCode::NOT_FOUND, "configuration_not_found")
            }
            WebhookError::ConfigurationInactive => {
                (StatusCode::CONFLICT, "configuration_inactive")
            }
            WebhookError::DeliveryNotFound => (StatusCode::NOT_FOUND, "delivery_not_found"),
            WebhookError::EncryptionFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "encryption_error")
            }
            WebhookError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            WebhookError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            WebhookError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience alias for handler results.
pub type ApiResult<T> = Result<T, WebhookError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
