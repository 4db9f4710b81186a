//! Error taxonomy for the classification flow and its HTTP mapping.
//!
//! Provider and corpus failures are separate types so the classifier can
//! decide which of them may be absorbed by the fallback path. Only
//! [`ClassifyError`] ever reaches a caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the external inference call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key is configured. Raised before any network I/O.
    #[error("provider credentials are not configured")]
    MissingCredentials,

    /// The provider could not be reached or did not answer in time.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered 2xx but the completion envelope was unusable.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether the mock corpus may stand in for this failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProviderError::MissingCredentials)
    }
}

/// Failures of the mock corpus.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FallbackError {
    #[error("mock corpus is empty")]
    Empty,

    #[error("mock corpus unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to callers of the classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("API Error: {provider}. Mock Error: {fallback}")]
    FallbackExhausted {
        provider: ProviderError,
        fallback: FallbackError,
    },
}

impl IntoResponse for ClassifyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClassifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifyError::Configuration(_) | ClassifyError::FallbackExhausted { .. } => {
                error!(error = %self, "Classification request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
