//! Webhook error taxonomy.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics. Gateways treat
//! 5xx as "retry forever", so malformed or replayed deliveries must never
//! surface as 500 - only genuine store failures do.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

use super::codec::CodecError;
use super::provider::Provider;
use super::signature::SignatureError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header missing or did not match the configured secret.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Request body was not valid JSON.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Payload carried no `sessionId` string field.
    #[error("Missing sessionId")]
    MissingSessionId,

    /// Provider codec could not extract the canonical fields.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// Callback arrived on a different provider's endpoint than the one the
    /// session was opened with.
    #[error("Provider mismatch: session belongs to {expected}, callback from {actual}")]
    ProviderMismatch { expected: Provider, actual: Provider },

    /// The path segment named a gateway this deployment does not support.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Referenced checkout session could not be found.
    #[error("Session not found")]
    SessionNotFound,

    /// The session points at a price that no longer exists.
    #[error("Price not found")]
    PriceNotFound,

    /// Transactional store operation failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if the gateway should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes drive gateway retry behavior:
    /// - 4xx: client error, no retry
    /// - 5xx: server error, gateway will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,

            WebhookError::MalformedPayload(_)
            | WebhookError::MissingSessionId
            | WebhookError::Codec(_)
            | WebhookError::ProviderMismatch { .. } => StatusCode::BAD_REQUEST,

            WebhookError::UnknownProvider(_)
            | WebhookError::SessionNotFound
            | WebhookError::PriceNotFound => StatusCode::NOT_FOUND,

            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SignatureError> for WebhookError {
    fn from(_: SignatureError) -> Self {
        WebhookError::InvalidSignature
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Store(err.to_string())
    }
}
