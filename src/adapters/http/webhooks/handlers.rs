//! HTTP handlers for the gateway webhook endpoint.
//!
//! These handlers connect axum routes to the reconciliation command
//! handler. Webhook requests carry no user authentication; they are
//! authorized by the signature header alone.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::billing::{
    ProcessGatewayCallbackCommand, ProcessGatewayCallbackHandler,
};
use crate::domain::billing::{Provider, WebhookError};

use super::dto::{CallbackAck, ErrorResponse};

/// Header carrying the gateway's shared-secret signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub callbacks: Arc<ProcessGatewayCallbackHandler>,
}

/// `POST /webhooks/{provider}`
///
/// Responds `200 {ok:true, status:"PAID"|"FAILED"}` on every successfully
/// processed delivery (a "payment failed" notification is still a
/// successfully processed webhook). Rejections are 4xx with a short error
/// message; only store failures produce a 5xx, which gateways will retry.
pub async fn handle_gateway_callback(
    State(state): State<WebhookAppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let provider: Provider = provider
        .parse()
        .map_err(|_| WebhookError::UnknownProvider(provider))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let outcome = state
        .callbacks
        .handle(ProcessGatewayCallbackCommand {
            provider,
            signature,
            body: body.to_vec(),
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(CallbackAck {
            ok: true,
            status: outcome.wire_status(),
        }),
    ))
}

/// API error newtype mapping [`WebhookError`] onto HTTP responses.
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "webhook processing failed on the store side");
        } else {
            tracing::debug!(error = %self.0, status = %status, "webhook delivery rejected");
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
