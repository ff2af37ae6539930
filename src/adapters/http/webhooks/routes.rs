//! Axum router configuration for the webhook endpoints.

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{handle_gateway_callback, WebhookAppState};

/// Create the per-provider webhook routes.
///
/// # Routes
///
/// - `POST /{provider}` - gateway callback (signature verified, no user auth)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/:provider", post(handle_gateway_callback))
}

/// Create the complete webhook router, mounted at `/webhooks`.
///
/// # Example
///
/// ```ignore
/// let app = webhook_router(WebhookAppState { callbacks });
/// axum::serve(listener, app).await?;
/// ```
pub fn webhook_router(state: WebhookAppState) -> Router {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
