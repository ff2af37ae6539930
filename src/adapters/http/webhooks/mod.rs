//! Gateway webhook HTTP adapter.

mod dto;
mod handlers;
mod routes;

pub use dto::{CallbackAck, ErrorResponse};
pub use handlers::{handle_gateway_callback, WebhookApiError, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
