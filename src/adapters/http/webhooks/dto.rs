//! Wire DTOs for the webhook endpoint.

use serde::Serialize;

/// Success acknowledgement returned to the gateway.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    pub ok: bool,
    /// `"PAID"` or `"FAILED"`.
    pub status: &'static str,
}

/// Error body for rejected deliveries.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_serializes_wire_shape() {
        let ack = CallbackAck {
            ok: true,
            status: "PAID",
        };
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "status": "PAID"}));
    }

    #[test]
    fn error_response_carries_message() {
        let body = ErrorResponse::new("Session not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Session not found"}));
    }
}
