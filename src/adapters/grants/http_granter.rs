//! HTTP adapter for the apply-entitlements collaborator.
//!
//! The rule deciding *what* a paid price grants lives in the marketplace
//! application; this adapter just delivers the request to its internal
//! endpoint. The endpoint is idempotent on its side, so the reconciliation
//! sweep can re-deliver after failures.

use async_trait::async_trait;
use std::time::Duration;

use crate::ports::{EntitlementGranter, GrantError, GrantRequest};

/// Granter that POSTs grant requests to an internal HTTP endpoint.
pub struct HttpEntitlementGranter {
    client: reqwest::Client,
    apply_url: String,
}

impl HttpEntitlementGranter {
    /// Creates a granter targeting the given apply-entitlements URL.
    pub fn new(apply_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            apply_url: apply_url.into(),
        }
    }
}

#[async_trait]
impl EntitlementGranter for HttpEntitlementGranter {
    async fn apply(&self, request: GrantRequest) -> Result<(), GrantError> {
        let response = self
            .client
            .post(&self.apply_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GrantError::Failed(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GrantError::Failed(format!(
                "apply endpoint returned {}",
                response.status()
            )))
        }
    }
}
