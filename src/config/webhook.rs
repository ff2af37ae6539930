//! Webhook signature configuration
//!
//! Per-provider shared secrets with a global fallback. Leaving every slot
//! empty disables signature enforcement (sandbox mode); validation refuses
//! that combination in production.

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::billing::ProviderSecrets;

use super::error::ValidationError;
use super::server::Environment;

/// Webhook configuration (gateway shared secrets)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// ZarinPal callback secret
    pub zarinpal_secret: Option<SecretString>,

    /// IDPay callback secret
    pub idpay_secret: Option<SecretString>,

    /// NextPay callback secret
    pub nextpay_secret: Option<SecretString>,

    /// Fallback secret used for providers without their own
    pub shared_secret: Option<SecretString>,
}

impl WebhookConfig {
    /// Materializes the secrets for the signature verifier.
    pub fn secrets(&self) -> ProviderSecrets {
        ProviderSecrets {
            zarinpal: self.zarinpal_secret.clone(),
            idpay: self.idpay_secret.clone(),
            nextpay: self.nextpay_secret.clone(),
            shared: self.shared_secret.clone(),
        }
    }

    /// True when no secret is configured for any provider.
    pub fn is_sandbox(&self) -> bool {
        self.secrets().is_sandbox()
    }

    /// Validate webhook configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production && self.is_sandbox() {
            return Err(ValidationError::SandboxModeInProduction);
        }
        if self.is_sandbox() {
            tracing::warn!(
                "webhook signature enforcement disabled; all callbacks will be accepted unsigned"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_sandbox() {
        assert!(WebhookConfig::default().is_sandbox());
    }

    #[test]
    fn any_secret_leaves_sandbox() {
        let config = WebhookConfig {
            shared_secret: Some(SecretString::new("s".into())),
            ..WebhookConfig::default()
        };
        assert!(!config.is_sandbox());
    }

    #[test]
    fn sandbox_is_rejected_in_production() {
        let config = WebhookConfig::default();
        assert!(config.validate(&Environment::Production).is_err());
        assert!(config.validate(&Environment::Development).is_ok());
    }

    #[test]
    fn configured_secrets_pass_production_validation() {
        let config = WebhookConfig {
            shared_secret: Some(SecretString::new("whk_live".into())),
            ..WebhookConfig::default()
        };
        assert!(config.validate(&Environment::Production).is_ok());
    }
}
