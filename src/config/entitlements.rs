//! Entitlement collaborator configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Entitlement application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementsConfig {
    /// Internal URL of the marketplace's apply-entitlements endpoint
    pub apply_url: String,
}

impl EntitlementsConfig {
    /// Validate entitlements configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.apply_url.is_empty() {
            return Err(ValidationError::MissingRequired("ENTITLEMENTS_APPLY_URL"));
        }
        if !self.apply_url.starts_with("http://") && !self.apply_url.starts_with("https://") {
            return Err(ValidationError::InvalidApplyUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_urls() {
        let config = EntitlementsConfig {
            apply_url: "http://marketplace.internal/api/entitlements/apply".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_urls() {
        let config = EntitlementsConfig {
            apply_url: "ftp://somewhere".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_url() {
        let config = EntitlementsConfig {
            apply_url: String::new(),
        };
        assert!(config.validate().is_err());
    }
}
