//! Webhook signature verification.
//!
//! The gateways send a static shared secret in the `X-Webhook-Signature`
//! header; there is no payload-bound MAC on this wire. Verification is a
//! constant-time comparison against the configured secret, with a
//! per-provider secret taking precedence over the shared one. When no
//! secret is configured at all, verification is bypassed (sandbox mode) -
//! configuration validation refuses that in production.

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::provider::Provider;

/// Webhook secrets, one optional slot per provider plus a shared fallback.
#[derive(Debug, Clone, Default)]
pub struct ProviderSecrets {
    pub zarinpal: Option<SecretString>,
    pub idpay: Option<SecretString>,
    pub nextpay: Option<SecretString>,
    pub shared: Option<SecretString>,
}

impl ProviderSecrets {
    /// Returns the effective secret for a provider, if any is configured.
    pub fn secret_for(&self, provider: Provider) -> Option<&SecretString> {
        let specific = match provider {
            Provider::Zarinpal => self.zarinpal.as_ref(),
            Provider::Idpay => self.idpay.as_ref(),
            Provider::Nextpay => self.nextpay.as_ref(),
        };
        specific.or(self.shared.as_ref())
    }

    /// True when no secret is configured for any provider.
    pub fn is_sandbox(&self) -> bool {
        Provider::ALL.iter().all(|p| self.secret_for(*p).is_none())
    }
}

/// Result of a successful signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// The header matched the configured secret.
    Verified,
    /// No secret configured for this provider; check skipped.
    SandboxBypass,
}

/// Signature verification failures. Both map to HTTP 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Invalid signature")]
    Mismatch,

    #[error("Missing signature header")]
    Missing,
}

/// Verifier for the shared-secret webhook signature header.
pub struct SignatureVerifier {
    secrets: ProviderSecrets,
}

impl SignatureVerifier {
    /// Creates a verifier over the configured secrets.
    pub fn new(secrets: ProviderSecrets) -> Self {
        Self { secrets }
    }

    /// Verifies the signature header for a provider.
    ///
    /// # Errors
    ///
    /// - `SignatureError::Missing` - a secret is configured but the header
    ///   is absent or empty
    /// - `SignatureError::Mismatch` - the header does not equal the secret
    pub fn verify(
        &self,
        provider: Provider,
        header: Option<&str>,
    ) -> Result<SignatureCheck, SignatureError> {
        let secret = match self.secrets.secret_for(provider) {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    provider = %provider,
                    "no webhook secret configured; accepting unsigned callback (sandbox mode)"
                );
                return Ok(SignatureCheck::SandboxBypass);
            }
        };

        let header = match header {
            Some(h) if !h.is_empty() => h,
            _ => return Err(SignatureError::Missing),
        };

        if constant_time_compare(header.as_bytes(), secret.expose_secret().as_bytes()) {
            Ok(SignatureCheck::Verified)
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// A length mismatch is rejected up front; the byte comparison itself never
/// short-circuits, so timing reveals nothing about where a same-length
/// candidate diverges from the secret.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets_with_shared(shared: &str) -> ProviderSecrets {
        ProviderSecrets {
            shared: Some(SecretString::new(shared.to_string())),
            ..ProviderSecrets::default()
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Secret Resolution Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn provider_secret_takes_precedence_over_shared() {
        let secrets = ProviderSecrets {
            idpay: Some(SecretString::new("idpay-secret".into())),
            shared: Some(SecretString::new("shared-secret".into())),
            ..ProviderSecrets::default()
        };
        let verifier = SignatureVerifier::new(secrets);

        assert_eq!(
            verifier.verify(Provider::Idpay, Some("idpay-secret")),
            Ok(SignatureCheck::Verified)
        );
        assert_eq!(
            verifier.verify(Provider::Idpay, Some("shared-secret")),
            Err(SignatureError::Mismatch)
        );
        // Other providers still fall back to the shared secret.
        assert_eq!(
            verifier.verify(Provider::Zarinpal, Some("shared-secret")),
            Ok(SignatureCheck::Verified)
        );
    }

    #[test]
    fn sandbox_detection() {
        assert!(ProviderSecrets::default().is_sandbox());
        assert!(!secrets_with_shared("s").is_sandbox());
    }

    // ══════════════════════════════════════════════════════════════
    // Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn accepts_matching_signature() {
        let verifier = SignatureVerifier::new(secrets_with_shared("whk_secret_1"));
        assert_eq!(
            verifier.verify(Provider::Zarinpal, Some("whk_secret_1")),
            Ok(SignatureCheck::Verified)
        );
    }

    #[test]
    fn rejects_wrong_signature_of_equal_length() {
        let verifier = SignatureVerifier::new(secrets_with_shared("whk_secret_1"));
        assert_eq!(
            verifier.verify(Provider::Zarinpal, Some("whk_secret_2")),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_wrong_signature_of_different_length() {
        let verifier = SignatureVerifier::new(secrets_with_shared("whk_secret_1"));
        assert_eq!(
            verifier.verify(Provider::Zarinpal, Some("short")),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verifier.verify(Provider::Zarinpal, Some("whk_secret_1_with_suffix")),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_missing_or_empty_header_when_secret_configured() {
        let verifier = SignatureVerifier::new(secrets_with_shared("whk_secret_1"));
        assert_eq!(
            verifier.verify(Provider::Idpay, None),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verifier.verify(Provider::Idpay, Some("")),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn sandbox_mode_accepts_anything() {
        let verifier = SignatureVerifier::new(ProviderSecrets::default());
        assert_eq!(
            verifier.verify(Provider::Nextpay, None),
            Ok(SignatureCheck::SandboxBypass)
        );
        assert_eq!(
            verifier.verify(Provider::Nextpay, Some("whatever")),
            Ok(SignatureCheck::SandboxBypass)
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(b"abc", b"abc"));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(b"abc", b"abd"));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }

    #[test]
    fn constant_time_compare_empty_slices() {
        assert!(constant_time_compare(b"", b""));
    }
}
