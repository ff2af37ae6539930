//! Payment provider discriminator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of supported payment gateways.
///
/// Each variant has a dedicated codec; adding a gateway means adding a
/// variant and a codec, never another string branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Zarinpal,
    Idpay,
    Nextpay,
}

impl Provider {
    /// All supported providers.
    pub const ALL: [Provider; 3] = [Provider::Zarinpal, Provider::Idpay, Provider::Nextpay];

    /// Returns the canonical lowercase name used in URLs and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Zarinpal => "zarinpal",
            Provider::Idpay => "idpay",
            Provider::Nextpay => "nextpay",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a provider name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown provider: {}", self.0)
    }
}

impl std::error::Error for UnknownProvider {}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zarinpal" => Ok(Provider::Zarinpal),
            "idpay" => Ok(Provider::Idpay),
            "nextpay" => Ok(Provider::Nextpay),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}
