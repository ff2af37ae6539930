//! Gateway payload codecs.
//!
//! Each supported gateway delivers a structurally different callback payload.
//! The codecs translate those shapes into one canonical [`GatewayEvent`] with
//! a fixed contract per provider: extract the gateway's transaction id,
//! extract its settlement reference, coerce the amount/currency, and map the
//! provider status table onto the shared [`GatewayStatus`] enum.
//!
//! All functions here are pure; nothing touches external state.

use serde_json::Value;
use thiserror::Error;

use super::provider::Provider;

/// Currency assumed when a gateway omits the field.
const FALLBACK_CURRENCY: &str = "IRR";

/// Shared field consulted when a provider-specific key is absent.
const SHARED_REFERENCE_KEY: &str = "reference";

/// Canonical status shared across all gateways.
///
/// Unknown provider codes always map to `Failed` - never to `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
}

impl GatewayStatus {
    /// True iff the gateway settled the transaction.
    pub fn is_paid(&self) -> bool {
        matches!(self, GatewayStatus::Paid)
    }
}

/// Canonical event decoded from a provider callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEvent {
    pub provider: Provider,
    /// The gateway's own transaction identifier.
    pub external_id: String,
    /// The gateway's settlement reference; with the provider name this is
    /// the idempotency key for the whole pipeline.
    pub provider_ref: String,
    /// Amount in the currency's smallest unit. Zero when unparsable.
    pub amount: i64,
    pub currency: String,
    pub status: GatewayStatus,
}

/// Errors raised while decoding a callback payload.
///
/// These are caller errors (the payload is unusable), mapped to HTTP 400 by
/// the webhook layer so gateways do not retry them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("no usable transaction id in payload")]
    MissingExternalId,

    #[error("no usable settlement reference in payload")]
    MissingProviderRef,
}

/// Fixed decoding contract implemented once per gateway.
pub trait GatewayCodec: Send + Sync {
    /// The provider this codec decodes for.
    fn provider(&self) -> Provider;

    /// Key holding the gateway's transaction id.
    fn external_id_key(&self) -> &'static str;

    /// Key holding the gateway's settlement reference.
    fn provider_ref_key(&self) -> &'static str;

    /// Maps the provider's status table onto [`GatewayStatus`].
    fn map_status(&self, payload: &Value) -> GatewayStatus;

    /// Extracts the gateway transaction id.
    ///
    /// Falls back to composing `"{sessionId}:{providerRef}"` from shared
    /// fields when the provider-specific key is absent.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingExternalId` if neither the provider key
    /// nor the shared fields yield a usable id.
    fn extract_external_id(&self, payload: &Value) -> Result<String, CodecError> {
        require_object(payload)?;
        if let Some(id) = lookup_text_ci(payload, self.external_id_key()) {
            return Ok(id);
        }
        let session_id = lookup_text_ci(payload, "sessionId");
        let provider_ref = self.extract_provider_ref(payload).ok();
        match (session_id, provider_ref) {
            (Some(sid), Some(pref)) => Ok(format!("{}:{}", sid, pref)),
            _ => Err(CodecError::MissingExternalId),
        }
    }

    /// Extracts the gateway settlement reference.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingProviderRef` if neither the provider key
    /// nor the shared `reference` field is present.
    fn extract_provider_ref(&self, payload: &Value) -> Result<String, CodecError> {
        require_object(payload)?;
        lookup_text_ci(payload, self.provider_ref_key())
            .or_else(|| lookup_text_ci(payload, SHARED_REFERENCE_KEY))
            .ok_or(CodecError::MissingProviderRef)
    }

    /// Extracts amount and currency. Never fails: an unparsable amount
    /// coerces to 0 and a missing currency defaults to IRR. The reconciler
    /// decides whether a zero amount is acceptable.
    fn extract_amount_currency(&self, payload: &Value) -> (i64, String) {
        let amount = lookup_ci(payload, "amount").map(coerce_amount).unwrap_or(0);
        let currency = lookup_text_ci(payload, "currency")
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_string());
        (amount, currency)
    }

    /// Decodes the full canonical event.
    fn decode(&self, payload: &Value) -> Result<GatewayEvent, CodecError> {
        let external_id = self.extract_external_id(payload)?;
        let provider_ref = self.extract_provider_ref(payload)?;
        let (amount, currency) = self.extract_amount_currency(payload);
        Ok(GatewayEvent {
            provider: self.provider(),
            external_id,
            provider_ref,
            amount,
            currency,
            status: self.map_status(payload),
        })
    }
}

/// Returns the codec for a provider.
pub fn codec_for(provider: Provider) -> &'static dyn GatewayCodec {
    match provider {
        Provider::Zarinpal => &ZarinpalCodec,
        Provider::Idpay => &IdpayCodec,
        Provider::Nextpay => &NextpayCodec,
    }
}

// ════════════════════════════════════════════════════════════════════════
// Provider codecs
// ════════════════════════════════════════════════════════════════════════

/// ZarinPal: `authority` / `ref_id`, string status values.
struct ZarinpalCodec;

impl GatewayCodec for ZarinpalCodec {
    fn provider(&self) -> Provider {
        Provider::Zarinpal
    }

    fn external_id_key(&self) -> &'static str {
        "authority"
    }

    fn provider_ref_key(&self) -> &'static str {
        "ref_id"
    }

    fn map_status(&self, payload: &Value) -> GatewayStatus {
        let status = match lookup_text_ci(payload, "status") {
            Some(s) => s.to_ascii_uppercase(),
            None => return GatewayStatus::Failed,
        };
        match status.as_str() {
            "OK" | "PAID" | "VERIFIED" => GatewayStatus::Paid,
            "PENDING" | "IN_BANK" => GatewayStatus::Pending,
            "REFUNDED" => GatewayStatus::Refunded,
            _ => GatewayStatus::Failed,
        }
    }
}

/// IDPay: `id` / `track_id`, numeric status codes.
struct IdpayCodec;

impl GatewayCodec for IdpayCodec {
    fn provider(&self) -> Provider {
        Provider::Idpay
    }

    fn external_id_key(&self) -> &'static str {
        "id"
    }

    fn provider_ref_key(&self) -> &'static str {
        "track_id"
    }

    fn map_status(&self, payload: &Value) -> GatewayStatus {
        let code = match lookup_ci(payload, "status").and_then(coerce_code) {
            Some(c) => c,
            None => return GatewayStatus::Failed,
        };
        match code {
            100 | 101 | 200 => GatewayStatus::Paid,
            1 | 10 => GatewayStatus::Pending,
            6..=8 => GatewayStatus::Refunded,
            _ => GatewayStatus::Failed,
        }
    }
}

/// NextPay: `trans_id` / `shaparak_ref_id`, HTTP-style status codes.
struct NextpayCodec;

impl GatewayCodec for NextpayCodec {
    fn provider(&self) -> Provider {
        Provider::Nextpay
    }

    fn external_id_key(&self) -> &'static str {
        "trans_id"
    }

    fn provider_ref_key(&self) -> &'static str {
        "shaparak_ref_id"
    }

    fn map_status(&self, payload: &Value) -> GatewayStatus {
        let code = match lookup_ci(payload, "status").and_then(coerce_code) {
            Some(c) => c,
            None => return GatewayStatus::Failed,
        };
        match code {
            200 => GatewayStatus::Paid,
            100..=102 => GatewayStatus::Pending,
            303 => GatewayStatus::Refunded,
            _ => GatewayStatus::Failed,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════
// Raw payload helpers
// ════════════════════════════════════════════════════════════════════════

fn require_object(payload: &Value) -> Result<(), CodecError> {
    if payload.is_object() {
        Ok(())
    } else {
        Err(CodecError::NotAnObject)
    }
}

/// Case-insensitive field lookup on the raw JSON object.
///
/// Gateways are inconsistent about key casing across API versions, so the
/// first key matching ignoring ASCII case wins.
fn lookup_ci<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    let object = payload.as_object()?;
    object
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Looks up a field and renders it as non-empty text.
///
/// Accepts strings and numbers; numbers are rendered decimally so numeric
/// transaction ids survive.
fn lookup_text_ci(payload: &Value, key: &str) -> Option<String> {
    match lookup_ci(payload, key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerces a JSON value to a smallest-unit integer amount.
///
/// Strings are parsed as decimal numbers and truncated; anything else
/// coerces to 0.
fn coerce_amount(value: &Value) -> i64 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0)
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.trunc() as i64)
            .unwrap_or(0),
        _ => 0,
    }
}

/// Coerces a JSON value to a status code, accepting numeric strings.
fn coerce_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
