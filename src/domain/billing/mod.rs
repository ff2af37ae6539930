//! Billing module - gateway normalization and payment state.
//!
//! Contains the provider codec layer (payload normalization + signature
//! verification), the checkout session state machine, and the payment and
//! invoice models keyed by the `(provider, provider_ref)` idempotency pair.

mod codec;
mod payment;
mod provider;
mod session;
mod signature;
mod webhook_errors;

pub use codec::{codec_for, CodecError, GatewayCodec, GatewayEvent, GatewayStatus};
pub use payment::{Invoice, InvoiceStatus, Payment, PaymentStatus};
pub use provider::Provider;
pub use session::{CheckoutSession, CheckoutSessionStatus};
pub use signature::{ProviderSecrets, SignatureCheck, SignatureError, SignatureVerifier};
pub use webhook_errors::WebhookError;
