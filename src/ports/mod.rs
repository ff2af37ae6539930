//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Reconciliation Ports
//!
//! - `CheckoutSessionStore` - session lookup and status transition
//! - `PriceStore` - catalog price lookup
//! - `PaymentLedger` - single-transaction payment/invoice/session settlement
//! - `EntitlementGranter` - the external apply-entitlements collaborator
//!
//! ## Ledger Ports
//!
//! - `EntitlementReader` - point-in-time bundle reads
//! - `LedgerTx` - ambient-transaction handle for consume/grant writes

mod checkout_session_store;
mod entitlement_granter;
mod entitlement_store;
mod payment_ledger;
mod price_store;

pub use checkout_session_store::CheckoutSessionStore;
pub use entitlement_granter::{EntitlementGranter, GrantError, GrantRequest};
pub use entitlement_store::{EntitlementReader, LedgerTx};
pub use payment_ledger::{PaymentLedger, SettlementCommand, SettlementOutcome};
pub use price_store::{Price, PriceStore};
