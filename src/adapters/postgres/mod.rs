//! PostgreSQL implementations of the store ports.
//!
//! All adapters use sqlx with connection pooling. The settlement adapter
//! owns the paid-path transaction; `PgLedgerTx` wraps a caller-supplied
//! connection so credit consumption composes with the caller's own
//! transaction.

mod checkout_session_store;
mod entitlement_store;
mod payment_ledger;
mod price_store;

pub use checkout_session_store::PostgresCheckoutSessionStore;
pub use entitlement_store::{PgLedgerTx, PostgresEntitlementStore};
pub use payment_ledger::PostgresPaymentLedger;
pub use price_store::PostgresPriceStore;
