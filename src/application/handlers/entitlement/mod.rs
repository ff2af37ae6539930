//! Entitlement handlers - the credit ledger service.

mod credit_ledger;

pub use credit_ledger::CreditLedger;
