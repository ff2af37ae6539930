//! Adapters for the entitlement-application collaborator.

mod http_granter;

pub use http_granter::HttpEntitlementGranter;
