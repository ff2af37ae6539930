//! Billing handlers - webhook reconciliation.

mod process_gateway_callback;

pub use process_gateway_callback::{
    CallbackOutcome, ProcessGatewayCallbackCommand, ProcessGatewayCallbackHandler,
};
