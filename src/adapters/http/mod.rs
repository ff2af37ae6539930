//! HTTP adapters.

pub mod webhooks;
