//! Route handlers.

pub mod api;
pub mod oauth;
pub mod webhooks;
