//! Outbound HTTP clients.
//!
//! - [`AdminClient`]: product count and sample product creation against the
//!   Admin API, exposed to the router through [`ProductService`]
//! - [`PassthroughClient`]: video search and newsletter subscription calls
//!   whose responses are relayed untouched
//! - [`ClientError`]: the shared error type
//!
//! Both clients take a `reqwest::Client` so the whole process shares one
//! connection pool.

mod admin;
mod errors;
mod passthrough;

pub use admin::{AdminClient, ProductService, DEFAULT_PRODUCTS_COUNT, GATEWAY_VERSION};
pub use errors::ClientError;
pub use passthrough::PassthroughClient;
