//! Axum adapter exposing depgate verification as a health endpoint.
//!
//! Every request to `/health/dependencies` runs a fresh verification under
//! the log policy; nothing is cached between requests. A process that wants
//! a "last known" report keeps it itself.
#![deny(unused_crate_dependencies)]

pub mod error;
pub mod routes;
pub mod state;

pub use error::HttpError;
pub use routes::{health_routes, serve};
pub use state::HealthState;

// Used by the integration tests only
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tower as _;
