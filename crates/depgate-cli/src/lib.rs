//! Command-line front end for depgate.
//!
//! `depgate verify` runs a configured verification once and exits with a
//! status that reflects the report, `depgate check` evaluates literal
//! versions against a constraint, and `depgate serve` exposes the health
//! endpoints.
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use anyhow as _;
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
