//! Runtime side of depgate: concurrent resolution, source providers and
//! built-in resolvers.
//!
//! [`ResolutionOrchestrator`] runs a set of
//! [`ResolverDescriptor`](depgate_core::ResolverDescriptor)s as independent
//! tokio tasks, each bounded by its own timeout and retry budget, and folds
//! the outcomes into a [`CompatibilityReport`](depgate_core::CompatibilityReport).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use depgate_core::{FailurePolicy, ResolverDescriptor};
//! use depgate_runtime::{OsReleaseResolver, ResolutionOrchestrator};
//!
//! let os = ResolverDescriptor::new("os", Arc::new(OsReleaseResolver::new()), ">=22.04")?;
//! let report = ResolutionOrchestrator::without_sources()
//!     .verify_blocking(&[os], FailurePolicy::Fail)?;
//! println!("{}", report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(unused_crate_dependencies)]

mod attempt;
mod orchestrator;
mod registry;
pub mod resolvers;
pub mod sources;

pub use attempt::resolve_with_retry;
pub use orchestrator::ResolutionOrchestrator;
pub use registry::{ResolverFactory, ResolverRegistry};
pub use resolvers::{CommandResolver, HttpJsonResolver, OsReleaseResolver};
pub use sources::{ChainSourceProvider, EnvSourceProvider, MapSourceProvider};
