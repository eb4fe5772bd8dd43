//! Core domain for dependency version compatibility checks.
//!
//! This crate owns the pure parts of depgate: the version and constraint
//! model, the resolver and source-provider ports, descriptors, the
//! compatibility report and the failure policy. Orchestration (tasks,
//! timeouts, retries) and concrete resolvers live in `depgate-runtime`.
//!
//! # Architecture Note
//!
//! Core defines types + traits only. Adapters implement
//! [`ports::DependencyResolver`] and [`ports::SourceProvider`] and are wired
//! together at the composition root (CLI or health endpoint).
#![deny(unused_crate_dependencies)]

pub mod constraint;
pub mod descriptor;
pub mod error;
pub mod policy;
pub mod ports;
pub mod report;
pub mod settings;
pub mod version;

// Re-export commonly used types for convenience
pub use constraint::{Bound, VersionConstraint};
pub use descriptor::{ExecutionOptions, NodePolicy, ResolverDescriptor, RetryBackoff};
pub use error::{ErrorKind, FailureClass, ResolveError, VerifyError, VersionError};
pub use policy::FailurePolicy;
pub use ports::{
    ConnectionInfo, DependencyResolver, NoopSourceProvider, ResolveRequest, SourceError,
    SourceProvider, ensure_found,
};
pub use report::{
    CompatibilityReport, DependencyReport, DependencyStatus, ErrorDetail, OverallStatus,
    ResolutionOutcome, ResolvedVersion, build_report,
};
pub use settings::{
    BackoffSettings, DependencySettings, ExecutionSettings, SettingsError, VerifierSettings,
    validate_settings,
};
pub use version::DependencyVersion;

// Async tests only need the runtime macros
#[cfg(test)]
use tokio as _;
