//! Error taxonomy shared by every resolver and the verification entry point.
//!
//! Resolver failures are values: they are classified as transient or
//! permanent and embedded in the report. Only [`VerifyError`] ever reaches
//! the caller of a verification run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::SourceError;
use crate::report::CompatibilityReport;

/// Parse-time errors for versions and constraints.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    /// Text does not match `[v]N(.N)*[-pre][+build]`.
    #[error("Malformed version '{input}': {reason}")]
    MalformedVersion { input: String, reason: String },

    /// Constraint is syntactically invalid or can never be satisfied.
    #[error("Malformed constraint '{input}': {reason}")]
    MalformedConstraint { input: String, reason: String },
}

/// Whether a failed attempt is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Timeouts and connectivity problems.
    Transient,
    /// Misconfiguration, authentication, missing sources.
    Permanent,
}

/// Stable error discriminant exposed in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectionStringNotFound,
    NoVersionFound,
    Timeout,
    TransientConnectivity,
    Authentication,
    Configuration,
    MalformedVersion,
    Internal,
}

/// Failure of a single resolver attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The source provider has no connection info for this key.
    #[error("No connection string found for '{key}'")]
    ConnectionStringNotFound { key: String },

    /// The resolver ran but discovered no version.
    #[error("No version found for '{dependency}'")]
    NoVersionFound { dependency: String },

    /// The attempt exceeded its deadline.
    #[error("Timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// Retryable I/O failure (connection refused, temporary network error).
    #[error("Connectivity failure: {0}")]
    TransientConnectivity(String),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The resolver or its source is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The dependency reported something that is not a version.
    #[error(transparent)]
    MalformedVersion(#[from] VersionError),

    /// Unexpected condition inside a resolver (including panics).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolveError {
    /// Retry classification; the orchestrator retries only transient failures.
    pub const fn classification(&self) -> FailureClass {
        match self {
            Self::Timeout { .. } | Self::TransientConnectivity(_) => FailureClass::Transient,
            Self::ConnectionStringNotFound { .. }
            | Self::NoVersionFound { .. }
            | Self::Authentication(_)
            | Self::Configuration(_)
            | Self::MalformedVersion(_)
            | Self::Internal(_) => FailureClass::Permanent,
        }
    }

    pub const fn is_transient(&self) -> bool {
        matches!(self.classification(), FailureClass::Transient)
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionStringNotFound { .. } => ErrorKind::ConnectionStringNotFound,
            Self::NoVersionFound { .. } => ErrorKind::NoVersionFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TransientConnectivity(_) => ErrorKind::TransientConnectivity,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::MalformedVersion(_) => ErrorKind::MalformedVersion,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<SourceError> for ResolveError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound { key } => Self::ConnectionStringNotFound { key },
            invalid @ SourceError::Invalid { .. } => Self::Configuration(invalid.to_string()),
        }
    }
}

/// Caller-visible outcome of a verification run that did not produce a
/// passing report.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Overall status is `fail` under the fail policy. Carries the full report
    /// so every failing dependency can be presented, not just the first.
    #[error("Dependency compatibility check failed: {}", .0.summary())]
    Incompatible(Box<CompatibilityReport>),

    /// The run was cancelled before every resolver settled.
    #[error("Verification run was cancelled")]
    Cancelled,

    /// The async runtime could not be started or a task failed unexpectedly.
    #[error("Verification runtime error: {0}")]
    Runtime(String),
}

impl VerifyError {
    /// The report attached to an incompatibility failure.
    pub fn report(&self) -> Option<&CompatibilityReport> {
        match self {
            Self::Incompatible(report) => Some(report),
            Self::Cancelled | Self::Runtime(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification_table() {
        let transient = [
            ResolveError::Timeout {
                after: Duration::from_secs(1),
            },
            ResolveError::TransientConnectivity("connection refused".to_string()),
        ];
        for err in &transient {
            assert_eq!(err.classification(), FailureClass::Transient, "{err}");
            assert!(err.is_transient());
        }

        let permanent = [
            ResolveError::ConnectionStringNotFound {
                key: "cache".to_string(),
            },
            ResolveError::NoVersionFound {
                dependency: "db".to_string(),
            },
            ResolveError::Authentication("bad password".to_string()),
            ResolveError::Configuration("bad url".to_string()),
            ResolveError::Internal("boom".to_string()),
        ];
        for err in &permanent {
            assert_eq!(err.classification(), FailureClass::Permanent, "{err}");
        }
    }

    #[test]
    fn test_source_error_mapping() {
        let err: ResolveError = SourceError::NotFound {
            key: "cache".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ConnectionStringNotFound);
        assert_eq!(err.to_string(), "No connection string found for 'cache'");

        let err: ResolveError = SourceError::Invalid {
            key: "db".to_string(),
            reason: "not unicode".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_timeout_message() {
        let err = ResolveError::Timeout {
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Timed out after 250ms");
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ConnectionStringNotFound).unwrap();
        assert_eq!(json, "\"connection_string_not_found\"");
    }
}
