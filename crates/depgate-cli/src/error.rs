//! CLI-specific error types and mappings.
//!
//! This module maps library errors to exit codes and user-facing messages.

use depgate_core::{SettingsError, VerifyError, VersionError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required dependency is outside its declared range.
    #[error("{0}")]
    Incompatible(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was interrupted (Ctrl-C).
    #[error("Interrupted")]
    Interrupted,

    /// Runtime failure outside any single dependency.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: Incompatible dependency
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    /// - 130: Terminated by Ctrl-C
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Incompatible(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Runtime(_) => 70,  // EX_SOFTWARE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Interrupted => 130,
        }
    }
}

impl From<VerifyError> for CliError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Incompatible(report) => Self::Incompatible(format!(
                "Dependency compatibility check failed: {}",
                report.summary()
            )),
            VerifyError::Cancelled => Self::Interrupted,
            VerifyError::Runtime(msg) => Self::Runtime(msg),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<VersionError> for CliError {
    fn from(err: VersionError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
