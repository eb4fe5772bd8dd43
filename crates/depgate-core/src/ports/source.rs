//! Connection-info lookup port.

use std::fmt;

use thiserror::Error;

/// Connection details for one named source (a URL, a DSN, a socket path).
///
/// The value often embeds credentials, so `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    key: String,
    value: String,
}

impl ConnectionInfo {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("key", &self.key)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Lookup failures from a [`SourceProvider`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// No entry is registered under this key.
    #[error("Source '{key}' not found")]
    NotFound { key: String },

    /// An entry exists but cannot be used.
    #[error("Source '{key}' is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// Supplies connection info to resolvers by key.
///
/// Implementations must be cheap and non-blocking; they are called once per
/// resolver attempt.
#[cfg_attr(test, mockall::automock)]
pub trait SourceProvider: Send + Sync {
    fn connection_info(&self, key: &str) -> Result<ConnectionInfo, SourceError>;
}

/// Provider with no entries. Useful when every resolver is self-contained.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSourceProvider;

impl SourceProvider for NoopSourceProvider {
    fn connection_info(&self, key: &str) -> Result<ConnectionInfo, SourceError> {
        Err(SourceError::NotFound {
            key: key.to_string(),
        })
    }
}
