//! Source provider adapters.

use std::collections::HashMap;
use std::sync::Arc;

use depgate_core::{ConnectionInfo, SourceError, SourceProvider};

/// Default prefix for [`EnvSourceProvider`].
pub const DEFAULT_ENV_PREFIX: &str = "DEPGATE_SOURCE_";

/// In-memory key/value provider, typically filled from the config file.
#[derive(Debug, Clone, Default)]
pub struct MapSourceProvider {
    entries: HashMap<String, String>,
}

impl MapSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSourceProvider {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SourceProvider for MapSourceProvider {
    fn connection_info(&self, key: &str) -> Result<ConnectionInfo, SourceError> {
        self.entries
            .get(key)
            .map(|value| ConnectionInfo::new(key, value.as_str()))
            .ok_or_else(|| SourceError::NotFound {
                key: key.to_string(),
            })
    }
}

/// Reads `<PREFIX><KEY>` from the process environment.
///
/// Keys are upper-cased and every non-alphanumeric character becomes `_`,
/// so `"redis-main"` is looked up as `DEPGATE_SOURCE_REDIS_MAIN`.
#[derive(Debug, Clone)]
pub struct EnvSourceProvider {
    prefix: String,
}

impl Default for EnvSourceProvider {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }
}

impl EnvSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name consulted for `key`.
    pub fn variable_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

impl SourceProvider for EnvSourceProvider {
    fn connection_info(&self, key: &str) -> Result<ConnectionInfo, SourceError> {
        let variable = self.variable_name(key);
        match std::env::var(&variable) {
            Ok(value) if !value.trim().is_empty() => Ok(ConnectionInfo::new(key, value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(SourceError::NotFound {
                key: key.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SourceError::Invalid {
                key: key.to_string(),
                reason: format!("{variable} is not valid unicode"),
            }),
        }
    }
}

/// Tries each provider in order; the first hit wins.
///
/// Only [`SourceError::NotFound`] falls through. An invalid entry stops the
/// lookup so a broken override is never silently skipped.
#[derive(Clone, Default)]
pub struct ChainSourceProvider {
    providers: Vec<Arc<dyn SourceProvider>>,
}

impl std::fmt::Debug for ChainSourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSourceProvider")
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl ChainSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn with_shared(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

impl SourceProvider for ChainSourceProvider {
    fn connection_info(&self, key: &str) -> Result<ConnectionInfo, SourceError> {
        for provider in &self.providers {
            match provider.connection_info(key) {
                Err(SourceError::NotFound { .. }) => {}
                other => return other,
            }
        }
        Err(SourceError::NotFound {
            key: key.to_string(),
        })
    }
}
