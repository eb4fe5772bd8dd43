//! Serializable run configuration.
//!
//! Settings describe a verification run as data (typically loaded from a JSON
//! file). Turning them into [`ResolverDescriptor`](crate::ResolverDescriptor)s
//! needs a resolver registry and happens in the runtime crate;
//! [`validate_settings`] catches everything that can be checked without one.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::VersionConstraint;
use crate::descriptor::{ExecutionOptions, NodePolicy, RetryBackoff};
use crate::error::VersionError;
use crate::policy::FailurePolicy;

/// Longest accepted per-attempt timeout (10 minutes).
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// Highest accepted retry count.
pub const MAX_RETRY_COUNT: u32 = 10;

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Dependency #{0} has an empty name")]
    EmptyName(usize),

    #[error("Dependency '{0}' has an empty resolver kind")]
    EmptyKind(String),

    #[error("Timeout for '{scope}' must be between 1 and 600000 ms, got {value}")]
    InvalidTimeout { scope: String, value: u64 },

    #[error("Retry count for '{scope}' must be at most 10, got {value}")]
    InvalidRetryCount { scope: String, value: u32 },

    #[error("Backoff for '{scope}' is invalid: {reason}")]
    InvalidBackoff { scope: String, reason: String },

    #[error("Constraint for '{name}' is invalid: {source}")]
    Constraint {
        name: String,
        #[source]
        source: VersionError,
    },

    #[error("Dependency '{name}' uses unknown resolver kind '{kind}'")]
    UnknownKind { name: String, kind: String },

    #[error("Options for '{name}' are invalid: {reason}")]
    InvalidOptions { name: String, reason: String },

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Backoff strategy as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffSettings {
    None,
    Fixed { delay_ms: u64 },
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self::Exponential {
            base_ms: 500,
            max_ms: 10_000,
        }
    }
}

impl BackoffSettings {
    pub const fn to_backoff(self) -> RetryBackoff {
        match self {
            Self::None => RetryBackoff::None,
            Self::Fixed { delay_ms } => RetryBackoff::Fixed(Duration::from_millis(delay_ms)),
            Self::Exponential { base_ms, max_ms } => RetryBackoff::Exponential {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
            },
        }
    }
}

/// Timeout and retry defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSettings {
    pub timeout_ms: u64,
    pub retry_count: u32,
    pub backoff: BackoffSettings,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry_count: 2,
            backoff: BackoffSettings::default(),
        }
    }
}

impl ExecutionSettings {
    pub const fn to_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            retry_count: self.retry_count,
            backoff: self.backoff.to_backoff(),
        }
    }
}

const fn default_required() -> bool {
    true
}

/// One dependency to check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySettings {
    pub name: String,
    /// Resolver kind, looked up in the registry (e.g. `"command"`).
    pub kind: String,
    pub constraint: String,
    /// Source provider key; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub node_policy: NodePolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffSettings>,
    /// Resolver-specific options, interpreted by the resolver factory.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl DependencySettings {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            constraint: constraint.into(),
            source_key: None,
            required: true,
            node_policy: NodePolicy::default(),
            timeout_ms: None,
            retry_count: None,
            backoff: None,
            options: serde_json::Map::new(),
        }
    }

    /// Merge per-dependency overrides onto `defaults`.
    pub fn execution_settings(&self, defaults: &ExecutionSettings) -> ExecutionSettings {
        ExecutionSettings {
            timeout_ms: self.timeout_ms.unwrap_or(defaults.timeout_ms),
            retry_count: self.retry_count.unwrap_or(defaults.retry_count),
            backoff: self.backoff.unwrap_or(defaults.backoff),
        }
    }

    pub fn execution_options(&self, defaults: &ExecutionSettings) -> ExecutionOptions {
        self.execution_settings(defaults).to_options()
    }

    pub fn source_key(&self) -> &str {
        self.source_key.as_deref().unwrap_or(&self.name)
    }

    pub fn parse_constraint(&self) -> Result<VersionConstraint, SettingsError> {
        VersionConstraint::parse(&self.constraint).map_err(|source| SettingsError::Constraint {
            name: self.name.clone(),
            source,
        })
    }
}

/// A complete verification run as configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierSettings {
    pub policy: FailurePolicy,
    pub defaults: ExecutionSettings,
    /// Connection strings by source key.
    pub sources: BTreeMap<String, String>,
    pub dependencies: Vec<DependencySettings>,
}

impl VerifierSettings {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(text).map_err(|e| SettingsError::Parse(e.to_string()))?;
        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Check everything that does not need a resolver registry.
pub fn validate_settings(settings: &VerifierSettings) -> Result<(), SettingsError> {
    validate_execution("defaults", &settings.defaults)?;

    for (index, dependency) in settings.dependencies.iter().enumerate() {
        if dependency.name.trim().is_empty() {
            return Err(SettingsError::EmptyName(index));
        }
        if dependency.kind.trim().is_empty() {
            return Err(SettingsError::EmptyKind(dependency.name.clone()));
        }
        validate_execution(
            &dependency.name,
            &dependency.execution_settings(&settings.defaults),
        )?;
        dependency.parse_constraint()?;
    }
    Ok(())
}

fn validate_execution(scope: &str, execution: &ExecutionSettings) -> Result<(), SettingsError> {
    if execution.timeout_ms == 0 || execution.timeout_ms > MAX_TIMEOUT_MS {
        return Err(SettingsError::InvalidTimeout {
            scope: scope.to_string(),
            value: execution.timeout_ms,
        });
    }
    if execution.retry_count > MAX_RETRY_COUNT {
        return Err(SettingsError::InvalidRetryCount {
            scope: scope.to_string(),
            value: execution.retry_count,
        });
    }
    if let BackoffSettings::Exponential { base_ms, max_ms } = execution.backoff {
        if base_ms == 0 {
            return Err(SettingsError::InvalidBackoff {
                scope: scope.to_string(),
                reason: "base_ms must be positive".to_string(),
            });
        }
        if max_ms < base_ms {
            return Err(SettingsError::InvalidBackoff {
                scope: scope.to_string(),
                reason: format!("max_ms ({max_ms}) is below base_ms ({base_ms})"),
            });
        }
    }
    Ok(())
}
