//! Resolver descriptors: what to check, against which constraint, and how.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constraint::VersionConstraint;
use crate::error::VersionError;
use crate::ports::{DependencyResolver, ResolveRequest};

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// How a multi-node dependency is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePolicy {
    /// Every reported node must satisfy the constraint.
    #[default]
    All,
    /// At least one node must satisfy the constraint.
    Any,
}

/// Delay between a failed transient attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBackoff {
    /// Retry immediately.
    None,
    /// Same delay before every retry.
    Fixed(Duration),
    /// `base * 2^(retry - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl RetryBackoff {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => {
                let shift = retry.saturating_sub(1).min(31);
                base.saturating_mul(1u32 << shift).min(max)
            }
        }
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(10),
        }
    }
}

/// Timeout and retry settings for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub timeout: Duration,
    /// Retries after the first attempt. `0` means a single attempt.
    pub retry_count: u32,
    pub backoff: RetryBackoff,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            backoff: RetryBackoff::default(),
        }
    }
}

impl ExecutionOptions {
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    #[must_use]
    pub const fn with_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts, first try included.
    pub const fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

/// Binds a named dependency to a resolver and a constraint.
///
/// Descriptors are cheap to clone; the resolver is shared.
#[derive(Clone)]
pub struct ResolverDescriptor {
    name: String,
    source_key: String,
    resolver: Arc<dyn DependencyResolver>,
    constraint: VersionConstraint,
    options: ExecutionOptions,
    required: bool,
    node_policy: NodePolicy,
}

impl ResolverDescriptor {
    /// Create a required descriptor, parsing `constraint`.
    ///
    /// The source key defaults to the dependency name.
    pub fn new(
        name: impl Into<String>,
        resolver: Arc<dyn DependencyResolver>,
        constraint: &str,
    ) -> Result<Self, VersionError> {
        Ok(Self::with_constraint(
            name,
            resolver,
            VersionConstraint::parse(constraint)?,
        ))
    }

    pub fn with_constraint(
        name: impl Into<String>,
        resolver: Arc<dyn DependencyResolver>,
        constraint: VersionConstraint,
    ) -> Self {
        let name = name.into();
        Self {
            source_key: name.clone(),
            name,
            resolver,
            constraint,
            options: ExecutionOptions::default(),
            required: true,
            node_policy: NodePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.options.retry_count = retry_count;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.options.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = key.into();
        self
    }

    /// Failures of this dependency degrade the overall status instead of
    /// failing it.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn with_node_policy(mut self, policy: NodePolicy) -> Self {
        self.node_policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn resolver(&self) -> &Arc<dyn DependencyResolver> {
        &self.resolver
    }

    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn node_policy(&self) -> NodePolicy {
        self.node_policy
    }

    /// Build the request handed to the resolver for attempt `attempt`.
    pub fn request(&self, attempt: u32) -> ResolveRequest {
        ResolveRequest {
            dependency: self.name.clone(),
            source_key: self.source_key.clone(),
            attempt,
            timeout: self.options.timeout,
        }
    }
}

impl fmt::Debug for ResolverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverDescriptor")
            .field("name", &self.name)
            .field("source_key", &self.source_key)
            .field("resolver", &self.resolver.kind())
            .field("constraint", &self.constraint.as_str())
            .field("options", &self.options)
            .field("required", &self.required)
            .field("node_policy", &self.node_policy)
            .finish()
    }
}
