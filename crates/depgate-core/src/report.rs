//! Compatibility report: per-dependency entries plus a derived overall status.
//!
//! A report is a snapshot. It is built once by [`build_report`] and never
//! mutated afterwards, so it can be shared freely between readers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::{NodePolicy, ResolverDescriptor};
use crate::error::{ErrorKind, ResolveError};
use crate::version::DependencyVersion;

/// Status of a single dependency entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// Resolved and satisfies the constraint.
    Pass,
    /// Resolved but violates the constraint.
    Fail,
    /// Could not be resolved.
    Error,
}

/// Derived status of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pass,
    /// Only non-required entries failed.
    Degraded,
    Fail,
}

impl OverallStatus {
    pub const fn is_passing(self) -> bool {
        matches!(self, Self::Pass | Self::Degraded)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Degraded => "degraded",
            Self::Fail => "fail",
        }
    }
}

/// One version reported by a resolver, with its constraint verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    pub version: DependencyVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub satisfied: bool,
}

/// Serializable view of a [`ResolveError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    pub transient: bool,
}

impl From<&ResolveError> for ErrorDetail {
    fn from(err: &ResolveError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            transient: err.is_transient(),
        }
    }
}

/// Result for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub name: String,
    /// Constraint text as declared.
    pub constraint: String,
    pub resolved_versions: Vec<ResolvedVersion>,
    pub status: DependencyStatus,
    pub required: bool,
    pub node_policy: NodePolicy,
    pub attempts: u32,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl DependencyReport {
    /// A failing entry that makes the whole run fail.
    pub fn is_fatal(&self) -> bool {
        self.required && self.status != DependencyStatus::Pass
    }
}

/// Aggregated outcome of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    overall: OverallStatus,
    checked_at: DateTime<Utc>,
    elapsed_ms: u64,
    dependencies: Vec<DependencyReport>,
}

impl CompatibilityReport {
    pub const fn overall(&self) -> OverallStatus {
        self.overall
    }

    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Entries in descriptor order.
    pub fn dependencies(&self) -> &[DependencyReport] {
        &self.dependencies
    }

    /// Entries that did not pass, required or not.
    pub fn failures(&self) -> impl Iterator<Item = &DependencyReport> {
        self.dependencies
            .iter()
            .filter(|entry| entry.status != DependencyStatus::Pass)
    }

    /// First entry with this name.
    pub fn entry(&self, name: &str) -> Option<&DependencyReport> {
        self.dependencies.iter().find(|entry| entry.name == name)
    }

    /// One-line description, e.g. `fail (2 of 3 dependencies failed: db, cache)`.
    pub fn summary(&self) -> String {
        let failed: Vec<&str> = self.failures().map(|entry| entry.name.as_str()).collect();
        if failed.is_empty() {
            return format!(
                "{} ({} dependencies checked)",
                self.overall.as_str(),
                self.dependencies.len()
            );
        }
        format!(
            "{} ({} of {} dependencies failed: {})",
            self.overall.as_str(),
            failed.len(),
            self.dependencies.len(),
            failed.join(", ")
        )
    }

    /// Stamp the wall time of the run that produced this report.
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = duration_ms(elapsed);
        self
    }
}

/// Result of running one descriptor to completion (retries included).
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub result: Result<Vec<DependencyVersion>, ResolveError>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ResolutionOutcome {
    pub fn failed(error: ResolveError, attempts: u32, elapsed: Duration) -> Self {
        Self {
            result: Err(error),
            attempts,
            elapsed,
        }
    }
}

/// Pair each outcome with its descriptor and derive the overall status.
///
/// Pure: no I/O, no clock other than the `checked_at` stamp. Entry order
/// follows the iterator order.
pub fn build_report<'a, I>(outcomes: I) -> CompatibilityReport
where
    I: IntoIterator<Item = (&'a ResolverDescriptor, ResolutionOutcome)>,
{
    let dependencies: Vec<DependencyReport> = outcomes
        .into_iter()
        .map(|(descriptor, outcome)| evaluate(descriptor, outcome))
        .collect();

    let overall = if dependencies.iter().any(DependencyReport::is_fatal) {
        OverallStatus::Fail
    } else if dependencies
        .iter()
        .any(|entry| entry.status != DependencyStatus::Pass)
    {
        OverallStatus::Degraded
    } else {
        OverallStatus::Pass
    };

    CompatibilityReport {
        overall,
        checked_at: Utc::now(),
        elapsed_ms: 0,
        dependencies,
    }
}

fn evaluate(descriptor: &ResolverDescriptor, outcome: ResolutionOutcome) -> DependencyReport {
    let constraint = descriptor.constraint();
    let mut entry = DependencyReport {
        name: descriptor.name().to_string(),
        constraint: constraint.as_str().to_string(),
        resolved_versions: Vec::new(),
        status: DependencyStatus::Error,
        required: descriptor.is_required(),
        node_policy: descriptor.node_policy(),
        attempts: outcome.attempts,
        elapsed_ms: duration_ms(outcome.elapsed),
        error: None,
    };

    let versions = match outcome.result {
        Ok(versions) if versions.is_empty() => {
            let err = ResolveError::NoVersionFound {
                dependency: entry.name.clone(),
            };
            entry.error = Some(ErrorDetail::from(&err));
            return entry;
        }
        Ok(versions) => versions,
        Err(err) => {
            entry.error = Some(ErrorDetail::from(&err));
            return entry;
        }
    };

    entry.resolved_versions = versions
        .into_iter()
        .map(|version| ResolvedVersion {
            satisfied: constraint.is_satisfied_by(&version),
            label: version.label().map(str::to_string),
            version,
        })
        .collect();

    let mut verdicts = entry.resolved_versions.iter().map(|node| node.satisfied);
    let satisfied = match descriptor.node_policy() {
        NodePolicy::All => verdicts.all(|ok| ok),
        NodePolicy::Any => verdicts.any(|ok| ok),
    };
    entry.status = if satisfied {
        DependencyStatus::Pass
    } else {
        DependencyStatus::Fail
    };
    entry
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
