//! What to do with a report once it is built.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::VerifyError;
use crate::report::{CompatibilityReport, OverallStatus};

/// Caller-selected reaction to an incompatible report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Startup gate: an overall `fail` becomes [`VerifyError::Incompatible`].
    #[default]
    Fail,
    /// Health endpoint: never errors, failing entries are logged.
    Log,
}

impl FailurePolicy {
    /// Map the `throw_on_failure` switch onto a policy.
    pub const fn from_throw_on_failure(throw_on_failure: bool) -> Self {
        if throw_on_failure { Self::Fail } else { Self::Log }
    }

    pub const fn throws_on_failure(self) -> bool {
        matches!(self, Self::Fail)
    }

    /// Apply the policy. At most one error is produced per report.
    pub fn apply(self, report: CompatibilityReport) -> Result<CompatibilityReport, VerifyError> {
        match (self, report.overall()) {
            (_, OverallStatus::Pass) => Ok(report),
            (Self::Fail, OverallStatus::Fail) => Err(VerifyError::Incompatible(Box::new(report))),
            (_, OverallStatus::Degraded) | (Self::Log, OverallStatus::Fail) => {
                log_failures(&report);
                Ok(report)
            }
        }
    }
}

fn log_failures(report: &CompatibilityReport) {
    for entry in report.failures() {
        let reason = entry.error.as_ref().map_or_else(
            || "version outside constraint".to_string(),
            |detail| detail.message.clone(),
        );
        let versions: Vec<String> = entry
            .resolved_versions
            .iter()
            .map(|node| node.version.to_string())
            .collect();
        warn!(
            target: "depgate.verify",
            dependency = %entry.name,
            constraint = %entry.constraint,
            resolved = ?versions,
            required = entry.required,
            status = ?entry.status,
            "Dependency check failed: {reason}"
        );
    }
    warn!(
        target: "depgate.verify",
        overall = report.overall().as_str(),
        "{}",
        report.summary()
    );
}
