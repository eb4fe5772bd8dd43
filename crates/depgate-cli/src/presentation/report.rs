//! Report rendering for `depgate verify` and `depgate check`.

use depgate_core::{
    CompatibilityReport, DependencyReport, DependencyStatus, DependencyVersion, OverallStatus,
    VersionConstraint,
};

use super::{BOLD, GREEN, RED, RESET, YELLOW};
use crate::error::CliError;

const RULE_WIDTH: usize = 85;

/// Render a report as a fixed-width table.
pub fn render_table(report: &CompatibilityReport) -> String {
    let mut lines = Vec::with_capacity(report.dependencies().len() * 2 + 6);

    lines.push(format!("{BOLD}Dependency Compatibility{RESET}"));
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "{:<20} {:<22} {:<22} {:<8} {:>8}",
        "Dependency", "Constraint", "Resolved", "Status", "Time"
    ));
    lines.push("-".repeat(RULE_WIDTH));

    for entry in report.dependencies() {
        lines.push(render_entry(entry));
        if let Some(error) = &entry.error {
            lines.push(format!("  {RED}↳ {}{RESET}", error.message));
        }
    }

    lines.push("=".repeat(RULE_WIDTH));
    let (color, symbol) = match report.overall() {
        OverallStatus::Pass => (GREEN, "✓"),
        OverallStatus::Degraded => (YELLOW, "!"),
        OverallStatus::Fail => (RED, "✗"),
    };
    lines.push(format!(
        "{color}{symbol} {}{RESET} in {}ms",
        report.summary(),
        report.elapsed_ms()
    ));

    lines.join("\n")
}

fn render_entry(entry: &DependencyReport) -> String {
    let resolved = if entry.resolved_versions.is_empty() {
        "-".to_string()
    } else {
        entry
            .resolved_versions
            .iter()
            .map(|resolved| match &resolved.label {
                Some(label) => format!("{} ({label})", resolved.version),
                None => resolved.version.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let (color, status) = match (entry.status, entry.required) {
        (DependencyStatus::Pass, _) => (GREEN, "pass"),
        (DependencyStatus::Fail, true) => (RED, "fail"),
        (DependencyStatus::Error, true) => (RED, "error"),
        (DependencyStatus::Fail, false) => (YELLOW, "fail"),
        (DependencyStatus::Error, false) => (YELLOW, "error"),
    };

    let name = if entry.required {
        entry.name.clone()
    } else {
        format!("{} (opt)", entry.name)
    };

    format!(
        "{:<20} {:<22} {:<22} {color}{:<8}{RESET} {:>6}ms",
        truncate(&name, 20),
        truncate(&entry.constraint, 22),
        truncate(&resolved, 22),
        status,
        entry.elapsed_ms
    )
}

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &CompatibilityReport) -> Result<String, CliError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| CliError::Runtime(format!("failed to encode report: {e}")))
}

/// Render the verdicts of `depgate check`.
pub fn render_check(
    constraint: &VersionConstraint,
    verdicts: &[(DependencyVersion, bool)],
) -> String {
    let mut lines = vec![format!("{BOLD}Constraint:{RESET} {}", constraint.as_str())];
    for (version, satisfied) in verdicts {
        if *satisfied {
            lines.push(format!("  {GREEN}✓{RESET} {version}"));
        } else {
            lines.push(format!("  {RED}✗{RESET} {version}"));
        }
    }
    lines.join("\n")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
