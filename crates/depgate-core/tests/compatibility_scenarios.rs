//! End-to-end checks of the pure pipeline: descriptors, outcomes, report,
//! policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use depgate_core::{
    CompatibilityReport, DependencyResolver, DependencyStatus, DependencyVersion, ErrorKind,
    FailurePolicy, OverallStatus, ResolutionOutcome, ResolveError, ResolveRequest,
    ResolverDescriptor, SourceProvider, VerifyError, VersionConstraint, VersionError,
    build_report,
};

struct Placeholder;

#[async_trait]
impl DependencyResolver for Placeholder {
    fn kind(&self) -> &str {
        "placeholder"
    }

    async fn resolve(
        &self,
        _sources: &dyn SourceProvider,
        _request: &ResolveRequest,
    ) -> Result<Vec<DependencyVersion>, ResolveError> {
        Err(ResolveError::Internal("placeholder".to_string()))
    }
}

fn descriptor(name: &str, constraint: &str) -> ResolverDescriptor {
    ResolverDescriptor::new(name, Arc::new(Placeholder), constraint).unwrap()
}

fn ok(version: &str) -> ResolutionOutcome {
    ResolutionOutcome {
        result: Ok(vec![version.parse().unwrap()]),
        attempts: 1,
        elapsed: Duration::from_millis(3),
    }
}

fn err(error: ResolveError, attempts: u32) -> ResolutionOutcome {
    ResolutionOutcome::failed(error, attempts, Duration::from_millis(30))
}

fn statuses(report: &CompatibilityReport) -> Vec<DependencyStatus> {
    report.dependencies().iter().map(|e| e.status).collect()
}

#[test]
fn test_major_range_accepts_minor_and_rejects_next_major() {
    let constraint = VersionConstraint::parse(">=4.0.0,<5.0.0").unwrap();
    assert!(constraint.is_satisfied_by(&"4.2.1".parse().unwrap()));
    assert!(constraint.is_satisfied_by(&"4.0.0".parse().unwrap()));
    assert!(!constraint.is_satisfied_by(&"5.0.0".parse().unwrap()));
    assert!(!constraint.is_satisfied_by(&"3.9.9".parse().unwrap()));
}

#[test]
fn test_isolated_failure_among_many() {
    let descriptors: Vec<ResolverDescriptor> = (0..5)
        .map(|i| descriptor(&format!("dep-{i}"), ">=1.0.0"))
        .collect();
    let outcomes = descriptors.iter().enumerate().map(|(i, d)| {
        let outcome = if i == 3 {
            err(ResolveError::TransientConnectivity("refused".to_string()), 3)
        } else {
            ok("1.5.0")
        };
        (d, outcome)
    });

    let report = build_report(outcomes);

    assert_eq!(report.dependencies().len(), 5);
    let failed: Vec<&str> = report.failures().map(|e| e.name.as_str()).collect();
    assert_eq!(failed, vec!["dep-3"]);
    assert_eq!(report.overall(), OverallStatus::Fail);
}

#[test]
fn test_missing_source_entry_and_remaining_entries() {
    let db = descriptor("db", ">=4.0.0,<5.0.0");
    let cache = descriptor("cache", ">=7.0");
    let report = build_report(vec![
        (&db, ok("4.2.1")),
        (
            &cache,
            err(
                ResolveError::ConnectionStringNotFound {
                    key: "cache".to_string(),
                },
                1,
            ),
        ),
    ]);

    assert_eq!(
        statuses(&report),
        vec![DependencyStatus::Pass, DependencyStatus::Error]
    );
    let detail = report.entry("cache").unwrap().error.as_ref().unwrap();
    assert_eq!(detail.kind, ErrorKind::ConnectionStringNotFound);
}

#[test]
fn test_duplicate_names_stay_separate() {
    let first = descriptor("broker", ">=3.0");
    let second = descriptor("broker", ">=3.0");
    let report = build_report(vec![(&first, ok("3.1")), (&second, ok("2.8"))]);

    assert_eq!(
        statuses(&report),
        vec![DependencyStatus::Pass, DependencyStatus::Fail]
    );
}

#[test]
fn test_policy_switch_on_same_report() {
    let db = descriptor("db", ">=4.0.0,<5.0.0");
    let build = || build_report(vec![(&db, ok("5.0.0"))]);

    let raised = FailurePolicy::from_throw_on_failure(true).apply(build());
    assert!(matches!(raised, Err(VerifyError::Incompatible(_))));

    let logged = FailurePolicy::from_throw_on_failure(false)
        .apply(build())
        .unwrap();
    assert_eq!(logged.overall(), OverallStatus::Fail);
}

#[test]
fn test_timeout_entry_is_transient_error() {
    let slow = descriptor("slow", "*");
    let report = build_report(vec![(
        &slow,
        err(
            ResolveError::Timeout {
                after: Duration::from_millis(100),
            },
            3,
        ),
    )]);

    let entry = &report.dependencies()[0];
    assert_eq!(entry.attempts, 3);
    let detail = entry.error.as_ref().unwrap();
    assert_eq!(detail.kind, ErrorKind::Timeout);
    assert!(detail.transient);
}

#[test]
fn test_malformed_constraint_fails_before_any_work() {
    let err = ResolverDescriptor::new("db", Arc::new(Placeholder), ">=4.0.0,,<").unwrap_err();
    assert!(matches!(err, VersionError::MalformedConstraint { .. }));
}

#[test]
fn test_report_round_trips_through_json() {
    let db = descriptor("db", "^4.2");
    let report = build_report(vec![(&db, ok("4.9.0-rc.1"))]);

    let json = serde_json::to_string(&report).unwrap();
    let decoded: CompatibilityReport = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, report);
}
