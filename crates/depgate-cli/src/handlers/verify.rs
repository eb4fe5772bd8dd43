use depgate_core::{CompatibilityReport, FailurePolicy, VerifyError};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{render_json, render_table};

/// Flags for `depgate verify`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyArgs {
    pub log_only: bool,
    pub json: bool,
}

impl VerifyArgs {
    /// `--log-only` overrides the configured policy.
    pub const fn policy(self, configured: FailurePolicy) -> FailurePolicy {
        if self.log_only {
            FailurePolicy::Log
        } else {
            configured
        }
    }
}

/// Execute `depgate verify`.
///
/// The report is printed in both outcomes; an incompatible run under the
/// fail policy then returns [`CliError::Incompatible`].
pub async fn execute(
    ctx: &CliContext,
    args: VerifyArgs,
    shutdown: &CancellationToken,
) -> Result<(), CliError> {
    let policy = args.policy(ctx.settings.policy);
    info!(
        dependencies = ctx.descriptors.len(),
        policy = ?policy,
        "Verifying dependencies"
    );

    match ctx
        .orchestrator
        .verify_with_cancel(&ctx.descriptors, policy, shutdown)
        .await
    {
        Ok(report) => print_report(&report, args.json),
        Err(VerifyError::Incompatible(report)) => {
            print_report(&report, args.json)?;
            Err(VerifyError::Incompatible(report).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(report: &CompatibilityReport, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", render_json(report)?);
    } else {
        println!("{}", render_table(report));
    }
    Ok(())
}
