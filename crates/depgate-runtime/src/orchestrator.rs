//! Fan-out/fan-in execution of a descriptor set.
//!
//! Each descriptor runs as its own tokio task with its own deadline and
//! retry budget. Outcomes are collected as tasks finish and slotted back into
//! descriptor order before the report is built, so presentation never
//! depends on execution timing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use depgate_core::{
    CompatibilityReport, FailurePolicy, NoopSourceProvider, ResolutionOutcome, ResolveError,
    ResolverDescriptor, SourceProvider, VerifyError, build_report,
};

use crate::attempt::resolve_with_retry;

/// Runs verification passes against a shared source provider.
///
/// Holds no state between runs; every call returns a fresh report.
#[derive(Clone)]
pub struct ResolutionOrchestrator {
    sources: Arc<dyn SourceProvider>,
}

impl std::fmt::Debug for ResolutionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionOrchestrator").finish_non_exhaustive()
    }
}

impl ResolutionOrchestrator {
    pub fn new(sources: Arc<dyn SourceProvider>) -> Self {
        Self { sources }
    }

    /// Orchestrator for resolvers that need no connection info.
    pub fn without_sources() -> Self {
        Self::new(Arc::new(NoopSourceProvider))
    }

    pub fn sources(&self) -> &Arc<dyn SourceProvider> {
        &self.sources
    }

    /// Resolve every descriptor concurrently and build the report.
    ///
    /// Resolver failures are embedded in the report; the only error is
    /// [`VerifyError::Cancelled`] (or [`VerifyError::Runtime`] if a task
    /// could not be joined).
    pub async fn run(
        &self,
        descriptors: &[ResolverDescriptor],
        cancel: &CancellationToken,
    ) -> Result<CompatibilityReport, VerifyError> {
        let started = Instant::now();
        let run_token = cancel.child_token();
        let mut tasks = JoinSet::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            let descriptor = descriptor.clone();
            let sources = Arc::clone(&self.sources);
            let token = run_token.clone();
            tasks.spawn(async move {
                let outcome = resolve_with_retry(&descriptor, sources.as_ref(), &token).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ResolutionOutcome>> = vec![None; descriptors.len()];

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                joined = tasks.join_next() => Some(joined),
            };

            match joined {
                // Caller cancelled the run
                None | Some(Some(Ok((_, None)))) => {
                    run_token.cancel();
                    tasks.abort_all();
                    debug!(target: "depgate.verify", "Verification run cancelled");
                    return Err(VerifyError::Cancelled);
                }
                Some(None) => break,
                Some(Some(Ok((index, Some(outcome))))) => slots[index] = Some(outcome),
                Some(Some(Err(join_error))) => {
                    run_token.cancel();
                    tasks.abort_all();
                    return Err(VerifyError::Runtime(join_error.to_string()));
                }
            }
        }

        let paired = descriptors.iter().zip(slots).map(|(descriptor, slot)| {
            let outcome = slot.unwrap_or_else(|| {
                ResolutionOutcome::failed(
                    ResolveError::Internal("resolution task produced no outcome".to_string()),
                    0,
                    Duration::ZERO,
                )
            });
            (descriptor, outcome)
        });
        let report = build_report(paired).with_elapsed(started.elapsed());

        info!(
            target: "depgate.verify",
            overall = report.overall().as_str(),
            dependencies = report.dependencies().len(),
            failed = report.failures().count(),
            elapsed_ms = report.elapsed_ms(),
            "Dependency verification finished"
        );

        Ok(report)
    }

    /// Run and apply `policy`.
    pub async fn verify(
        &self,
        descriptors: &[ResolverDescriptor],
        policy: FailurePolicy,
    ) -> Result<CompatibilityReport, VerifyError> {
        self.verify_with_cancel(descriptors, policy, &CancellationToken::new())
            .await
    }

    /// Like [`verify`](Self::verify), stopping early when `cancel` fires.
    pub async fn verify_with_cancel(
        &self,
        descriptors: &[ResolverDescriptor],
        policy: FailurePolicy,
        cancel: &CancellationToken,
    ) -> Result<CompatibilityReport, VerifyError> {
        let report = self.run(descriptors, cancel).await?;
        policy.apply(report)
    }

    /// Synchronous entry point for startup gates.
    ///
    /// Drives the run on a private current-thread runtime. Inside an async
    /// context this returns [`VerifyError::Runtime`]; use
    /// [`verify`](Self::verify) there.
    pub fn verify_blocking(
        &self,
        descriptors: &[ResolverDescriptor],
        policy: FailurePolicy,
    ) -> Result<CompatibilityReport, VerifyError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(VerifyError::Runtime(
                "verify_blocking called inside an async runtime; use verify".to_string(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| VerifyError::Runtime(format!("failed to start runtime: {e}")))?;
        runtime.block_on(self.verify(descriptors, policy))
    }
}
