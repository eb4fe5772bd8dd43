//! Shared state for the health routes.

use std::sync::Arc;
use std::time::Duration;

use depgate_core::ResolverDescriptor;
use depgate_runtime::ResolutionOrchestrator;
use tokio_util::sync::CancellationToken;

/// Everything a health request needs to run a fresh verification.
///
/// Cloned per request; descriptors are shared, never mutated.
#[derive(Debug, Clone)]
pub struct HealthState {
    orchestrator: Arc<ResolutionOrchestrator>,
    descriptors: Arc<[ResolverDescriptor]>,
    deadline: Option<Duration>,
    shutdown: CancellationToken,
}

impl HealthState {
    pub fn new(orchestrator: ResolutionOrchestrator, descriptors: Vec<ResolverDescriptor>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            descriptors: descriptors.into(),
            deadline: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Bound each health check to `deadline` in total.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Token that stops in-flight checks and the server.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn orchestrator(&self) -> &ResolutionOrchestrator {
        &self.orchestrator
    }

    pub fn descriptors(&self) -> &[ResolverDescriptor] {
        &self.descriptors
    }

    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub const fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}
