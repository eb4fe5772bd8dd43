//! Single-descriptor execution: timeout envelope, retries, cancellation.
//!
//! # Cancellation
//!
//! Every attempt and every backoff sleep races the run's
//! [`CancellationToken`]. A cancelled unit produces no outcome at all, so a
//! shutdown is never reported as a dependency failure.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use depgate_core::{
    DependencyVersion, ResolutionOutcome, ResolveError, ResolveRequest, ResolverDescriptor,
    SourceProvider, ensure_found,
};

/// Run `descriptor` until it succeeds, fails permanently, or exhausts its
/// retries.
///
/// Returns `None` when `cancel` fires first.
pub async fn resolve_with_retry(
    descriptor: &ResolverDescriptor,
    sources: &dyn SourceProvider,
    cancel: &CancellationToken,
) -> Option<ResolutionOutcome> {
    let options = descriptor.options();
    let max_attempts = options.max_attempts();
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let request = descriptor.request(attempt);

        debug!(
            target: "depgate.verify",
            dependency = %descriptor.name(),
            resolver = descriptor.resolver().kind(),
            attempt,
            max_attempts,
            "Resolving dependency version"
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = run_attempt(descriptor, sources, &request) => result,
        };

        let error = match result {
            Ok(versions) => {
                debug!(
                    target: "depgate.verify",
                    dependency = %descriptor.name(),
                    attempt,
                    versions = versions.len(),
                    "Dependency resolved"
                );
                return Some(ResolutionOutcome {
                    result: Ok(versions),
                    attempts: attempt,
                    elapsed: started.elapsed(),
                });
            }
            Err(error) => error,
        };

        if !error.is_transient() || attempt >= max_attempts {
            return Some(ResolutionOutcome::failed(error, attempt, started.elapsed()));
        }

        let delay = options.backoff.delay_for(attempt);
        warn!(
            target: "depgate.verify",
            dependency = %descriptor.name(),
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %error,
            "Transient resolver failure, retrying"
        );

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// One attempt under the descriptor's deadline. Panics inside the resolver
/// are contained here and become [`ResolveError::Internal`].
async fn run_attempt(
    descriptor: &ResolverDescriptor,
    sources: &dyn SourceProvider,
    request: &ResolveRequest,
) -> Result<Vec<DependencyVersion>, ResolveError> {
    let resolve = AssertUnwindSafe(descriptor.resolver().resolve(sources, request)).catch_unwind();

    match tokio::time::timeout(request.timeout, resolve).await {
        Err(_elapsed) => Err(ResolveError::Timeout {
            after: request.timeout,
        }),
        Ok(Err(payload)) => Err(ResolveError::Internal(format!(
            "resolver panicked: {}",
            panic_message(payload.as_ref())
        ))),
        Ok(Ok(result)) => ensure_found(&request.dependency, result?),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
