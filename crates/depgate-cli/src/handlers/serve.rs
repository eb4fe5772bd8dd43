use std::net::SocketAddr;
use std::time::Duration;

use depgate_axum::HealthState;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Build the health endpoint state for `ctx`.
pub fn health_state(
    ctx: CliContext,
    deadline_ms: Option<u64>,
    shutdown: CancellationToken,
) -> Result<HealthState, CliError> {
    let mut state =
        HealthState::new(ctx.orchestrator, ctx.descriptors).with_shutdown(shutdown);
    if let Some(ms) = deadline_ms {
        if ms == 0 {
            return Err(CliError::Arguments(
                "--deadline-ms must be positive".to_string(),
            ));
        }
        state = state.with_deadline(Duration::from_millis(ms));
    }
    Ok(state)
}

/// Execute `depgate serve`. Returns once `shutdown` fires.
pub async fn execute(
    ctx: CliContext,
    addr: SocketAddr,
    deadline_ms: Option<u64>,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let state = health_state(ctx, deadline_ms, shutdown)?;
    debug!(%addr, dependencies = state.descriptors().len(), "Starting health server");
    depgate_axum::serve(addr, state).await?;
    info!("Health server stopped");
    Ok(())
}
