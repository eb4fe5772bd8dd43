//! Command handlers.
//!
//! Each handler takes parsed arguments, performs the operation and prints
//! its output. Errors bubble up as [`CliError`] and `main` turns them into
//! exit codes.

pub mod check;
pub mod serve;
pub mod verify;

use tokio_util::sync::CancellationToken;

use crate::commands::Commands;
use crate::error::CliError;

/// Dispatch a parsed command. `shutdown` fires on Ctrl-C.
pub async fn dispatch(command: Commands, shutdown: CancellationToken) -> Result<(), CliError> {
    match command {
        Commands::Verify {
            config,
            log_only,
            json,
        } => {
            let ctx = crate::bootstrap::bootstrap(&config)?;
            verify::execute(&ctx, verify::VerifyArgs { log_only, json }, &shutdown).await
        }
        Commands::Check {
            constraint,
            versions,
        } => check::execute(&constraint, &versions),
        Commands::Serve {
            config,
            addr,
            deadline_ms,
        } => {
            let ctx = crate::bootstrap::bootstrap(&config)?;
            serve::execute(ctx, addr, deadline_ms, shutdown).await
        }
    }
}
