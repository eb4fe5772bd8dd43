//! CLI entry point.
//!
//! Wires logging, environment and Ctrl-C handling together, then hands the
//! parsed command to [`handlers::dispatch`].

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use depgate_cli::{Cli, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
            on_signal.cancel();
        }
    });

    if let Err(err) = handlers::dispatch(cli.command, shutdown).await {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }

    Ok(())
}
