use clap::Parser;

use crate::commands::Commands;

/// Verify that runtime dependencies sit inside their declared version ranges
#[derive(Parser, Debug)]
#[command(name = "depgate")]
#[command(about = "Verify that runtime dependencies sit inside their declared version ranges")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
