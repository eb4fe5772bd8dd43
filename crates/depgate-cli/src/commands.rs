//! Subcommand definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Subcommand;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "depgate.json";

/// Default bind address for `depgate serve`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8089";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve every configured dependency and check it against its range
    Verify {
        /// Path to the verifier configuration (JSON)
        #[arg(short, long, env = "DEPGATE_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Report failures without a non-zero exit code
        #[arg(long)]
        log_only: bool,
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check literal versions against a constraint, without resolving anything
    Check {
        /// Constraint expression, e.g. ">=4.0.0,<5.0.0"
        constraint: String,
        /// Versions to check
        #[arg(required = true)]
        versions: Vec<String>,
    },
    /// Serve `/health` and `/health/dependencies` over HTTP
    Serve {
        /// Path to the verifier configuration (JSON)
        #[arg(short, long, env = "DEPGATE_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Address to bind
        #[arg(short, long, env = "DEPGATE_ADDR", default_value = DEFAULT_ADDR)]
        addr: SocketAddr,
        /// Upper bound for one dependency check, in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
}
