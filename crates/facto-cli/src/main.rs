//! Facto CLI — offline evidence-bundle verification.
//!
//! ```bash
//! # Verify a bundle, colored human-readable report
//! facto verify session.json
//!
//! # Require full Merkle coverage (defends against tail truncation)
//! facto verify --strict session.json
//!
//! # Machine-readable report for scripting
//! facto verify --json session.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::verify;

/// Facto — cryptographically verifiable agent audit trails.
#[derive(Parser)]
#[command(
    name = "facto",
    version,
    about = "Facto CLI — offline verification of agent audit evidence bundles",
    long_about = "Facto records cryptographically-verifiable audit trails of AI agent\n\
                  activity. This CLI replays every hash, signature, chain link and\n\
                  Merkle proof in an evidence bundle without trusting the server that\n\
                  produced it."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an evidence bundle's hashes, signatures, chains and Merkle proofs
    #[command(name = "verify")]
    Verify(verify::VerifyArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Verify(args) => verify::run(args),
    }
}

/// Wire verbosity flags (`-v`, `-vv`) to a `tracing` env-filter level.
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
