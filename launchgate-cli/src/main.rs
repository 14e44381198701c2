// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Launchgate CLI - launch orchestration from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show the persisted launch records
//! launchgate status
//!
//! # Run a full scripted launch sequence
//! launchgate simulate --scenario first-launch
//!
//! # Organic install with re-verification
//! launchgate simulate --scenario organic
//!
//! # Offline resume that recovers when connectivity returns
//! launchgate simulate --scenario offline-resume
//!
//! # One-shot decision request against a real endpoint
//! launchgate decide --endpoint https://decide.example.com/v1/launch
//!
//! # JSON output
//! launchgate status --format json --pretty
//!
//! # Clear the persisted records
//! launchgate reset --yes
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use launchgate_store::LaunchStore;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{decide, reset, simulate, status};

// ============================================================================
// CLI Definition
// ============================================================================

/// Launchgate CLI - launch orchestration.
#[derive(Parser)]
#[command(name = "launchgate")]
#[command(about = "Launch orchestration CLI")]
#[command(long_about = r#"
Launchgate decides, on every app launch, whether to present a remote web
experience or the native experience, based on attribution data and a
remote decision endpoint.

Commands:
  status     Show the persisted launch records (default)
  simulate   Run a scripted launch sequence end to end
  decide     Issue one decision request against a real endpoint
  reset      Remove the persisted records

Examples:
  launchgate                             # Same as 'launchgate status'
  launchgate simulate -s organic         # Organic install scenario
  launchgate simulate -s cached-resume   # Endpoint down, cache serves
  launchgate decide -e https://decide.example.com/v1/launch
  launchgate status --format json
"#)]
#[command(version)]
#[command(author = "Launchgate Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'status' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Record store directory (defaults to the per-user data directory).
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// The record store the command should operate on.
    fn store(&self) -> LaunchStore {
        match &self.store_dir {
            Some(dir) => LaunchStore::with_dir(dir),
            None => LaunchStore::new(),
        }
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the persisted launch records (default if no command specified).
    #[command(visible_alias = "st")]
    Status,

    /// Run a scripted launch sequence end to end.
    #[command(visible_alias = "sim")]
    Simulate(simulate::SimulateArgs),

    /// Issue one decision request against a real endpoint.
    #[command(visible_alias = "d")]
    Decide(decide::DecideArgs),

    /// Remove the persisted launch records.
    Reset(reset::ResetArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The decision endpoint declined a web experience.
    Rejected = 2,
    /// No usable connectivity.
    Offline = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("launchgate=debug,info")
    } else {
        EnvFilter::new("launchgate=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Status) | None => status::run(&cli).await,
        Some(Commands::Simulate(args)) => simulate::run(args, &cli).await,
        Some(Commands::Decide(args)) => decide::run(args, &cli).await,
        Some(Commands::Reset(args)) => reset::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
