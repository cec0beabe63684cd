// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Subatime CLI - follower-driven subathon countdown from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Run the engine, broadcasting state to the terminal
//! subatime run
//!
//! # Run and start a 60-minute countdown immediately
//! subatime run --start-minutes 60
//!
//! # Test a platform's API credentials from the saved configuration
//! subatime check api --platform youtube
//!
//! # Test a locator against a page
//! subatime check locator --platform tiktok
//!
//! # JSON state output
//! subatime run --json
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{check, run};

// ============================================================================
// CLI Definition
// ============================================================================

/// Subatime CLI - follower-driven subathon countdown engine.
#[derive(Parser)]
#[command(name = "subatime")]
#[command(about = "Follower-driven subathon countdown engine")]
#[command(long_about = r#"
Subatime tracks follower counts on YouTube, TikTok, Instagram, and
Facebook and converts newly gained followers into extra countdown time.

Examples:
  subatime run                     # Run the engine
  subatime run --start-minutes 60  # Run and start a 60-minute countdown
  subatime check api -p youtube    # Verify API credentials
  subatime check locator -p tiktok # Verify a scrape locator
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Emit state as JSON lines instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (show debug logs).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logs).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the engine and stream state updates.
    #[command(visible_alias = "r")]
    Run(run::RunArgs),

    /// Test a platform's configuration without affecting live polling.
    #[command(visible_alias = "c")]
    Check(check::CheckArgs),
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("subatime=debug,info")
    } else {
        EnvFilter::new("subatime=warn")
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
        Commands::Run(args) => run::run(args, &cli).await,
        Commands::Check(args) => check::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}
