//! Run the engine and stream state updates to the terminal.

use std::io::Write;

use anyhow::Result;
use subatime_core::AcquisitionMode;
use subatime_engine::{Engine, EngineOptions, EngineState};
use subatime_store::Config;
use tracing::warn;

use crate::Cli;

/// Arguments for the run command.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Start a countdown immediately with this many minutes.
    #[arg(long)]
    pub start_minutes: Option<u64>,
}

/// Runs the engine until Ctrl-C.
pub async fn run(args: &RunArgs, cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let snapshot = subatime_store::load_session_or_default().await;

    let needs_browser = config
        .platforms
        .values()
        .any(|p| p.enabled && p.mode == AcquisitionMode::Scrape);

    let engine = Engine::with_options(config, snapshot, EngineOptions { persist: true });

    if needs_browser {
        if let Err(err) = engine.acquire_browser().await {
            warn!(error = %err, "Browser unavailable, scrape-mode platforms will stall");
            if !cli.quiet {
                eprintln!("Warning: browser unavailable: {err}");
            }
        }
    }

    if let Some(minutes) = args.start_minutes {
        engine.start_timer(Some(minutes * 60_000)).await;
    }

    if !cli.quiet {
        eprintln!("Engine running. Ctrl-C to stop.");
    }

    let mut updates = engine.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_state(&state, cli)?;
            }
        }
    }

    if !cli.quiet {
        eprintln!("\nShutting down...");
    }
    engine.shutdown().await;
    Ok(())
}

fn print_state(state: &EngineState, cli: &Cli) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string(state)?);
        return Ok(());
    }

    let clock = format_clock(state.timer.remaining_ms);
    let status = if !state.timer.is_running {
        "stopped"
    } else if state.timer.is_paused {
        "paused"
    } else {
        "running"
    };

    let mut line = format!(
        "{clock} [{status}] session +{}",
        state.totals.total_session_followers
    );
    for (platform, stats) in &state.platform_stats {
        if stats.total == 0 && stats.session_new == 0 && stats.last_error.is_none() {
            continue;
        }
        let marker = if stats.last_error.is_some() { "!" } else { "" };
        line.push_str(&format!(
            "  {}{} {} (+{})",
            platform.key(),
            marker,
            stats.total,
            stats.session_new
        ));
    }
    if state.goal_reached {
        line.push_str("  GOAL");
    }

    // Redraw in place; the 100 ms tick cadence would otherwise flood the
    // terminal.
    print!("\r\x1b[K{line}");
    std::io::stdout().flush()?;
    Ok(())
}

fn format_clock(remaining_ms: u64) -> String {
    let total_secs = remaining_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

// ============================================================================
// Tests
// ============================================================================
