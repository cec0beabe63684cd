//! Diagnostic checks for platform configuration.

use std::time::Duration;

use anyhow::{bail, Result};
use subatime_core::PlatformKind;
use subatime_engine::Engine;
use subatime_store::Config;

use crate::Cli;

/// Arguments for the check command.
#[derive(clap::Args)]
pub struct CheckArgs {
    /// What to check.
    #[command(subcommand)]
    pub target: CheckTarget,
}

/// Check subcommands.
#[derive(clap::Subcommand)]
pub enum CheckTarget {
    /// Test a platform's API credentials from the saved configuration.
    Api {
        /// Platform to check (youtube, instagram, facebook).
        #[arg(long, short)]
        platform: String,
    },
    /// Test a locator against a page through the browser session.
    Locator {
        /// Platform to check (youtube, tiktok, instagram, facebook).
        #[arg(long, short)]
        platform: String,
        /// Page URL; defaults to the platform's configured URL.
        #[arg(long)]
        url: Option<String>,
        /// CSS selector or `/`-prefixed path; defaults to the configured one.
        #[arg(long)]
        locator: Option<String>,
        /// Seconds to wait for the locator.
        #[arg(long, default_value_t = 15)]
        timeout_secs: u64,
    },
}

/// Runs a diagnostic check. Never touches live polling state.
pub async fn run(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    let report = match &args.target {
        CheckTarget::Api { platform } => {
            let platform: PlatformKind = platform.parse()?;
            let engine = Engine::new(config);
            engine.test_api_credentials(platform).await
        }
        CheckTarget::Locator {
            platform,
            url,
            locator,
            timeout_secs,
        } => {
            let platform: PlatformKind = platform.parse()?;
            let platform_config = config.platform(platform);

            let url = url.clone().unwrap_or(platform_config.url);
            let locator = locator.clone().unwrap_or(platform_config.locator);
            if url.is_empty() || locator.is_empty() {
                bail!("no URL/locator given and none configured for {platform}");
            }

            let engine = Engine::new(config);
            engine.acquire_browser().await?;
            let report = engine
                .test_locator(
                    platform,
                    &url,
                    &locator,
                    Some(Duration::from_secs(*timeout_secs)),
                )
                .await;
            engine.shutdown().await;
            report
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "platform": report.platform.key(),
                "success": report.success,
                "value": report.value,
                "message": report.message,
            })
        );
    } else {
        let mark = if report.success { "✓" } else { "✗" };
        println!("{mark} {} — {}", report.platform.display_name(), report.message);
    }

    if report.success {
        Ok(())
    } else {
        bail!("check failed")
    }
}
