//! Strategy selection and configuration validation.
//!
//! [`build_strategy`] is invoked once when a polling job starts: it checks
//! that the platform's configuration is complete for the selected mode and
//! returns the strategy every subsequent tick will call. Incomplete
//! configuration fails fast with `ConfigIncomplete` and nothing is
//! scheduled.

use subatime_core::{AcquisitionMode, PlatformConfig, PlatformKind};
use subatime_fetch::{
    AcquisitionStrategy, BrowserSession, FetchError, ProbeReport, ScrapeStrategy,
};
use tracing::debug;

use crate::facebook::{FacebookApiClient, FacebookApiStrategy};
use crate::instagram::{InstagramApiClient, InstagramApiStrategy};
use crate::youtube::{YoutubeApiClient, YoutubeApiStrategy};

// ============================================================================
// Strategy Builder
// ============================================================================

/// Builds the acquisition strategy for a platform from its configuration.
///
/// # Errors
///
/// - [`FetchError::ConfigIncomplete`] when required fields for the selected
///   mode are missing.
/// - [`FetchError::UnsupportedOperation`] when API mode is requested for a
///   platform without a provider API (TikTok).
pub fn build_strategy(
    platform: PlatformKind,
    config: &PlatformConfig,
    session: &BrowserSession,
) -> Result<Box<dyn AcquisitionStrategy>, FetchError> {
    let strategy = match config.mode {
        AcquisitionMode::Api => build_api_strategy(platform, config)?,
        AcquisitionMode::Scrape => {
            if config.url.is_empty() || config.locator.is_empty() {
                return Err(FetchError::ConfigIncomplete(format!(
                    "{}: scrape mode requires both a URL and a locator",
                    platform.key()
                )));
            }
            Box::new(ScrapeStrategy::new(
                session.clone(),
                platform,
                &config.url,
                &config.locator,
            ))
        }
    };

    debug!(strategy = %strategy.id(), "Strategy selected");
    Ok(strategy)
}

fn build_api_strategy(
    platform: PlatformKind,
    config: &PlatformConfig,
) -> Result<Box<dyn AcquisitionStrategy>, FetchError> {
    match platform {
        PlatformKind::Youtube => {
            if config.api_key.is_empty() || config.url.is_empty() {
                return Err(FetchError::ConfigIncomplete(
                    "youtube: API mode requires an API key and a channel URL".to_string(),
                ));
            }
            Ok(Box::new(YoutubeApiStrategy::new(&config.api_key, &config.url)))
        }
        PlatformKind::Instagram => {
            if config.access_token.is_empty() || config.user_id.is_empty() {
                return Err(FetchError::ConfigIncomplete(
                    "instagram: API mode requires an access token and a user id".to_string(),
                ));
            }
            Ok(Box::new(InstagramApiStrategy::new(
                &config.access_token,
                &config.user_id,
            )))
        }
        PlatformKind::Facebook => {
            if config.access_token.is_empty() || config.page_id.is_empty() {
                return Err(FetchError::ConfigIncomplete(
                    "facebook: API mode requires an access token and a page id".to_string(),
                ));
            }
            Ok(Box::new(FacebookApiStrategy::new(
                &config.access_token,
                &config.page_id,
            )))
        }
        PlatformKind::TikTok => Err(FetchError::UnsupportedOperation(PlatformKind::TikTok)),
    }
}

// ============================================================================
// Credential Probe
// ============================================================================

/// Tests a platform's API credentials with one live call.
///
/// Diagnostic only: the result is reported to the caller and platform
/// statistics are never touched.
pub async fn test_api_credentials(platform: PlatformKind, config: &PlatformConfig) -> ProbeReport {
    let result = match platform {
        PlatformKind::Youtube => {
            YoutubeApiClient::new()
                .fetch_subscriber_count(&config.api_key, &config.url)
                .await
        }
        PlatformKind::Instagram => {
            InstagramApiClient::new()
                .fetch_follower_count(&config.access_token, &config.user_id)
                .await
        }
        PlatformKind::Facebook => {
            FacebookApiClient::new()
                .fetch_fan_count(&config.access_token, &config.page_id)
                .await
        }
        PlatformKind::TikTok => Err(FetchError::UnsupportedOperation(PlatformKind::TikTok)),
    };

    match result {
        Ok(value) => ProbeReport::success(platform, value),
        Err(err) => ProbeReport::failure(platform, &err),
    }
}

// ============================================================================
// Tests
// ============================================================================
