//! Fetch error types.
//!
//! The taxonomy mirrors how failures are contained: configuration errors
//! stop a job from being scheduled at all, per-tick errors are recorded
//! against the platform and polling continues, and browser-session errors
//! stall every scrape-mode platform until recovery succeeds.

use subatime_core::PlatformKind;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for acquisition operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Required configuration fields are missing for the selected mode.
    ///
    /// Acquisition for the platform does not start; nothing is scheduled.
    #[error("Incomplete configuration: {0}")]
    ConfigIncomplete(String),

    /// Missing or rejected credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The requested resource does not exist (channel, user, page).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-side failure, carrying the provider's message.
    #[error("Provider error: {0}")]
    Upstream(String),

    /// The platform does not support API acquisition.
    #[error("{0} does not support API acquisition")]
    UnsupportedOperation(PlatformKind),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Browser session failure (scrape-mode platforms stall until recovery).
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// The locator did not match any element before the timeout.
    #[error("Element not found for locator '{locator}' after {timeout_ms} ms")]
    ElementNotFound {
        /// The locator that was waited for.
        locator: String,
        /// How long the wait lasted.
        timeout_ms: u64,
    },

    /// The platform's page could not be created or reloaded.
    #[error("Page unavailable: {0}")]
    PageUnavailable(String),
}

// ============================================================================
// Browser Error
// ============================================================================

/// Error type for browser session operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No browser session is currently acquired.
    #[error("Browser unavailable: {0}")]
    Unavailable(String),

    /// Connecting to an externally running browser failed.
    #[error("Failed to connect to browser: {0}")]
    ConnectFailed(String),

    /// Launching a browser process failed.
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// No browser executable could be located.
    #[error("Browser executable not found")]
    ExecutableNotFound,

    /// The underlying connection dropped mid-operation.
    #[error("Browser disconnected")]
    Disconnected,

    /// DevTools protocol failure.
    #[error("CDP error: {0}")]
    Cdp(String),
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}
