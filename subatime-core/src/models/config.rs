//! Per-platform acquisition configuration.

use serde::{Deserialize, Serialize};

use super::platform::AcquisitionMode;

// ============================================================================
// Platform Config
// ============================================================================

/// Acquisition configuration for one platform.
///
/// Owned by the configuration layer and read-only to the engine; changing
/// it triggers a stop-then-restart of the platform's polling job. Which
/// fields are required depends on the selected mode and platform; the
/// strategy builder validates completeness before any job is scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Whether this platform participates in acquisition.
    #[serde(default)]
    pub enabled: bool,
    /// API or browser-scrape acquisition.
    #[serde(default)]
    pub mode: AcquisitionMode,
    /// Page URL (scrape mode) or channel URL (YouTube API mode).
    #[serde(default)]
    pub url: String,
    /// CSS selector or `/`-prefixed path expression (scrape mode).
    #[serde(default)]
    pub locator: String,
    /// Provider API key (YouTube).
    #[serde(default)]
    pub api_key: String,
    /// Graph API access token (Instagram, Facebook).
    #[serde(default)]
    pub access_token: String,
    /// Graph API user id (Instagram).
    #[serde(default)]
    pub user_id: String,
    /// Graph API page id (Facebook).
    #[serde(default)]
    pub page_id: String,
    /// Per-platform polling interval override in milliseconds.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_disabled_scrape() {
        let config: PlatformConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.mode, AcquisitionMode::Scrape);
        assert!(config.url.is_empty());
        assert!(config.poll_interval_ms.is_none());
    }
}
