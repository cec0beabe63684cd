//! Application configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use subatime_core::{PlatformConfig, PlatformKind};
use subatime_fetch::BrowserSettings;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::default_config_path;

/// Default polling interval between acquisition ticks.
const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Default timer credit per new follower.
const DEFAULT_TIME_PER_FOLLOWER_MS: u64 = 30_000;

/// Default initial countdown duration (60 minutes).
const DEFAULT_INITIAL_TIME_MS: u64 = 3_600_000;

// ============================================================================
// Config
// ============================================================================

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-platform acquisition configuration.
    #[serde(default = "default_platforms")]
    pub platforms: HashMap<PlatformKind, PlatformConfig>,
    /// Shared browser session settings.
    #[serde(default)]
    pub browser: BrowserSettings,
    /// Polling cadence.
    #[serde(default)]
    pub polling: PollingConfig,
    /// Timer credit granted per new follower, in milliseconds.
    #[serde(default = "default_time_per_follower")]
    pub time_per_follower_ms: u64,
    /// Countdown duration used when the timer starts, in milliseconds.
    #[serde(default = "default_initial_time")]
    pub initial_time_ms: u64,
    /// Session follower goal; 0 disables the goal notification.
    #[serde(default)]
    pub goal: u64,
}

/// Polling cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval between acquisition ticks, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_time_per_follower() -> u64 {
    DEFAULT_TIME_PER_FOLLOWER_MS
}

fn default_initial_time() -> u64 {
    DEFAULT_INITIAL_TIME_MS
}

/// All platforms disabled, with TikTok preseeded for Studio scraping.
fn default_platforms() -> HashMap<PlatformKind, PlatformConfig> {
    let mut platforms = HashMap::new();
    for &platform in PlatformKind::all() {
        let mut config = PlatformConfig::default();
        if platform == PlatformKind::TikTok {
            config.url = "https://www.tiktok.com/tiktokstudio".to_string();
            config.locator = "[data-e2e=\"followers-count\"]".to_string();
        }
        platforms.insert(platform, config);
    }
    platforms
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            browser: BrowserSettings::default(),
            polling: PollingConfig::default(),
            time_per_follower_ms: DEFAULT_TIME_PER_FOLLOWER_MS,
            initial_time_ms: DEFAULT_INITIAL_TIME_MS,
            goal: 0,
        }
    }
}

impl Config {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&default_config_path())
    }

    /// Loads configuration from a specific path, using defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub fn save(&self) -> Result<(), StoreError> {
        self.save_to(&default_config_path())
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Returns the configuration for a platform, defaulted when absent.
    pub fn platform(&self, kind: PlatformKind) -> PlatformConfig {
        self.platforms.get(&kind).cloned().unwrap_or_default()
    }

    /// Replaces the configuration for a platform.
    pub fn set_platform(&mut self, kind: PlatformKind, config: PlatformConfig) {
        self.platforms.insert(kind, config);
    }

    /// Returns the effective polling interval for a platform.
    pub fn poll_interval_ms(&self, kind: PlatformKind) -> u64 {
        self.platforms
            .get(&kind)
            .and_then(|p| p.poll_interval_ms)
            .unwrap_or(self.polling.interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.polling.interval_ms, 10_000);
        assert_eq!(config.time_per_follower_ms, 30_000);
        assert_eq!(config.initial_time_ms, 3_600_000);
        assert_eq!(config.goal, 0);
        assert_eq!(config.platforms.len(), 4);

        let tiktok = config.platform(PlatformKind::TikTok);
        assert!(!tiktok.enabled);
        assert_eq!(tiktok.url, "https://www.tiktok.com/tiktokstudio");
        assert_eq!(tiktok.locator, "[data-e2e=\"followers-count\"]");
    }

    #[test]
    fn test_poll_interval_override() {
        let mut config = Config::default();
        assert_eq!(config.poll_interval_ms(PlatformKind::Youtube), 10_000);

        let mut youtube = config.platform(PlatformKind::Youtube);
        youtube.poll_interval_ms = Some(5_000);
        config.set_platform(PlatformKind::Youtube, youtube);

        assert_eq!(config.poll_interval_ms(PlatformKind::Youtube), 5_000);
        assert_eq!(config.poll_interval_ms(PlatformKind::Facebook), 10_000);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config.time_per_follower_ms, 30_000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.goal = 500;
        config.time_per_follower_ms = 15_000;
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.goal, 500);
        assert_eq!(reloaded.time_per_follower_ms, 15_000);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "goal": 100 }"#).unwrap();
        assert_eq!(config.goal, 100);
        assert_eq!(config.polling.interval_ms, 10_000);
        assert_eq!(config.platforms.len(), 4);
    }
}
