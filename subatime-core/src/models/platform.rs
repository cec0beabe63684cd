//! Platform-related types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Platform Kind
// ============================================================================

/// Social platforms whose follower counts are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// YouTube (subscriber count)
    Youtube,
    /// TikTok (follower count)
    TikTok,
    /// Instagram (follower count)
    Instagram,
    /// Facebook (page fan count)
    Facebook,
}

impl PlatformKind {
    /// Returns the display name for this platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Youtube => "YouTube",
            Self::TikTok => "TikTok",
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
        }
    }

    /// Returns the lowercase key for this platform (config keys, CLI args).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::TikTok => "tiktok",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
        }
    }

    /// Returns all tracked platforms.
    pub fn all() -> &'static [PlatformKind] {
        &[Self::Youtube, Self::TikTok, Self::Instagram, Self::Facebook]
    }

    /// Returns true if this platform has a supported provider API.
    ///
    /// TikTok exposes no public follower-count API and is scrape-only.
    pub fn supports_api(&self) -> bool {
        !matches!(self, Self::TikTok)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PlatformKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Self::Youtube),
            "tiktok" => Ok(Self::TikTok),
            "instagram" => Ok(Self::Instagram),
            "facebook" => Ok(Self::Facebook),
            other => Err(CoreError::PlatformNotFound(other.to_string())),
        }
    }
}

// ============================================================================
// Acquisition Mode
// ============================================================================

/// How a platform's follower count is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionMode {
    /// Fetch through the platform's provider API.
    Api,
    /// Extract from a page element through the shared browser session.
    #[default]
    Scrape,
}

impl AcquisitionMode {
    /// Returns the display name for this mode.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Scrape => "Scrape",
        }
    }

    /// Converts to the [`SampleSource`] recorded on emitted samples.
    pub fn to_sample_source(self) -> SampleSource {
        match self {
            Self::Api => SampleSource::Api,
            Self::Scrape => SampleSource::Scrape,
        }
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Sample Source
// ============================================================================

/// The source a follower sample was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    /// Provider API.
    Api,
    /// Browser-driven scrape.
    Scrape,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display_name() {
        assert_eq!(PlatformKind::Youtube.display_name(), "YouTube");
        assert_eq!(PlatformKind::TikTok.display_name(), "TikTok");
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("youtube".parse::<PlatformKind>().unwrap(), PlatformKind::Youtube);
        assert_eq!("Facebook".parse::<PlatformKind>().unwrap(), PlatformKind::Facebook);
        assert!("myspace".parse::<PlatformKind>().is_err());
    }

    #[test]
    fn test_api_support() {
        assert!(PlatformKind::Youtube.supports_api());
        assert!(PlatformKind::Instagram.supports_api());
        assert!(!PlatformKind::TikTok.supports_api());
    }

    #[test]
    fn test_mode_to_source() {
        assert_eq!(AcquisitionMode::Api.to_sample_source(), SampleSource::Api);
        assert_eq!(AcquisitionMode::Scrape.to_sample_source(), SampleSource::Scrape);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&PlatformKind::Youtube).unwrap();
        assert_eq!(json, "\"youtube\"");

        let mode: AcquisitionMode = serde_json::from_str("\"api\"").unwrap();
        assert_eq!(mode, AcquisitionMode::Api);
    }
}
