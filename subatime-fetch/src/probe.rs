//! Diagnostic probes.
//!
//! Probes verify a platform's configuration without affecting live polling:
//! a locator probe drives a throwaway page (never the platform's polling
//! page) and an API probe calls the provider once. Neither touches
//! platform statistics.

use std::time::Duration;

use subatime_core::PlatformKind;
use tracing::debug;

use crate::browser::BrowserSession;
use crate::error::FetchError;

/// Default wait for a probe's locator to appear.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// Probe Report
// ============================================================================

/// Structured result of a diagnostic probe.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// The platform that was probed.
    pub platform: PlatformKind,
    /// Whether the probe succeeded.
    pub success: bool,
    /// The extracted follower count, when the probe succeeded.
    pub value: Option<u64>,
    /// Human-readable outcome description.
    pub message: String,
}

impl ProbeReport {
    /// Creates a success report for an extracted value.
    pub fn success(platform: PlatformKind, value: u64) -> Self {
        Self {
            platform,
            success: true,
            value: Some(value),
            message: format!("Probe succeeded, current count: {value}"),
        }
    }

    /// Creates a failure report from an error.
    pub fn failure(platform: PlatformKind, error: &FetchError) -> Self {
        Self {
            platform,
            success: false,
            value: None,
            message: format!("Probe failed: {error}"),
        }
    }
}

// ============================================================================
// Locator Probe
// ============================================================================

/// Tests a URL + locator pair against a throwaway page.
pub async fn test_locator(
    session: &BrowserSession,
    platform: PlatformKind,
    url: &str,
    locator: &str,
    timeout: Option<Duration>,
) -> ProbeReport {
    let timeout = timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT);
    debug!(platform = %platform.key(), locator, "Testing locator");

    match session.read_locator_once(url, locator, timeout).await {
        Ok(value) => ProbeReport::success(platform, value),
        Err(err) => ProbeReport::failure(platform, &err),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_messages() {
        let ok = ProbeReport::success(PlatformKind::Youtube, 42);
        assert!(ok.success);
        assert_eq!(ok.value, Some(42));
        assert!(ok.message.contains("42"));

        let err = FetchError::ElementNotFound {
            locator: "#followers".to_string(),
            timeout_ms: 5000,
        };
        let failed = ProbeReport::failure(PlatformKind::TikTok, &err);
        assert!(!failed.success);
        assert!(failed.value.is_none());
        assert!(failed.message.contains("#followers"));
    }
}
