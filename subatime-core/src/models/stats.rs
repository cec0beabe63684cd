//! Accumulated per-platform and session-wide statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::platform::SampleSource;

// ============================================================================
// Platform Stats
// ============================================================================

/// Accumulated statistics for a single platform.
///
/// Mutated only by the crediting engine. `total` tracks the last known
/// absolute count; `session_new` accumulates positive deltas since the
/// session began and is never decremented by count drops or failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Last known absolute follower count.
    pub total: u64,
    /// Cumulative new followers gained this session.
    pub session_new: u64,
    /// Message of the most recent acquisition failure, if any.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Source of the most recent sample or fallback marker after a failure.
    #[serde(default)]
    pub last_source: Option<SampleSource>,
}

impl PlatformStats {
    /// Records a successful sample source and clears any prior error.
    pub fn record_success(&mut self, source: SampleSource) {
        self.last_error = None;
        self.last_source = Some(source);
    }

    /// Records a failure message, marking scrape as the fallback source.
    ///
    /// Prior `total`/`session_new` values are left untouched so a transient
    /// failure never erases accumulated progress.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.last_source = Some(SampleSource::Scrape);
    }
}

// ============================================================================
// Session Totals
// ============================================================================

/// Session-wide aggregates across all platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Total new followers gained this session, across platforms.
    pub total_session_followers: u64,
    /// Net timer milliseconds added this session (subtractions count down).
    pub total_session_time_added_ms: i64,
    /// When the session began; `None` before the first timer start.
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
}

impl SessionTotals {
    /// Resets all totals for a new session starting now.
    pub fn reset(&mut self, started: Option<DateTime<Utc>>) {
        self.total_session_followers = 0;
        self.total_session_time_added_ms = 0;
        self.session_start = started;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_failure_preserves_counts() {
        let mut stats = PlatformStats {
            total: 1200,
            session_new: 7,
            ..Default::default()
        };

        stats.record_failure("timeout waiting for selector");

        assert_eq!(stats.total, 1200);
        assert_eq!(stats.session_new, 7);
        assert_eq!(stats.last_error.as_deref(), Some("timeout waiting for selector"));
        assert_eq!(stats.last_source, Some(SampleSource::Scrape));
    }

    #[test]
    fn test_record_success_clears_error() {
        let mut stats = PlatformStats::default();
        stats.record_failure("boom");
        stats.record_success(SampleSource::Api);

        assert!(stats.last_error.is_none());
        assert_eq!(stats.last_source, Some(SampleSource::Api));
    }

    #[test]
    fn test_totals_reset() {
        let mut totals = SessionTotals {
            total_session_followers: 42,
            total_session_time_added_ms: 90_000,
            session_start: Some(Utc::now()),
        };

        totals.reset(None);
        assert_eq!(totals.total_session_followers, 0);
        assert_eq!(totals.total_session_time_added_ms, 0);
        assert!(totals.session_start.is_none());
    }
}
