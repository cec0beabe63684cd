//! Follower samples produced by acquisition jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::platform::{PlatformKind, SampleSource};

// ============================================================================
// Follower Sample
// ============================================================================

/// One observed follower count for a platform.
///
/// Samples are immutable: a job produces one per successful fetch and the
/// crediting engine consumes it exactly once. `is_initial` marks the first
/// sample since the job's baseline was reset; it establishes the baseline
/// and is never credited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerSample {
    /// The platform this count belongs to.
    pub platform: PlatformKind,
    /// The absolute follower count observed.
    pub count: u64,
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Where the count came from.
    pub source: SampleSource,
    /// True for the first sample after a baseline reset.
    pub is_initial: bool,
}

impl FollowerSample {
    /// Creates a sample stamped with the current time.
    pub fn new(platform: PlatformKind, count: u64, source: SampleSource, is_initial: bool) -> Self {
        Self {
            platform,
            count,
            timestamp: Utc::now(),
            source,
            is_initial,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_roundtrip() {
        let sample = FollowerSample::new(PlatformKind::Youtube, 1000, SampleSource::Api, true);
        let json = serde_json::to_string(&sample).unwrap();
        let back: FollowerSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
