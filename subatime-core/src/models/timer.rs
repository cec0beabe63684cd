//! Serializable projection of the countdown timer.

use serde::{Deserialize, Serialize};

// ============================================================================
// Timer Snapshot
// ============================================================================

/// Point-in-time view of the countdown timer.
///
/// `remaining_ms` is a derived projection refreshed by the timer's tick
/// loop; the authoritative deadline lives inside the timer service.
/// Invariant: `is_paused` implies `is_running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Milliseconds remaining on the countdown.
    pub remaining_ms: u64,
    /// Whether a countdown is active (running or paused).
    pub is_running: bool,
    /// Whether the active countdown is paused.
    pub is_paused: bool,
}

impl TimerSnapshot {
    /// A stopped timer with nothing remaining.
    pub const STOPPED: TimerSnapshot = TimerSnapshot {
        remaining_ms: 0,
        is_running: false,
        is_paused: false,
    };

    /// Returns true if the snapshot satisfies the timer invariants.
    pub fn is_valid(&self) -> bool {
        !self.is_paused || self.is_running
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_is_valid() {
        assert!(TimerSnapshot::STOPPED.is_valid());
    }

    #[test]
    fn test_paused_requires_running() {
        let bad = TimerSnapshot {
            remaining_ms: 1000,
            is_running: false,
            is_paused: true,
        };
        assert!(!bad.is_valid());

        let good = TimerSnapshot {
            remaining_ms: 1000,
            is_running: true,
            is_paused: true,
        };
        assert!(good.is_valid());
    }
}
