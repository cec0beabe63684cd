//! Observable aggregate state.
//!
//! [`StateStore`] is the single point other layers read for broadcast.
//! Mutations that touch shared aggregates go through the engine's
//! single-writer run loop or its command methods; concurrent platform
//! credits can never lose updates because nothing else writes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subatime_core::{PlatformKind, PlatformStats, SessionTotals, TimerSnapshot};
use tokio::sync::watch;

// ============================================================================
// Credit Event
// ============================================================================

/// Record of the most recent timer credit, for client-side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEvent {
    /// The platform that gained followers.
    pub platform: PlatformKind,
    /// How many new followers were credited.
    pub new_followers: u64,
    /// Timer milliseconds granted for them.
    pub time_added_ms: u64,
    /// When the credit was applied.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Engine State
// ============================================================================

/// The aggregate record broadcast to viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    /// Countdown timer projection.
    pub timer: TimerSnapshot,
    /// Per-platform statistics.
    pub platform_stats: HashMap<PlatformKind, PlatformStats>,
    /// Session-wide totals.
    pub totals: SessionTotals,
    /// Latched true when the session goal has been reached; cleared on
    /// session reset. Doubles as the once-per-crossing notification latch.
    pub goal_reached: bool,
    /// The most recent credit, if any.
    pub last_credit: Option<CreditEvent>,
}

impl Default for EngineState {
    fn default() -> Self {
        let mut platform_stats = HashMap::new();
        for &platform in PlatformKind::all() {
            platform_stats.insert(platform, PlatformStats::default());
        }
        Self {
            timer: TimerSnapshot::STOPPED,
            platform_stats,
            totals: SessionTotals::default(),
            goal_reached: false,
            last_credit: None,
        }
    }
}

impl EngineState {
    /// Builds state from persisted stats and totals, every platform present.
    pub fn from_persisted(
        platform_stats: HashMap<PlatformKind, PlatformStats>,
        totals: SessionTotals,
    ) -> Self {
        let mut state = Self::default();
        for (platform, stats) in platform_stats {
            state.platform_stats.insert(platform, stats);
        }
        state.totals = totals;
        state
    }

    /// Returns the stats entry for a platform, creating it if missing.
    pub fn stats_mut(&mut self, platform: PlatformKind) -> &mut PlatformStats {
        self.platform_stats.entry(platform).or_default()
    }
}

// ============================================================================
// State Store
// ============================================================================

/// Shared, observable state container.
///
/// Reads are lock-free clones of the latest broadcast value; writes apply
/// a closure and publish the updated snapshot to all subscribers.
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<EngineState>>,
}

impl StateStore {
    /// Creates a store with the given initial state.
    pub fn new(initial: EngineState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Returns a snapshot of the current state.
    pub fn snapshot(&self) -> EngineState {
        self.tx.borrow().clone()
    }

    /// Subscribes to state changes. The receiver always observes the
    /// latest snapshot (best-effort broadcast; intermediate states may be
    /// skipped).
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.tx.subscribe()
    }

    /// Applies a mutation and publishes the result, returning the new state.
    pub fn mutate(&self, f: impl FnOnce(&mut EngineState)) -> EngineState {
        let mut updated = None;
        self.tx.send_modify(|state| {
            f(state);
            updated = Some(state.clone());
        });
        updated.unwrap_or_else(|| self.snapshot())
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(EngineState::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_has_all_platforms() {
        let state = EngineState::default();
        assert_eq!(state.platform_stats.len(), 4);
        assert_eq!(state.timer, TimerSnapshot::STOPPED);
        assert!(!state.goal_reached);
    }

    #[test]
    fn test_mutate_publishes_to_subscribers() {
        let store = StateStore::default();
        let rx = store.subscribe();

        let updated = store.mutate(|state| {
            state.stats_mut(PlatformKind::Youtube).total = 1000;
        });

        assert_eq!(updated.platform_stats[&PlatformKind::Youtube].total, 1000);
        assert_eq!(
            rx.borrow().platform_stats[&PlatformKind::Youtube].total,
            1000
        );
    }

    #[test]
    fn test_from_persisted_fills_missing_platforms() {
        let mut stats = HashMap::new();
        stats.insert(
            PlatformKind::TikTok,
            PlatformStats {
                total: 500,
                ..PlatformStats::default()
            },
        );

        let state = EngineState::from_persisted(stats, SessionTotals::default());
        assert_eq!(state.platform_stats.len(), 4);
        assert_eq!(state.platform_stats[&PlatformKind::TikTok].total, 500);
        assert_eq!(state.platform_stats[&PlatformKind::Youtube].total, 0);
    }
}
