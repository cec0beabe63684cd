//! Sample-to-credit conversion.
//!
//! Baseline semantics: the first sample for a platform since its job's
//! baseline reset only establishes `total` — a streamer's pre-existing
//! followers are never credited as new at session start. Subsequent
//! samples credit positive deltas at the `time_per_follower` rate in
//! effect *at credit time*; drops update the absolute count only, with no
//! negative credit.

use subatime_core::{FollowerSample, PlatformKind};
use tracing::{debug, info};

use crate::state::{CreditEvent, EngineState};

// ============================================================================
// Credit Outcome
// ============================================================================

/// What a sample application asks the engine to do next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditOutcome {
    /// Timer milliseconds to credit; zero when nothing was gained.
    pub time_to_add_ms: u64,
    /// True when this credit crossed the session goal (fires once per
    /// crossing; the latch clears on session reset).
    pub goal_crossed: bool,
}

// ============================================================================
// Sample Application
// ============================================================================

/// Applies a sample to the aggregate state and returns the credit to issue.
pub fn apply_sample(
    state: &mut EngineState,
    sample: &FollowerSample,
    time_per_follower_ms: u64,
    goal: u64,
) -> CreditOutcome {
    let stats = state.stats_mut(sample.platform);
    stats.record_success(sample.source);
    let old_total = stats.total;

    if sample.is_initial {
        debug!(
            platform = %sample.platform.key(),
            count = sample.count,
            "Baseline sample, no credit"
        );
        stats.total = sample.count;
        return CreditOutcome::default();
    }

    if sample.count <= old_total {
        // Counts may legitimately drop; track the absolute value only.
        stats.total = sample.count;
        return CreditOutcome::default();
    }

    let new_followers = sample.count - old_total;
    stats.total = sample.count;
    stats.session_new += new_followers;
    state.totals.total_session_followers += new_followers;

    let time_to_add_ms = new_followers * time_per_follower_ms;
    info!(
        platform = %sample.platform.key(),
        new_followers,
        time_added_ms = time_to_add_ms,
        "Crediting new followers"
    );

    state.last_credit = Some(CreditEvent {
        platform: sample.platform,
        new_followers,
        time_added_ms: time_to_add_ms,
        timestamp: sample.timestamp,
    });

    let goal_crossed =
        goal > 0 && !state.goal_reached && state.totals.total_session_followers >= goal;
    if goal_crossed {
        info!(goal, total = state.totals.total_session_followers, "Session goal reached");
        state.goal_reached = true;
    }

    CreditOutcome {
        time_to_add_ms,
        goal_crossed,
    }
}

/// Records an acquisition failure against a platform.
///
/// Only the diagnostic fields change; accumulated totals survive every
/// transient failure.
pub fn apply_failure(state: &mut EngineState, platform: PlatformKind, message: &str) {
    state.stats_mut(platform).record_failure(message);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use subatime_core::SampleSource;

    fn sample(platform: PlatformKind, count: u64, is_initial: bool) -> FollowerSample {
        FollowerSample::new(platform, count, SampleSource::Api, is_initial)
    }

    #[test]
    fn test_initial_sample_sets_baseline_without_credit() {
        let mut state = EngineState::default();

        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 1000, true),
            30_000,
            0,
        );

        assert_eq!(outcome, CreditOutcome::default());
        let stats = &state.platform_stats[&PlatformKind::Youtube];
        assert_eq!(stats.total, 1000);
        assert_eq!(stats.session_new, 0);
        assert_eq!(state.totals.total_session_followers, 0);
        assert!(state.last_credit.is_none());
    }

    #[test]
    fn test_positive_delta_credits_time() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::Youtube, 1000, true), 30_000, 0);

        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 1005, false),
            30_000,
            0,
        );

        assert_eq!(outcome.time_to_add_ms, 150_000);
        assert!(!outcome.goal_crossed);

        let stats = &state.platform_stats[&PlatformKind::Youtube];
        assert_eq!(stats.total, 1005);
        assert_eq!(stats.session_new, 5);
        assert_eq!(state.totals.total_session_followers, 5);

        let credit = state.last_credit.as_ref().unwrap();
        assert_eq!(credit.new_followers, 5);
        assert_eq!(credit.time_added_ms, 150_000);
    }

    #[test]
    fn test_count_drop_updates_total_only() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::TikTok, 500, true), 30_000, 0);
        apply_sample(&mut state, &sample(PlatformKind::TikTok, 510, false), 30_000, 0);

        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::TikTok, 490, false),
            30_000,
            0,
        );

        assert_eq!(outcome.time_to_add_ms, 0);
        let stats = &state.platform_stats[&PlatformKind::TikTok];
        assert_eq!(stats.total, 490);
        // No negative credit: session gains stay at 10.
        assert_eq!(stats.session_new, 10);
        assert_eq!(state.totals.total_session_followers, 10);
    }

    #[test]
    fn test_credit_rate_read_at_credit_time() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::Youtube, 100, true), 30_000, 0);

        // The rate changed mid-session; the new rate applies to this credit.
        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 102, false),
            10_000,
            0,
        );
        assert_eq!(outcome.time_to_add_ms, 20_000);
    }

    #[test]
    fn test_goal_fires_once_per_crossing() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::Youtube, 0, true), 30_000, 500);

        // 495 followers: below goal.
        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 495, false),
            30_000,
            500,
        );
        assert!(!outcome.goal_crossed);

        // 495 -> 503 in one credit: exactly one notification.
        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 503, false),
            30_000,
            500,
        );
        assert!(outcome.goal_crossed);
        assert!(state.goal_reached);

        // Further credits above goal fire nothing.
        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 510, false),
            30_000,
            500,
        );
        assert!(!outcome.goal_crossed);
    }

    #[test]
    fn test_goal_zero_never_fires() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::Youtube, 0, true), 30_000, 0);

        let outcome = apply_sample(
            &mut state,
            &sample(PlatformKind::Youtube, 10_000, false),
            30_000,
            0,
        );
        assert!(!outcome.goal_crossed);
        assert!(!state.goal_reached);
    }

    #[test]
    fn test_failure_preserves_progress() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::Instagram, 200, true), 30_000, 0);
        apply_sample(&mut state, &sample(PlatformKind::Instagram, 207, false), 30_000, 0);

        apply_failure(&mut state, PlatformKind::Instagram, "Provider error: boom");

        let stats = &state.platform_stats[&PlatformKind::Instagram];
        assert_eq!(stats.total, 207);
        assert_eq!(stats.session_new, 7);
        assert_eq!(stats.last_error.as_deref(), Some("Provider error: boom"));
        assert_eq!(state.totals.total_session_followers, 7);
    }

    #[test]
    fn test_success_after_failure_clears_error() {
        let mut state = EngineState::default();
        apply_failure(&mut state, PlatformKind::Facebook, "timeout");

        apply_sample(&mut state, &sample(PlatformKind::Facebook, 50, true), 30_000, 0);
        assert!(state.platform_stats[&PlatformKind::Facebook].last_error.is_none());
    }

    #[test]
    fn test_platforms_are_independent() {
        let mut state = EngineState::default();
        apply_sample(&mut state, &sample(PlatformKind::Youtube, 100, true), 30_000, 0);
        apply_sample(&mut state, &sample(PlatformKind::TikTok, 9000, true), 30_000, 0);

        apply_sample(&mut state, &sample(PlatformKind::Youtube, 103, false), 30_000, 0);

        assert_eq!(state.platform_stats[&PlatformKind::Youtube].session_new, 3);
        assert_eq!(state.platform_stats[&PlatformKind::TikTok].session_new, 0);
        assert_eq!(state.platform_stats[&PlatformKind::TikTok].total, 9000);
    }
}
