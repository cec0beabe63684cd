//! Acquisition scheduler.
//!
//! One recurring job per enabled platform. Each job owns its strategy
//! (selected once at start), performs an immediate first fetch, then ticks
//! at the configured interval. A failing tick never cancels its own future
//! ticks nor touches other platforms' jobs.
//!
//! The global gate pauses work without destroying schedules: gated ticks
//! are inert, so re-enabling acquisition needs no re-registration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use subatime_core::{FollowerSample, PlatformKind};
use subatime_fetch::AcquisitionStrategy;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::events::AcquisitionEvent;

// ============================================================================
// Scheduler
// ============================================================================

/// Runs one recurring acquisition job per platform.
pub struct AcquisitionScheduler {
    events: mpsc::UnboundedSender<AcquisitionEvent>,
    enabled: Arc<AtomicBool>,
    jobs: Mutex<HashMap<PlatformKind, JoinHandle<()>>>,
}

impl AcquisitionScheduler {
    /// Creates a scheduler emitting into `events`. Acquisition starts
    /// disabled; schedules can still be registered.
    pub fn new(events: mpsc::UnboundedSender<AcquisitionEvent>) -> Self {
        Self {
            events,
            enabled: Arc::new(AtomicBool::new(false)),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Gates whether ticks perform work. Schedules stay armed either way.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "Acquisition gate updated");
    }

    /// Returns whether acquisition is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Starts (or restarts) the polling job for a platform.
    ///
    /// Any prior job for the platform is stopped first, so at most one job
    /// per platform is ever active and its baseline is freshly reset.
    pub async fn start_polling(
        &self,
        platform: PlatformKind,
        strategy: Box<dyn AcquisitionStrategy>,
        poll_interval: Duration,
    ) {
        let mut jobs = self.jobs.lock().await;

        if let Some(previous) = jobs.remove(&platform) {
            debug!(platform = %platform.key(), "Replacing existing job");
            previous.abort();
        }

        let task = tokio::spawn(run_job(
            platform,
            strategy,
            poll_interval,
            Arc::clone(&self.enabled),
            self.events.clone(),
        ));
        jobs.insert(platform, task);

        info!(
            platform = %platform.key(),
            interval_ms = poll_interval.as_millis() as u64,
            "Polling started"
        );
    }

    /// Stops the polling job for a platform. Idempotent.
    pub async fn stop_polling(&self, platform: PlatformKind) {
        if let Some(task) = self.jobs.lock().await.remove(&platform) {
            task.abort();
            info!(platform = %platform.key(), "Polling stopped");
        }
    }

    /// Stops every polling job.
    pub async fn stop_all(&self) {
        let mut jobs = self.jobs.lock().await;
        for (platform, task) in jobs.drain() {
            task.abort();
            debug!(platform = %platform.key(), "Polling stopped");
        }
    }

    /// Returns true if a job is registered for the platform.
    pub async fn is_active(&self, platform: PlatformKind) -> bool {
        self.jobs
            .lock()
            .await
            .get(&platform)
            .is_some_and(|task| !task.is_finished())
    }

    /// Returns the platforms with registered jobs.
    pub async fn active_platforms(&self) -> Vec<PlatformKind> {
        self.jobs.lock().await.keys().copied().collect()
    }
}

/// One platform's polling loop: immediate first fetch, then gated ticks.
async fn run_job(
    platform: PlatformKind,
    strategy: Box<dyn AcquisitionStrategy>,
    poll_interval: Duration,
    enabled: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<AcquisitionEvent>,
) {
    let mut baseline_captured = false;
    let mut first = true;

    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // The immediate first fetch always runs; recurring ticks are inert
        // while acquisition is gated off.
        if !first && !enabled.load(Ordering::SeqCst) {
            continue;
        }
        first = false;

        match strategy.fetch().await {
            Ok(count) => {
                let is_initial = !baseline_captured;
                baseline_captured = true;
                debug!(
                    platform = %platform.key(),
                    count,
                    is_initial,
                    "Fetched follower count"
                );
                let sample = FollowerSample::new(platform, count, strategy.source(), is_initial);
                if events.send(AcquisitionEvent::Sample(sample)).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!(platform = %platform.key(), error = %err, "Fetch failed");
                let failure = AcquisitionEvent::Failure {
                    platform,
                    message: err.to_string(),
                };
                if events.send(failure).is_err() {
                    return;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU64;
    use subatime_core::SampleSource;
    use subatime_fetch::FetchError;

    /// Returns 1000, 1005, 1010, ... on successive fetches.
    struct SteppingStrategy {
        platform: PlatformKind,
        calls: AtomicU64,
    }

    impl SteppingStrategy {
        fn new(platform: PlatformKind) -> Self {
            Self {
                platform,
                calls: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl AcquisitionStrategy for SteppingStrategy {
        fn platform(&self) -> PlatformKind {
            self.platform
        }

        fn source(&self) -> SampleSource {
            SampleSource::Api
        }

        async fn fetch(&self) -> Result<u64, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1000 + call * 5)
        }
    }

    struct FailingStrategy;

    #[async_trait]
    impl AcquisitionStrategy for FailingStrategy {
        fn platform(&self) -> PlatformKind {
            PlatformKind::Instagram
        }

        fn source(&self) -> SampleSource {
            SampleSource::Scrape
        }

        async fn fetch(&self) -> Result<u64, FetchError> {
            Err(FetchError::Upstream("mock outage".to_string()))
        }
    }

    fn scheduler() -> (
        AcquisitionScheduler,
        mpsc::UnboundedReceiver<AcquisitionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = AcquisitionScheduler::new(tx);
        scheduler.set_enabled(true);
        (scheduler, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_sample_is_initial_then_not() {
        let (scheduler, mut rx) = scheduler();
        scheduler
            .start_polling(
                PlatformKind::Youtube,
                Box::new(SteppingStrategy::new(PlatformKind::Youtube)),
                Duration::from_secs(10),
            )
            .await;

        let AcquisitionEvent::Sample(first) = rx.recv().await.unwrap() else {
            panic!("expected a sample");
        };
        assert!(first.is_initial);
        assert_eq!(first.count, 1000);

        let AcquisitionEvent::Sample(second) = rx.recv().await.unwrap() else {
            panic!("expected a sample");
        };
        assert!(!second.is_initial);
        assert_eq!(second.count, 1005);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_the_schedule_alive() {
        let (scheduler, mut rx) = scheduler();
        scheduler
            .start_polling(
                PlatformKind::Instagram,
                Box::new(FailingStrategy),
                Duration::from_secs(10),
            )
            .await;

        for _ in 0..3 {
            match rx.recv().await.unwrap() {
                AcquisitionEvent::Failure { platform, message } => {
                    assert_eq!(platform, PlatformKind::Instagram);
                    assert!(message.contains("mock outage"));
                }
                AcquisitionEvent::Sample(_) => panic!("expected failures only"),
            }
        }
        assert!(scheduler.is_active(PlatformKind::Instagram).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_pauses_without_destroying_schedule() {
        let (scheduler, mut rx) = scheduler();
        scheduler
            .start_polling(
                PlatformKind::Youtube,
                Box::new(SteppingStrategy::new(PlatformKind::Youtube)),
                Duration::from_secs(10),
            )
            .await;

        // Initial fetch goes through.
        assert!(rx.recv().await.is_some());

        scheduler.set_enabled(false);
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert!(rx.try_recv().is_err(), "gated ticks must be inert");

        // Resuming needs no re-registration.
        scheduler.set_enabled(true);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopping_one_platform_leaves_the_other() {
        let (scheduler, mut rx) = scheduler();
        scheduler
            .start_polling(
                PlatformKind::Youtube,
                Box::new(SteppingStrategy::new(PlatformKind::Youtube)),
                Duration::from_secs(10),
            )
            .await;
        scheduler
            .start_polling(
                PlatformKind::TikTok,
                Box::new(SteppingStrategy::new(PlatformKind::TikTok)),
                Duration::from_secs(10),
            )
            .await;

        scheduler.stop_polling(PlatformKind::Youtube).await;
        // Stopping again is idempotent.
        scheduler.stop_polling(PlatformKind::Youtube).await;

        assert!(!scheduler.is_active(PlatformKind::Youtube).await);
        assert!(scheduler.is_active(PlatformKind::TikTok).await);

        // Discard anything queued before the stop; everything arriving
        // afterwards must belong to TikTok.
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(25)).await;

        let mut saw_tiktok = false;
        while let Ok(event) = rx.try_recv() {
            if let AcquisitionEvent::Sample(sample) = event {
                assert_eq!(sample.platform, PlatformKind::TikTok);
                saw_tiktok = true;
            }
        }
        assert!(saw_tiktok);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_baseline() {
        let (scheduler, mut rx) = scheduler();
        scheduler
            .start_polling(
                PlatformKind::Youtube,
                Box::new(SteppingStrategy::new(PlatformKind::Youtube)),
                Duration::from_secs(10),
            )
            .await;

        let AcquisitionEvent::Sample(first) = rx.recv().await.unwrap() else {
            panic!("expected a sample");
        };
        assert!(first.is_initial);

        // Restarting replaces the job and re-captures the baseline.
        scheduler
            .start_polling(
                PlatformKind::Youtube,
                Box::new(SteppingStrategy::new(PlatformKind::Youtube)),
                Duration::from_secs(10),
            )
            .await;
        assert_eq!(scheduler.active_platforms().await.len(), 1);

        // Skip anything the aborted job already queued.
        let mut restarted = None;
        while restarted.is_none() {
            match rx.recv().await.unwrap() {
                AcquisitionEvent::Sample(sample) if sample.is_initial && sample.count == 1000 => {
                    restarted = Some(sample);
                }
                _ => {}
            }
        }
    }
}
