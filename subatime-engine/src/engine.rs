//! Engine facade.
//!
//! Wires the timer, scheduler, browser session, and state store together
//! and exposes the command surface consumed by transports. All aggregate
//! mutation happens on one run-loop task consuming timer and acquisition
//! events, so concurrent platform credits can never lose updates.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use subatime_core::{PlatformConfig, PlatformKind, TimerSnapshot};
use subatime_fetch::{probe, BrowserError, BrowserSession, FetchError, ProbeReport};
use subatime_platforms::registry;
use subatime_store::{Config, SessionSnapshot};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::crediting;
use crate::events::AcquisitionEvent;
use crate::scheduler::AcquisitionScheduler;
use crate::state::{EngineState, StateStore};
use crate::timer::{TimerEvent, TimerService};

// ============================================================================
// Options
// ============================================================================

/// Engine construction options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Persist the session snapshot and configuration on change.
    pub persist: bool,
}

// ============================================================================
// Engine
// ============================================================================

/// The follower acquisition and timer-crediting engine.
pub struct Engine {
    config: Arc<RwLock<Config>>,
    state: StateStore,
    timer: TimerService,
    scheduler: Arc<AcquisitionScheduler>,
    browser: BrowserSession,
    acq_tx: mpsc::UnboundedSender<AcquisitionEvent>,
    run_task: JoinHandle<()>,
    persist: bool,
}

impl Engine {
    /// Creates an engine with a fresh session and no persistence.
    pub fn new(config: Config) -> Self {
        Self::with_options(config, SessionSnapshot::default(), EngineOptions::default())
    }

    /// Creates an engine restoring a persisted session snapshot.
    pub fn with_options(
        config: Config,
        snapshot: SessionSnapshot,
        options: EngineOptions,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (acq_tx, acq_rx) = mpsc::unbounded_channel();

        let browser = BrowserSession::new(config.browser.clone());
        let timer = TimerService::new(timer_tx);
        let scheduler = Arc::new(AcquisitionScheduler::new(acq_tx.clone()));
        let state = StateStore::new(EngineState::from_persisted(
            snapshot.platform_stats,
            snapshot.totals,
        ));
        let config = Arc::new(RwLock::new(config));

        let run_loop = RunLoop {
            state: state.clone(),
            timer: timer.clone(),
            config: Arc::clone(&config),
            persist: options.persist,
        };
        let run_task = tokio::spawn(run_loop.run(timer_rx, acq_rx));

        Self {
            config,
            state,
            timer,
            scheduler,
            browser,
            acq_tx,
            run_task,
            persist: options.persist,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns a snapshot of the aggregate state.
    pub fn snapshot(&self) -> EngineState {
        self.state.snapshot()
    }

    /// Subscribes to aggregate state changes (best-effort broadcast).
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Returns a copy of the current configuration.
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// The shared browser session.
    pub fn browser(&self) -> &BrowserSession {
        &self.browser
    }

    // ========================================================================
    // Browser
    // ========================================================================

    /// Acquires the shared browser session (connect-first, then launch).
    pub async fn acquire_browser(&self) -> Result<(), BrowserError> {
        self.browser.acquire().await
    }

    // ========================================================================
    // Timer Commands
    // ========================================================================

    /// Starts a countdown and a fresh session: zeroes session counters,
    /// enables acquisition, and starts polling every enabled platform
    /// whose configuration validates. Platforms that fail validation get
    /// the failure recorded against their stats; the rest proceed.
    pub async fn start_timer(&self, duration_ms: Option<u64>) {
        let config = self.config.read().await.clone();
        let duration = duration_ms.unwrap_or(config.initial_time_ms);

        self.state.mutate(|state| {
            state.totals.reset(Some(Utc::now()));
            state.goal_reached = false;
            state.last_credit = None;
            for stats in state.platform_stats.values_mut() {
                stats.total = 0;
                stats.session_new = 0;
            }
        });

        self.timer.start(Duration::from_millis(duration)).await;
        self.scheduler.set_enabled(true);

        for &platform in PlatformKind::all() {
            if !config.platform(platform).enabled {
                continue;
            }
            if let Err(err) = self.start_polling(platform).await {
                warn!(platform = %platform.key(), error = %err, "Skipping platform");
                let _ = self.acq_tx.send(AcquisitionEvent::Failure {
                    platform,
                    message: err.to_string(),
                });
            }
        }
    }

    /// Pauses the countdown and gates acquisition off.
    pub async fn pause_timer(&self) {
        self.timer.pause().await;
        self.scheduler.set_enabled(false);
    }

    /// Resumes the countdown and re-enables acquisition.
    pub async fn resume_timer(&self) {
        self.timer.resume().await;
        self.scheduler.set_enabled(true);
    }

    /// Stops the countdown, all polling jobs, and closes platform pages.
    pub async fn stop_timer(&self) {
        self.timer.stop().await;
        self.scheduler.set_enabled(false);
        self.scheduler.stop_all().await;
        self.browser.close_all_pages().await;
    }

    /// Adds time to an active countdown.
    pub async fn add_time(&self, amount: Duration) {
        self.timer.add_time(amount).await;
    }

    /// Subtracts time from an active countdown, returning the amount
    /// actually removed after clamping.
    pub async fn subtract_time(&self, amount: Duration) -> Duration {
        self.timer.subtract_time(amount).await
    }

    // ========================================================================
    // Acquisition Commands
    // ========================================================================

    /// Enables acquisition ticks without touching schedules.
    pub fn enable_acquisition(&self) {
        self.scheduler.set_enabled(true);
    }

    /// Disables acquisition ticks without destroying schedules.
    pub fn disable_acquisition(&self) {
        self.scheduler.set_enabled(false);
    }

    /// Starts (or restarts) polling for a platform.
    ///
    /// # Errors
    ///
    /// Fails fast with `ConfigIncomplete`/`UnsupportedOperation` before
    /// anything is scheduled when the platform's configuration does not
    /// validate for its selected mode.
    pub async fn start_polling(&self, platform: PlatformKind) -> Result<(), FetchError> {
        let (platform_config, poll_interval_ms) = {
            let config = self.config.read().await;
            (config.platform(platform), config.poll_interval_ms(platform))
        };

        if !platform_config.enabled {
            return Err(FetchError::ConfigIncomplete(format!(
                "{}: platform is disabled",
                platform.key()
            )));
        }

        let strategy = registry::build_strategy(platform, &platform_config, &self.browser)?;
        self.scheduler
            .start_polling(platform, strategy, Duration::from_millis(poll_interval_ms))
            .await;
        Ok(())
    }

    /// Stops polling for a platform. Idempotent; other platforms' jobs and
    /// stats are untouched.
    pub async fn stop_polling(&self, platform: PlatformKind) {
        self.scheduler.stop_polling(platform).await;
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Resets the session: stops the timer and all polling, closes pages,
    /// and zeroes every counter and latch.
    pub async fn reset_session(&self) {
        info!("Resetting session");
        self.timer.stop().await;
        self.scheduler.set_enabled(false);
        self.scheduler.stop_all().await;
        self.browser.close_all_pages().await;

        let state = self.state.mutate(|state| {
            state.totals.reset(None);
            state.goal_reached = false;
            state.last_credit = None;
            for stats in state.platform_stats.values_mut() {
                stats.total = 0;
                stats.session_new = 0;
                stats.last_error = None;
            }
        });
        persist_snapshot(self.persist, &state);
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replaces a platform's configuration, stop-then-restarting its
    /// polling job when one is live so the change takes effect.
    pub async fn update_platform_config(
        &self,
        platform: PlatformKind,
        platform_config: PlatformConfig,
    ) -> Result<(), FetchError> {
        let was_active = self.scheduler.is_active(platform).await;

        {
            let mut config = self.config.write().await;
            config.set_platform(platform, platform_config);
            if self.persist {
                if let Err(err) = config.save() {
                    warn!(error = %err, "Failed to save configuration");
                }
            }
        }

        if was_active {
            self.scheduler.stop_polling(platform).await;
            self.start_polling(platform).await?;
        }
        Ok(())
    }

    /// Applies an arbitrary configuration change.
    pub async fn update_config(&self, f: impl FnOnce(&mut Config)) {
        let mut config = self.config.write().await;
        f(&mut config);
        if self.persist {
            if let Err(err) = config.save() {
                warn!(error = %err, "Failed to save configuration");
            }
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Tests a locator against a throwaway page. Never touches live
    /// polling state or platform statistics.
    pub async fn test_locator(
        &self,
        platform: PlatformKind,
        url: &str,
        locator: &str,
        timeout: Option<Duration>,
    ) -> ProbeReport {
        probe::test_locator(&self.browser, platform, url, locator, timeout).await
    }

    /// Tests a platform's configured API credentials with one live call.
    pub async fn test_api_credentials(&self, platform: PlatformKind) -> ProbeReport {
        let platform_config = self.config.read().await.platform(platform);
        registry::test_api_credentials(platform, &platform_config).await
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Tears everything down: polling, timer, browser, and the run loop.
    pub async fn shutdown(&self) {
        self.scheduler.set_enabled(false);
        self.scheduler.stop_all().await;
        self.timer.stop().await;
        self.browser.shutdown().await;
        tokio::task::yield_now().await;
        self.run_task.abort();
    }
}

// ============================================================================
// Run Loop
// ============================================================================

/// Single writer for all aggregate state.
struct RunLoop {
    state: StateStore,
    timer: TimerService,
    config: Arc<RwLock<Config>>,
    persist: bool,
}

impl RunLoop {
    async fn run(
        self,
        mut timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
        mut acq_rx: mpsc::UnboundedReceiver<AcquisitionEvent>,
    ) {
        loop {
            tokio::select! {
                event = timer_rx.recv() => match event {
                    Some(event) => self.handle_timer_event(event).await,
                    None => break,
                },
                event = acq_rx.recv() => match event {
                    Some(event) => self.handle_acquisition_event(event).await,
                    None => break,
                },
            }
        }
    }

    async fn handle_timer_event(&self, event: TimerEvent) {
        match event {
            TimerEvent::Tick { remaining_ms } => {
                // Ticks only refresh the derived projection; no
                // persistence churn at 100 ms cadence.
                self.state.mutate(|state| state.timer.remaining_ms = remaining_ms);
            }
            TimerEvent::Started { remaining_ms } => {
                let state = self.state.mutate(|state| {
                    state.timer = TimerSnapshot {
                        remaining_ms,
                        is_running: true,
                        is_paused: false,
                    };
                    if state.totals.session_start.is_none() {
                        state.totals.session_start = Some(Utc::now());
                    }
                });
                persist_snapshot(self.persist, &state);
            }
            TimerEvent::Paused { remaining_ms } => {
                let state = self.state.mutate(|state| {
                    state.timer.remaining_ms = remaining_ms;
                    state.timer.is_paused = true;
                });
                persist_snapshot(self.persist, &state);
            }
            TimerEvent::Resumed { remaining_ms } => {
                let state = self.state.mutate(|state| {
                    state.timer.remaining_ms = remaining_ms;
                    state.timer.is_paused = false;
                });
                persist_snapshot(self.persist, &state);
            }
            TimerEvent::Stopped => {
                let state = self.state.mutate(|state| state.timer = TimerSnapshot::STOPPED);
                persist_snapshot(self.persist, &state);
            }
            TimerEvent::TimeAdded { amount_ms } => {
                let state = self.state.mutate(|state| {
                    state.totals.total_session_time_added_ms += amount_ms as i64;
                });
                persist_snapshot(self.persist, &state);
            }
            TimerEvent::TimeSubtracted { actual_ms, .. } => {
                let state = self.state.mutate(|state| {
                    state.totals.total_session_time_added_ms -= actual_ms as i64;
                });
                persist_snapshot(self.persist, &state);
            }
        }
    }

    async fn handle_acquisition_event(&self, event: AcquisitionEvent) {
        match event {
            AcquisitionEvent::Sample(sample) => {
                // Credit at the rate in effect right now, not the rate when
                // the polling interval began.
                let (time_per_follower_ms, goal) = {
                    let config = self.config.read().await;
                    (config.time_per_follower_ms, config.goal)
                };

                let mut outcome = crediting::CreditOutcome::default();
                let state = self.state.mutate(|state| {
                    outcome = crediting::apply_sample(state, &sample, time_per_follower_ms, goal);
                });

                if outcome.time_to_add_ms > 0 {
                    self.timer
                        .add_time(Duration::from_millis(outcome.time_to_add_ms))
                        .await;
                }
                persist_snapshot(self.persist, &state);
            }
            AcquisitionEvent::Failure { platform, message } => {
                let state = self
                    .state
                    .mutate(|state| crediting::apply_failure(state, platform, &message));
                persist_snapshot(self.persist, &state);
            }
        }
    }
}

/// Fire-and-forget session snapshot save.
fn persist_snapshot(persist: bool, state: &EngineState) {
    if !persist {
        return;
    }

    let snapshot = SessionSnapshot {
        platform_stats: state.platform_stats.clone(),
        totals: state.totals.clone(),
        timer_remaining_ms: state.timer.remaining_ms,
    };
    tokio::spawn(async move {
        if let Err(err) = subatime_store::save_session(&snapshot).await {
            warn!(error = %err, "Failed to persist session snapshot");
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
