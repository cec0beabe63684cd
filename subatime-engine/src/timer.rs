//! Countdown timer service.
//!
//! The timer knows nothing about followers. It owns an authoritative
//! deadline and a 100 ms tick loop that refreshes the derived remaining
//! time, auto-stopping at zero. State machine:
//! `Stopped → Running ⇄ Paused → Stopped`, with `Stopped` initial.
//!
//! All operations are no-ops outside their preconditions: `start` while
//! running, `pause` unless running and unpaused, `resume` unless paused,
//! and `add_time`/`subtract_time` while stopped.

use std::sync::Arc;
use std::time::Duration;

use subatime_core::TimerSnapshot;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Tick granularity for refreshing the remaining-time projection.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Timer Events
// ============================================================================

/// Event emitted by the timer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The countdown started.
    Started {
        /// Milliseconds on the clock at start.
        remaining_ms: u64,
    },
    /// Periodic remaining-time refresh.
    Tick {
        /// Milliseconds remaining.
        remaining_ms: u64,
    },
    /// The countdown paused, freezing the remaining time.
    Paused {
        /// Milliseconds frozen on the clock.
        remaining_ms: u64,
    },
    /// The countdown resumed from a pause.
    Resumed {
        /// Milliseconds remaining at resume.
        remaining_ms: u64,
    },
    /// The countdown stopped (explicitly or by reaching zero).
    Stopped,
    /// Time was credited onto the clock.
    TimeAdded {
        /// Milliseconds added.
        amount_ms: u64,
    },
    /// Time was removed from the clock.
    TimeSubtracted {
        /// Milliseconds requested.
        requested_ms: u64,
        /// Milliseconds actually subtracted after clamping.
        actual_ms: u64,
    },
}

// ============================================================================
// Timer Service
// ============================================================================

struct TimerInner {
    running: bool,
    paused: bool,
    /// Authoritative deadline while running and unpaused.
    target_end: Instant,
    /// Remaining time frozen by `pause`.
    frozen_remaining: Duration,
    tick_task: Option<JoinHandle<()>>,
}

impl TimerInner {
    fn remaining(&self) -> Duration {
        if !self.running {
            Duration::ZERO
        } else if self.paused {
            self.frozen_remaining
        } else {
            self.target_end.saturating_duration_since(Instant::now())
        }
    }
}

/// Countdown timer with pause/resume/add/subtract operations.
///
/// Cheap to clone; clones share the same underlying clock.
#[derive(Clone)]
pub struct TimerService {
    inner: Arc<Mutex<TimerInner>>,
    events: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerService {
    /// Creates a stopped timer emitting events into `events`.
    pub fn new(events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimerInner {
                running: false,
                paused: false,
                target_end: Instant::now(),
                frozen_remaining: Duration::ZERO,
                tick_task: None,
            })),
            events,
        }
    }

    /// Returns the current timer projection.
    pub async fn snapshot(&self) -> TimerSnapshot {
        let inner = self.inner.lock().await;
        TimerSnapshot {
            remaining_ms: duration_ms(inner.remaining()),
            is_running: inner.running,
            is_paused: inner.paused,
        }
    }

    /// Starts a countdown. No-op if one is already active.
    pub async fn start(&self, duration: Duration) {
        let mut inner = self.inner.lock().await;
        if inner.running {
            return;
        }

        inner.running = true;
        inner.paused = false;
        inner.target_end = Instant::now() + duration;
        inner.tick_task = Some(self.spawn_tick_loop());

        info!(duration_ms = duration_ms(duration), "Timer started");
        let _ = self.events.send(TimerEvent::Started {
            remaining_ms: duration_ms(duration),
        });
    }

    /// Freezes the countdown. No-op unless running and not paused.
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.running || inner.paused {
            return;
        }

        inner.frozen_remaining = inner.target_end.saturating_duration_since(Instant::now());
        inner.paused = true;
        if let Some(task) = inner.tick_task.take() {
            task.abort();
        }

        debug!(remaining_ms = duration_ms(inner.frozen_remaining), "Timer paused");
        let _ = self.events.send(TimerEvent::Paused {
            remaining_ms: duration_ms(inner.frozen_remaining),
        });
    }

    /// Resumes a paused countdown. No-op unless running and paused.
    pub async fn resume(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.running || !inner.paused {
            return;
        }

        inner.target_end = Instant::now() + inner.frozen_remaining;
        inner.paused = false;
        inner.tick_task = Some(self.spawn_tick_loop());

        debug!(remaining_ms = duration_ms(inner.frozen_remaining), "Timer resumed");
        let _ = self.events.send(TimerEvent::Resumed {
            remaining_ms: duration_ms(inner.frozen_remaining),
        });
    }

    /// Stops the countdown. No-op if already stopped.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.running {
            return;
        }
        Self::stop_locked(&mut inner, &self.events);
    }

    /// Adds time to an active countdown. No-op while stopped.
    pub async fn add_time(&self, amount: Duration) {
        let mut inner = self.inner.lock().await;
        if !inner.running {
            return;
        }

        if inner.paused {
            inner.frozen_remaining += amount;
        } else {
            inner.target_end += amount;
        }

        let _ = self.events.send(TimerEvent::TimeAdded {
            amount_ms: duration_ms(amount),
        });
        // Reflect the new deadline immediately rather than waiting a tick.
        let _ = self.events.send(TimerEvent::Tick {
            remaining_ms: duration_ms(inner.remaining()),
        });
    }

    /// Subtracts time from an active countdown, clamping so the deadline
    /// never moves before now. Returns the amount actually subtracted,
    /// which may be less than requested. No-op (returning 0) while stopped.
    pub async fn subtract_time(&self, amount: Duration) -> Duration {
        let mut inner = self.inner.lock().await;
        if !inner.running {
            return Duration::ZERO;
        }

        let actual = if inner.paused {
            let actual = inner.frozen_remaining.min(amount);
            inner.frozen_remaining -= actual;
            actual
        } else {
            let previous = inner.target_end;
            let remaining = previous.saturating_duration_since(Instant::now());
            let actual = remaining.min(amount);
            inner.target_end = previous - actual;
            actual
        };

        let _ = self.events.send(TimerEvent::TimeSubtracted {
            requested_ms: duration_ms(amount),
            actual_ms: duration_ms(actual),
        });

        let remaining = inner.remaining();
        let _ = self.events.send(TimerEvent::Tick {
            remaining_ms: duration_ms(remaining),
        });
        if remaining.is_zero() {
            Self::stop_locked(&mut inner, &self.events);
        }

        actual
    }

    fn stop_locked(inner: &mut TimerInner, events: &mpsc::UnboundedSender<TimerEvent>) {
        inner.running = false;
        inner.paused = false;
        inner.frozen_remaining = Duration::ZERO;
        if let Some(task) = inner.tick_task.take() {
            task.abort();
        }

        info!("Timer stopped");
        let _ = events.send(TimerEvent::Stopped);
    }

    /// Refreshes the remaining-time projection every tick and auto-stops
    /// at zero.
    fn spawn_tick_loop(&self) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let mut inner = service.inner.lock().await;
                if !inner.running || inner.paused {
                    break;
                }

                let remaining = inner.remaining();
                let _ = service.events.send(TimerEvent::Tick {
                    remaining_ms: duration_ms(remaining),
                });

                if remaining.is_zero() {
                    Self::stop_locked(&mut inner, &service.events);
                    break;
                }
            }
        })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
