// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Subatime Engine
//!
//! The follower acquisition and timer-crediting engine.
//!
//! This crate coordinates multiple concurrent, independently-configured,
//! independently-failing data sources against the shared browser session
//! and one countdown timer:
//!
//! - [`TimerService`] - countdown clock with pause/resume/add/subtract
//! - [`AcquisitionScheduler`] - one recurring, gateable job per platform
//! - [`crediting`] - baseline/delta/goal semantics turning samples into
//!   timer credit
//! - [`StateStore`] - the observable aggregate other layers broadcast
//! - [`Engine`] - the facade exposing the full command surface
//!
//! ## Failure containment
//!
//! Per-tick failures update a platform's diagnostic fields and nothing
//! else; a transient failure on one platform never corrupts another
//! platform's counters, the session totals, or the timer.
//!
//! ## Ordering
//!
//! All samples and timer events funnel through one unbounded queue into a
//! single-writer run loop: per-platform FIFO, atomic aggregate updates.

pub mod crediting;
pub mod engine;
pub mod events;
pub mod scheduler;
pub mod state;
pub mod timer;

pub use crediting::{apply_failure, apply_sample, CreditOutcome};
pub use engine::{Engine, EngineOptions};
pub use events::AcquisitionEvent;
pub use scheduler::AcquisitionScheduler;
pub use state::{CreditEvent, EngineState, StateStore};
pub use timer::{TimerEvent, TimerService};
