//! Domain models for subatime.
//!
//! This module contains the value types flowing through the engine:
//!
//! - [`PlatformKind`] - Enum of tracked social platforms
//! - [`AcquisitionMode`] / [`SampleSource`] - How counts are obtained
//! - [`PlatformConfig`] - Per-platform acquisition configuration
//! - [`FollowerSample`] - One observed follower count
//! - [`PlatformStats`] / [`SessionTotals`] - Accumulated session state
//! - [`TimerSnapshot`] - Serializable projection of the countdown timer

mod config;
mod platform;
mod sample;
mod stats;
mod timer;

pub use config::PlatformConfig;
pub use platform::{AcquisitionMode, PlatformKind, SampleSource};
pub use sample::FollowerSample;
pub use stats::{PlatformStats, SessionTotals};
pub use timer::TimerSnapshot;
