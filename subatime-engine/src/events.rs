//! Acquisition events flowing from jobs to the engine.
//!
//! Every job sends into one unbounded queue consumed by the engine's
//! single-writer run loop, which gives per-platform FIFO ordering for free
//! (cross-platform ordering is unconstrained).

use subatime_core::{FollowerSample, PlatformKind};

/// Event emitted by an acquisition job tick.
#[derive(Debug, Clone)]
pub enum AcquisitionEvent {
    /// A fetch succeeded and produced a sample.
    Sample(FollowerSample),
    /// A fetch failed; the platform's job keeps ticking.
    Failure {
        /// The platform whose tick failed.
        platform: PlatformKind,
        /// Human-readable failure description.
        message: String,
    },
}
