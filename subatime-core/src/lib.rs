// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Subatime Core
//!
//! Core types and models for the subatime engine.
//!
//! This crate provides the foundational abstractions used across all other
//! subatime crates:
//!
//! - Platform types ([`PlatformKind`], [`AcquisitionMode`], [`SampleSource`])
//! - Follower samples ([`FollowerSample`]) as produced by acquisition jobs
//! - Aggregate statistics ([`PlatformStats`], [`SessionTotals`])
//! - Timer state projection ([`TimerSnapshot`])
//! - The core error type ([`CoreError`])
//!
//! All models are serde-serializable so the state store can be snapshotted,
//! persisted, and broadcast without translation layers.

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Platform types
    AcquisitionMode,
    PlatformKind,
    SampleSource,
    // Configuration
    PlatformConfig,
    // Samples
    FollowerSample,
    // Aggregates
    PlatformStats,
    SessionTotals,
    // Timer
    TimerSnapshot,
};
