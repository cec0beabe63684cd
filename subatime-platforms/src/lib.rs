// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Subatime Platforms
//!
//! Per-platform follower-count acquisition for the subatime engine.
//!
//! Each platform module provides its provider API client (where the
//! platform has one) and the API-backed [`AcquisitionStrategy`]
//! implementation built from a platform's configuration:
//!
//! - [`youtube`] - YouTube Data API v3 (`channels?part=statistics`)
//! - [`instagram`] - Graph API `followers_count`
//! - [`facebook`] - Graph API `fan_count`
//!
//! TikTok has no provider API and is scrape-only; requesting API mode for
//! it fails with `UnsupportedOperation`.
//!
//! [`build_strategy`] is the single entry point used by the scheduler: it
//! validates the configuration for the selected mode (failing fast with
//! `ConfigIncomplete` before anything is scheduled) and returns the boxed
//! strategy that every subsequent tick invokes.
//!
//! [`AcquisitionStrategy`]: subatime_fetch::AcquisitionStrategy

pub mod facebook;
mod graph;
pub mod instagram;
pub mod registry;
pub mod youtube;

pub use facebook::FacebookApiClient;
pub use instagram::InstagramApiClient;
pub use registry::{build_strategy, test_api_credentials};
pub use youtube::YoutubeApiClient;
