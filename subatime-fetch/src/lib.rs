// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Subatime Fetch
//!
//! Acquisition infrastructure for the subatime engine.
//!
//! This crate provides everything a per-platform polling job needs to turn
//! a configured source into a raw follower count:
//!
//! ## Browser Session
//!
//! [`browser::BrowserSession`] owns zero-or-one underlying browser
//! (connected to an externally running instance or self-launched) and one
//! page per platform. It survives disconnects through a supervised
//! recovery state machine and exposes [`browser::BrowserSession::read_locator`]
//! as the scrape primitive.
//!
//! ## Strategies
//!
//! - [`strategy::AcquisitionStrategy`] - Trait implemented per acquisition
//!   method, selected once at job start
//! - [`scrape::ScrapeStrategy`] - Generic browser-backed implementation
//!
//! API-backed strategies live in `subatime-platforms`, next to their
//! provider clients.
//!
//! ## Diagnostics
//!
//! [`probe`] runs one-shot locator tests against a throwaway page, so a
//! configuration can be verified without touching live polling state.

pub mod browser;
pub mod error;
pub mod probe;
pub mod scrape;
pub mod strategy;

// Errors
pub use error::{BrowserError, FetchError};

// Browser session
pub use browser::{BrowserSession, BrowserSettings, ConnectionMode, ConnectionState};

// Strategies
pub use scrape::ScrapeStrategy;
pub use strategy::AcquisitionStrategy;

// Diagnostics
pub use probe::ProbeReport;
