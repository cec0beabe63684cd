// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Subatime Store
//!
//! Configuration and persistence for the subatime engine.
//!
//! This crate provides:
//!
//! - **Config**: the full application configuration (per-platform
//!   acquisition settings, browser session settings, polling cadence,
//!   credit rate, goal) with JSON load/save
//! - **Persistence**: atomic JSON file helpers and the [`SessionSnapshot`]
//!   saved across restarts
//!
//! ## Usage
//!
//! ```ignore
//! use subatime_store::{Config, SessionSnapshot};
//!
//! let config = Config::load()?;
//! let snapshot = subatime_store::load_session_or_default().await;
//! ```

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{Config, PollingConfig};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, default_session_path, load_json,
    load_json_or_default, load_session_or_default, save_json, save_session, SessionSnapshot,
};
