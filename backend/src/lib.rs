//! # Adhan Rust
//!
//! Islamic prayer-time computation and per-device adhan scheduling.
//!
//! The crate computes daily prayer times for a location from solar
//! position, under any of the registered calculation methods, and drives a
//! scheduler that plays the adhan on audio devices at each prayer.
//!
//! ## Features
//!
//! - **Prayer Times**: Fajr through Isha plus Imsak, Midnight and the night
//!   thirds, for a day, a month or a year
//! - **Calculation Methods**: angle-based, interval-based and the
//!   Moonsighting Committee seasonal estimator
//! - **Hijri Calendar**: tabular Islamic date for any Gregorian date
//! - **Device Scheduling**: timer-driven playback jobs with daily refresh
//!   and corrective refresh around daylight-saving transitions
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Public functions and DTOs for prayer-time queries
//! - [`astro`]: Solar ephemeris, twilight estimator and Hijri calendar
//! - [`models`]: Prayer names, methods, device settings
//! - [`services`]: Prayer-time engine, DST detection and playback
//! - [`scheduler`]: Timer and per-device scheduler
//! - [`db`]: Repository traits and the in-memory repository
//! - [`config`]: TOML configuration with environment overrides

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod astro;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod services;

pub use error::{AdhanError, Result};
