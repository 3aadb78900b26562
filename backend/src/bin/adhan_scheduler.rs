//! Adhan Scheduler Daemon
//!
//! Loads devices and defaults from `adhan.toml`, schedules today's prayers
//! for every device and keeps running until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Use ./adhan.toml (or backend/adhan.toml, ../adhan.toml)
//! cargo run --bin adhan-scheduler
//!
//! # Explicit config file and verbose logging
//! ADHAN_CONFIG=/etc/adhan.toml RUST_LOG=debug cargo run --bin adhan-scheduler
//! ```
//!
//! # Environment Variables
//!
//! - `ADHAN_CONFIG`: Path to the configuration file
//! - `ADHAN_METHOD`, `ADHAN_MADHAB`, `ADHAN_TIMEZONE`, `ADHAN_REFRESH_HOUR`,
//!   `ADHAN_DEBUG`: Override the matching config values
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use adhan_rust::config::{AppConfig, CONFIG_PATH_ENV};
use adhan_rust::db::LocalRepository;
use adhan_rust::scheduler::{DeviceScheduler, ScheduleOptions, ScheduleStatus};
use adhan_rust::services::LoggingPlayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting adhan scheduler");

    let mut config = load_config()?;
    config.apply_env()?;

    let timezone = config.resolve_timezone()?;
    let repository = Arc::new(LocalRepository::from_entries(config.device_entries()));
    info!(
        "Loaded {} devices (timezone {})",
        repository.device_count(),
        timezone
    );

    let scheduler = DeviceScheduler::builder(repository, Arc::new(LoggingPlayer))
        .with_timezone(timezone)
        .with_config(config.scheduler_config())
        .build();
    let handle = scheduler.start();

    for result in scheduler.schedule_for_all(ScheduleOptions::new()).await? {
        match result.status {
            ScheduleStatus::Error => warn!("Device {}: {}", result.device_id, result.message),
            _ => info!("Device {}: {}", result.device_id, result.message),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    scheduler.shutdown();
    handle.await?;

    Ok(())
}

fn load_config() -> anyhow::Result<AppConfig> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        info!("Loading configuration from {}", path);
        return Ok(AppConfig::from_file(&path)?);
    }
    match AppConfig::from_default_location()? {
        Some(config) => Ok(config),
        None => {
            warn!("No adhan.toml found, running with defaults and no devices");
            Ok(AppConfig::default())
        }
    }
}
