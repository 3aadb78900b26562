//! Scheduler configuration.

use std::time::Duration;

use crate::models::Shafaq;

/// Configuration for the device scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Local hour (0-23) of the next-day refresh.
    pub refresh_hour: u32,
    /// Refresh this many minutes after scheduling instead of at `refresh_hour`.
    pub refresh_interval_minutes: Option<u32>,
    /// Twilight selector handed to the Moonsighting method.
    pub shafaq: Shafaq,
    /// Upper bound on how long the timer sleeps between checks.
    pub max_sleep: Duration,
    /// Log every live job after each scheduling pass.
    pub debug: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_hour: 1,
            refresh_interval_minutes: None,
            shafaq: Shafaq::default(),
            max_sleep: Duration::from_secs(30),
            debug: false,
        }
    }
}

impl SchedulerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refresh hour. Values past 23 are clamped.
    pub fn with_refresh_hour(mut self, hour: u32) -> Self {
        self.refresh_hour = hour.min(23);
        self
    }

    /// Set a fixed refresh interval in minutes. Zero is raised to one.
    pub fn with_refresh_interval_minutes(mut self, minutes: Option<u32>) -> Self {
        self.refresh_interval_minutes = minutes.map(|m| m.max(1));
        self
    }

    pub fn with_shafaq(mut self, shafaq: Shafaq) -> Self {
        self.shafaq = shafaq;
        self
    }

    /// Set the maximum timer sleep.
    pub fn with_max_sleep(mut self, max_sleep: Duration) -> Self {
        self.max_sleep = max_sleep;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
