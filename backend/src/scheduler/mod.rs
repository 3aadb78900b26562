//! Device scheduling.
//!
//! [`DeviceScheduler`] owns a [`Timer`] holding every live job. Each device
//! gets one job per upcoming schedulable prayer, a daily refresh and, on
//! days with a UTC-offset change, a dst-refresh.

pub mod clock;
pub mod config;
pub mod device_scheduler;
pub mod state;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use device_scheduler::{DeviceScheduler, DeviceSchedulerBuilder};
pub use state::{
    DeviceScheduleState, ScheduleOptions, ScheduleResult, ScheduleStatus, ScheduledDay,
};
pub use timer::{JobAction, JobInfo, JobKey, JobKind, NewJob, Timer};
