//! Per-device scheduling state and scheduling outcomes.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::timer::JobKey;
use crate::models::{DeviceId, DeviceSettings, PrayerName, PrayerTimeSet};

/// What the scheduler currently holds for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DeviceScheduleState {
    /// No live jobs.
    #[default]
    Unscheduled,
    /// Today's prayer jobs plus a refresh are live.
    Scheduled(ScheduledDay),
}

impl DeviceScheduleState {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, DeviceScheduleState::Scheduled(_))
    }

    pub fn scheduled_day(&self) -> Option<&ScheduledDay> {
        match self {
            DeviceScheduleState::Scheduled(day) => Some(day),
            DeviceScheduleState::Unscheduled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledDay {
    /// Settings the jobs were built from.
    pub settings: DeviceSettings,
    /// Local date the prayer times belong to.
    pub date: NaiveDate,
    pub times: PrayerTimeSet,
    /// Keys of every job created by this pass, refreshes included.
    pub jobs: Vec<JobKey>,
    pub next_refresh_at: DateTime<Utc>,
    pub dst_refresh_at: Option<DateTime<Utc>>,
}

/// Options for one scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// Refresh after this many minutes instead of the next-day refresh hour.
    pub refresh_interval_minutes: Option<u32>,
    /// Schedule prayers whose time has already passed today.
    pub force_refresh: bool,
}

impl ScheduleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh after `minutes` (at least one) instead of the next day.
    pub fn with_refresh_interval(mut self, minutes: u32) -> Self {
        self.refresh_interval_minutes = Some(minutes.max(1));
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Success,
    Disabled,
    Error,
}

/// Outcome of scheduling one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub device_id: DeviceId,
    pub status: ScheduleStatus,
    pub message: String,
    /// Prayer jobs created by this pass, keyed by prayer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_prayers: Option<BTreeMap<PrayerName, DateTime<Tz>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_refresh_at: Option<DateTime<Tz>>,
}

impl ScheduleResult {
    pub fn success(
        device_id: DeviceId,
        scheduled_prayers: BTreeMap<PrayerName, DateTime<Tz>>,
        next_refresh_at: DateTime<Tz>,
    ) -> Self {
        Self {
            device_id,
            status: ScheduleStatus::Success,
            message: format!(
                "Prayers scheduled successfully for device {}. Next refresh at {}.",
                device_id, next_refresh_at
            ),
            scheduled_prayers: Some(scheduled_prayers),
            next_refresh_at: Some(next_refresh_at),
        }
    }

    pub fn disabled(device_id: DeviceId) -> Self {
        Self {
            device_id,
            status: ScheduleStatus::Disabled,
            message: "Scheduler is disabled".to_string(),
            scheduled_prayers: None,
            next_refresh_at: None,
        }
    }

    pub fn error(device_id: DeviceId, message: impl Into<String>) -> Self {
        Self {
            device_id,
            status: ScheduleStatus::Error,
            message: message.into(),
            scheduled_prayers: None,
            next_refresh_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScheduleStatus::Success
    }
}
