//! Per-device prayer scheduling.
//!
//! For each device the scheduler computes today's prayer times, turns the
//! schedulable ones into playback jobs and keeps a refresh job that repeats
//! the process the next day. On days with a UTC-offset change an extra
//! dst-refresh job recomputes the day just before the jump.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use futures::future::{join_all, FutureExt};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use super::clock::{Clock, SystemClock};
use super::config::SchedulerConfig;
use super::state::{
    DeviceScheduleState, ScheduleOptions, ScheduleResult, ScheduleStatus, ScheduledDay,
};
use super::timer::{JobAction, JobInfo, JobKey, NewJob, Timer};
use crate::db::FullRepository;
use crate::error::Result;
use crate::models::method;
use crate::models::{AudioRef, DeviceId, PrayerName};
use crate::services::dst::{detect_transition, local_to_utc};
use crate::services::{DevicePlayer, PrayerTimeEngine};

const MISSING_SETTINGS: &str = "Missing settings for device";

/// Delay before retrying a device whose settings store was unreachable.
const SETTINGS_RETRY_MINUTES: i64 = 5;

/// Schedules prayer playback for every device.
///
/// Cloning is cheap and shares the same job table. Construct one per
/// process with [`DeviceScheduler::builder`], call [`DeviceScheduler::start`]
/// from inside a tokio runtime, and [`DeviceScheduler::shutdown`] on exit.
#[derive(Clone)]
pub struct DeviceScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    repository: Arc<dyn FullRepository>,
    player: Arc<dyn DevicePlayer>,
    timezone: Tz,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    timer: Arc<Timer>,
    device_locks: Mutex<HashMap<DeviceId, Arc<AsyncMutex<()>>>>,
    states: RwLock<HashMap<DeviceId, DeviceScheduleState>>,
}

impl DeviceScheduler {
    /// Create a new scheduler builder.
    pub fn builder(
        repository: Arc<dyn FullRepository>,
        player: Arc<dyn DevicePlayer>,
    ) -> DeviceSchedulerBuilder {
        DeviceSchedulerBuilder::new(repository, player)
    }

    /// Spawn the timer loop on the current tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        let timer = self.inner.timer.clone();
        info!(
            "Starting device scheduler (timezone {}, refresh hour {:02}:00)",
            self.inner.timezone, self.inner.config.refresh_hour
        );
        tokio::spawn(async move { timer.run().await })
    }

    /// Stop the timer loop. Live jobs are kept but no longer fire.
    pub fn shutdown(&self) {
        self.inner.timer.shutdown();
    }

    /// Compute today's times for one device and rebuild its jobs.
    ///
    /// Never fails: every outcome, including collaborator errors, is
    /// reported in the returned [`ScheduleResult`].
    pub async fn schedule_for_device(
        &self,
        device_id: DeviceId,
        options: ScheduleOptions,
    ) -> ScheduleResult {
        self.inner.clone().schedule_device(device_id, options).await
    }

    /// Schedule every known device. Devices are processed concurrently and
    /// one device's failure does not affect the others.
    ///
    /// # Errors
    /// `AdhanError::Repository` if the device list itself cannot be read.
    pub async fn schedule_for_all(&self, options: ScheduleOptions) -> Result<Vec<ScheduleResult>> {
        info!("Scheduling prayer times for all devices");
        let devices = self.inner.repository.list_devices().await?;

        let results = join_all(
            devices
                .iter()
                .map(|device| self.schedule_for_device(device.id, options)),
        )
        .await;

        let failed = results
            .iter()
            .filter(|r| r.status == ScheduleStatus::Error)
            .count();
        info!(
            "Scheduled {} devices ({} with errors)",
            results.len(),
            failed
        );
        Ok(results)
    }

    /// Cancel every job of a device and mark it unscheduled.
    ///
    /// # Returns
    /// Number of jobs cancelled; zero is fine.
    pub async fn clear_device_jobs(&self, device_id: DeviceId) -> usize {
        let lock = self.inner.device_lock(device_id);
        let _guard = lock.lock().await;
        self.inner.clear_device(device_id)
    }

    /// Play the device's configured audio right away.
    pub async fn play_now(&self, device_id: DeviceId) -> ScheduleResult {
        let settings = match self.inner.repository.get_device_settings(device_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => return ScheduleResult::error(device_id, MISSING_SETTINGS),
            Err(e) => {
                error!("Failed to read settings for device {}: {}", device_id, e);
                return ScheduleResult::error(device_id, format!("Settings unavailable: {}", e));
            }
        };
        let Some(audio) = settings.audio else {
            return ScheduleResult::error(device_id, "Audio not found");
        };

        match self.inner.player.play(device_id, &audio, settings.volume).await {
            Ok(()) => ScheduleResult {
                device_id,
                status: ScheduleStatus::Success,
                message: format!("Audio played successfully for device {}", device_id),
                scheduled_prayers: None,
                next_refresh_at: None,
            },
            Err(e) => {
                warn!("Manual playback failed on device {}: {}", device_id, e);
                ScheduleResult::error(device_id, e.to_string())
            }
        }
    }

    /// Live jobs of every device, in fire order.
    pub fn jobs(&self) -> Vec<JobInfo> {
        self.inner.timer.jobs()
    }

    pub fn device_jobs(&self, device_id: DeviceId) -> Vec<JobInfo> {
        self.inner.timer.device_jobs(device_id)
    }

    pub fn device_state(&self, device_id: DeviceId) -> DeviceScheduleState {
        self.inner
            .states
            .read()
            .get(&device_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn timezone(&self) -> Tz {
        self.inner.timezone
    }

    pub fn timer(&self) -> &Arc<Timer> {
        &self.inner.timer
    }
}

impl SchedulerInner {
    fn device_lock(&self, device_id: DeviceId) -> Arc<AsyncMutex<()>> {
        self.device_locks
            .lock()
            .entry(device_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn clear_device(&self, device_id: DeviceId) -> usize {
        let removed = self.timer.remove_device(device_id);
        self.states
            .write()
            .insert(device_id, DeviceScheduleState::Unscheduled);
        debug!("Removed {} jobs for device {}", removed, device_id);
        removed
    }

    async fn schedule_device(
        self: Arc<Self>,
        device_id: DeviceId,
        options: ScheduleOptions,
    ) -> ScheduleResult {
        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;

        let settings = match self.repository.get_device_settings(device_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!("Missing settings for device {}", device_id);
                return ScheduleResult::error(device_id, MISSING_SETTINGS);
            }
            Err(e) => {
                error!("Failed to read settings for device {}: {}", device_id, e);
                if e.is_retryable() {
                    // Keep the device alive: its refresh may be the job running now
                    let retry_at = self.clock.now() + Duration::minutes(SETTINGS_RETRY_MINUTES);
                    info!("Retrying device {} at {}", device_id, retry_at);
                    self.timer.insert(
                        JobKey::refresh(device_id),
                        retry_at,
                        refresh_action(Arc::downgrade(&self), device_id),
                    );
                }
                return ScheduleResult::error(device_id, format!("Settings unavailable: {}", e));
            }
        };

        if !settings.enabled {
            info!("Scheduler is disabled for device {}", device_id);
            self.clear_device(device_id);
            return ScheduleResult::disabled(device_id);
        }

        let Some(view) = settings.schedulable() else {
            info!("Missing settings for device {}: {:?}", device_id, settings);
            return ScheduleResult::error(device_id, MISSING_SETTINGS);
        };

        let method = match method::lookup(view.method) {
            Ok(method) => method,
            Err(e) => {
                warn!("Device {} has an invalid method: {}", device_id, e);
                return ScheduleResult::error(device_id, e.to_string());
            }
        };

        let now = self.clock.now();
        let today = now.with_timezone(&self.timezone).date_naive();
        let engine = PrayerTimeEngine::from_parts(method, view.madhab, self.timezone)
            .with_shafaq(self.config.shafaq);
        let times = match engine.compute(today, view.city.lat, view.city.lon) {
            Ok(times) => times,
            Err(e) => {
                warn!("Cannot compute prayer times for device {}: {}", device_id, e);
                return ScheduleResult::error(device_id, e.to_string());
            }
        };

        let mut jobs: Vec<NewJob> = Vec::new();
        let mut scheduled = BTreeMap::new();
        for (prayer, at) in times.schedulable() {
            let fire_at = at.with_timezone(&Utc);
            if fire_at <= now {
                // Forced passes report the whole day but never replay the past
                if options.force_refresh {
                    debug!("{} at {} already passed (device {})", prayer, at, device_id);
                    scheduled.insert(prayer, at);
                }
                continue;
            }
            let key = JobKey::prayer(device_id, prayer);
            info!("Scheduled {} at {} (device {}) - job id: {}", prayer, at, device_id, key);
            jobs.push((
                key,
                fire_at,
                prayer_action(
                    self.player.clone(),
                    device_id,
                    prayer,
                    view.audio.cloned(),
                    view.volume,
                ),
            ));
            scheduled.insert(prayer, at);
        }

        let weak = Arc::downgrade(&self);
        let next_refresh_at = self.next_refresh_at(now, options);
        jobs.push((
            JobKey::refresh(device_id),
            next_refresh_at,
            refresh_action(weak.clone(), device_id),
        ));
        info!(
            "Next normal refresh at {} (device {})",
            next_refresh_at.with_timezone(&self.timezone),
            device_id
        );

        let dst_refresh_at = match detect_transition(self.timezone, today) {
            Some(transition) if transition.refresh_at > now => {
                info!(
                    "DST change detected in {} around {}. Extra refresh at {} (device {})",
                    self.timezone, transition.transition_at, transition.refresh_at, device_id
                );
                jobs.push((
                    JobKey::dst_refresh(device_id),
                    transition.refresh_at,
                    refresh_action(weak, device_id),
                ));
                Some(transition.refresh_at)
            }
            Some(transition) => {
                debug!(
                    "DST change in {} at {} already passed",
                    self.timezone, transition.transition_at
                );
                None
            }
            None => {
                debug!("No DST change detected in {}", self.timezone);
                None
            }
        };

        let keys: Vec<JobKey> = jobs.iter().map(|(key, _, _)| *key).collect();
        let replaced = self.timer.replace_device_jobs(device_id, jobs);
        debug!("Replaced {} previous jobs for device {}", replaced, device_id);

        self.states.write().insert(
            device_id,
            DeviceScheduleState::Scheduled(ScheduledDay {
                settings: settings.clone(),
                date: today,
                times,
                jobs: keys,
                next_refresh_at,
                dst_refresh_at,
            }),
        );

        if self.config.debug {
            self.log_jobs();
        }

        ScheduleResult::success(
            device_id,
            scheduled,
            next_refresh_at.with_timezone(&self.timezone),
        )
    }

    /// `refresh_hour` local time tomorrow, or now plus the refresh interval.
    fn next_refresh_at(&self, now: DateTime<Utc>, options: ScheduleOptions) -> DateTime<Utc> {
        if let Some(minutes) = options
            .refresh_interval_minutes
            .or(self.config.refresh_interval_minutes)
        {
            // A zero interval would re-fire the refresh at the same instant
            return now + Duration::minutes(i64::from(minutes.max(1)));
        }

        let today = now.with_timezone(&self.timezone).date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        match tomorrow.and_hms_opt(self.config.refresh_hour, 0, 0) {
            Some(local) => local_to_utc(self.timezone, local),
            None => now + Duration::days(1),
        }
    }

    fn log_jobs(&self) {
        let jobs = self.timer.jobs();
        info!("=== Current scheduled jobs ({}) ===", jobs.len());
        for job in jobs {
            info!(
                " - {}: runs at {}",
                job.key,
                job.fire_at.with_timezone(&self.timezone)
            );
        }
    }
}

/// Playback job. Failures are logged and the job counts as fired.
fn prayer_action(
    player: Arc<dyn DevicePlayer>,
    device_id: DeviceId,
    prayer: PrayerName,
    audio: Option<AudioRef>,
    volume: u8,
) -> JobAction {
    Arc::new(move || {
        let player = player.clone();
        let audio = audio.clone();
        async move {
            let Some(audio) = audio else {
                info!("No audio configured for device {}, skipping {}", device_id, prayer);
                return;
            };
            info!(
                "It's time for {} (device {}), playing '{}'",
                prayer, device_id, audio
            );
            if let Err(e) = player.play(device_id, &audio, volume).await {
                warn!("Failed to play {} on device {}: {}", prayer, device_id, e);
            }
        }
        .boxed()
    })
}

/// Refresh job: reruns scheduling for the device with default options.
fn refresh_action(inner: Weak<SchedulerInner>, device_id: DeviceId) -> JobAction {
    Arc::new(move || {
        let inner = inner.clone();
        async move {
            let Some(inner) = inner.upgrade() else {
                debug!("Scheduler dropped, skipping refresh of device {}", device_id);
                return;
            };
            let result = inner
                .schedule_device(device_id, ScheduleOptions::default())
                .await;
            info!(
                "Refreshed device {}: {:?} - {}",
                device_id, result.status, result.message
            );
        }
        .boxed()
    })
}

/// Builder for [`DeviceScheduler`].
pub struct DeviceSchedulerBuilder {
    repository: Arc<dyn FullRepository>,
    player: Arc<dyn DevicePlayer>,
    timezone: Tz,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
}

impl DeviceSchedulerBuilder {
    pub fn new(repository: Arc<dyn FullRepository>, player: Arc<dyn DevicePlayer>) -> Self {
        Self {
            repository,
            player,
            timezone: Tz::UTC,
            config: SchedulerConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Timezone used for "today", job times and the refresh hour.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> DeviceScheduler {
        let timer = Arc::new(Timer::new(self.clock.clone(), self.config.max_sleep));
        DeviceScheduler {
            inner: Arc::new(SchedulerInner {
                repository: self.repository,
                player: self.player,
                timezone: self.timezone,
                config: self.config,
                clock: self.clock,
                timer,
                device_locks: Mutex::new(HashMap::new()),
                states: RwLock::new(HashMap::new()),
            }),
        }
    }
}
