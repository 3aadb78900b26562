//! One-shot job timer.
//!
//! Jobs are keyed by [`JobKey`]; inserting an existing key replaces the
//! previous job. Pending fire times live in a min-heap next to the job table.
//! Replacing or cancelling a job leaves its heap entry behind, and such stale
//! entries are skipped by sequence number when they surface.
//!
//! A job leaves the table under the lock at the moment it is dispatched, so a
//! job is either cancelled or fired, never both.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::{debug, error, info};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use tokio::sync::Notify;

use super::clock::Clock;
use crate::models::{DeviceId, PrayerName};

/// Work run when a job fires. Called at most once per insertion.
pub type JobAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Heap entries beyond `2 * live + COMPACT_SLACK` trigger a rebuild.
const COMPACT_SLACK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    Prayer(PrayerName),
    Refresh,
    DstRefresh,
}

/// Identity of a job: at most one live job per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub device_id: DeviceId,
    pub kind: JobKind,
}

impl JobKey {
    pub fn prayer(device_id: DeviceId, prayer: PrayerName) -> Self {
        Self {
            device_id,
            kind: JobKind::Prayer(prayer),
        }
    }

    pub fn refresh(device_id: DeviceId) -> Self {
        Self {
            device_id,
            kind: JobKind::Refresh,
        }
    }

    pub fn dst_refresh(device_id: DeviceId) -> Self {
        Self {
            device_id,
            kind: JobKind::DstRefresh,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JobKind::Prayer(prayer) => write!(f, "device_{}_{}", self.device_id, prayer),
            JobKind::Refresh => write!(f, "refresh_device_{}", self.device_id),
            JobKind::DstRefresh => write!(f, "dst_refresh_device_{}", self.device_id),
        }
    }
}

impl Serialize for JobKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Snapshot of a live job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub key: JobKey,
    pub fire_at: DateTime<Utc>,
}

/// A job to insert: key, fire time and action.
pub type NewJob = (JobKey, DateTime<Utc>, JobAction);

struct Job {
    seq: u64,
    fire_at: DateTime<Utc>,
    action: JobAction,
}

#[derive(Default)]
struct TimerState {
    jobs: HashMap<JobKey, Job>,
    queue: BinaryHeap<Reverse<(DateTime<Utc>, u64, JobKey)>>,
    next_seq: u64,
}

impl TimerState {
    /// Returns `true` when an existing job was replaced.
    fn insert(&mut self, key: JobKey, fire_at: DateTime<Utc>, action: JobAction) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((fire_at, seq, key)));
        self.jobs
            .insert(key, Job { seq, fire_at, action })
            .is_some()
    }

    fn is_live(&self, seq: u64, key: &JobKey) -> bool {
        self.jobs.get(key).is_some_and(|job| job.seq == seq)
    }

    fn remove_device(&mut self, device_id: DeviceId) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|key, _| key.device_id != device_id);
        before - self.jobs.len()
    }

    fn next_deadline(&mut self) -> Option<DateTime<Utc>> {
        while let Some(Reverse((fire_at, seq, key))) = self.queue.peek().copied() {
            if self.is_live(seq, &key) {
                return Some(fire_at);
            }
            self.queue.pop();
        }
        None
    }

    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<(JobKey, JobAction)> {
        let mut due = Vec::new();
        while let Some(Reverse((fire_at, seq, key))) = self.queue.peek().copied() {
            if fire_at > now {
                break;
            }
            self.queue.pop();
            if self.is_live(seq, &key) {
                if let Some(job) = self.jobs.remove(&key) {
                    due.push((key, job.action));
                }
            }
        }
        due
    }

    fn compact(&mut self) {
        if self.queue.len() <= 2 * self.jobs.len() + COMPACT_SLACK {
            return;
        }
        self.queue = self
            .jobs
            .iter()
            .map(|(key, job)| Reverse((job.fire_at, job.seq, *key)))
            .collect();
    }
}

/// Shared job table plus the loop that fires due jobs.
pub struct Timer {
    state: Mutex<TimerState>,
    notify: Notify,
    shutdown: AtomicBool,
    clock: Arc<dyn Clock>,
    max_sleep: Duration,
}

impl Timer {
    pub fn new(clock: Arc<dyn Clock>, max_sleep: Duration) -> Self {
        Self {
            state: Mutex::new(TimerState::default()),
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
            clock,
            max_sleep,
        }
    }

    /// Insert a job, replacing any live job with the same key.
    pub fn insert(&self, key: JobKey, fire_at: DateTime<Utc>, action: JobAction) {
        let replaced = self.state.lock().insert(key, fire_at, action);
        if replaced {
            debug!("Replaced job {} (fires at {})", key, fire_at);
        }
        self.notify.notify_one();
    }

    /// Cancel one job. Returns `false` if it was not live.
    pub fn remove(&self, key: &JobKey) -> bool {
        let mut state = self.state.lock();
        let removed = state.jobs.remove(key).is_some();
        state.compact();
        removed
    }

    /// Cancel every job of a device. Safe when there are none.
    pub fn remove_device(&self, device_id: DeviceId) -> usize {
        let mut state = self.state.lock();
        let removed = state.remove_device(device_id);
        state.compact();
        removed
    }

    /// Swap a device's whole job set in one critical section.
    ///
    /// Observers and the firing loop see either the old set or the new one.
    ///
    /// # Returns
    /// Number of previously live jobs that were cancelled.
    pub fn replace_device_jobs(&self, device_id: DeviceId, jobs: Vec<NewJob>) -> usize {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.remove_device(device_id);
            for (key, fire_at, action) in jobs {
                state.insert(key, fire_at, action);
            }
            state.compact();
            removed
        };
        self.notify.notify_one();
        removed
    }

    /// Live jobs ordered by fire time.
    pub fn jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self
            .state
            .lock()
            .jobs
            .iter()
            .map(|(key, job)| JobInfo {
                key: *key,
                fire_at: job.fire_at,
            })
            .collect();
        jobs.sort_by_key(|job| (job.fire_at, job.key));
        jobs
    }

    pub fn device_jobs(&self, device_id: DeviceId) -> Vec<JobInfo> {
        self.jobs()
            .into_iter()
            .filter(|job| job.key.device_id == device_id)
            .collect()
    }

    pub fn fire_time(&self, key: &JobKey) -> Option<DateTime<Utc>> {
        self.state.lock().jobs.get(key).map(|job| job.fire_at)
    }

    pub fn contains(&self, key: &JobKey) -> bool {
        self.state.lock().jobs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Earliest live fire time.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.state.lock().next_deadline()
    }

    /// Dispatch every job due at the clock's current time.
    ///
    /// Each action runs in its own task; a panicking action is logged and
    /// does not affect other jobs. Must be called inside a tokio runtime.
    ///
    /// # Returns
    /// Number of jobs dispatched.
    pub fn fire_due(&self) -> usize {
        let now = self.clock.now();
        let due = self.state.lock().take_due(now);
        let count = due.len();

        for (key, action) in due {
            info!("Firing job {}", key);
            tokio::spawn(async move {
                if let Err(e) = tokio::spawn(action()).await {
                    error!("Job {} aborted: {}", key, e);
                }
            });
        }
        count
    }

    /// Run until [`Timer::shutdown`] is called.
    pub async fn run(&self) {
        info!("Timer started with {} pending jobs", self.len());

        while !self.is_shutdown() {
            self.fire_due();

            let wait = match self.next_deadline() {
                Some(deadline) => (deadline - self.clock.now())
                    .to_std()
                    .unwrap_or(Duration::ZERO)
                    .min(self.max_sleep),
                None => self.max_sleep,
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.notify.notified() => {}
            }
        }

        info!("Timer stopped with {} pending jobs", self.len());
    }

    /// Signal the loop to stop. Pending jobs stay in the table.
    pub fn shutdown(&self) {
        info!("Timer shutdown requested");
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("jobs", &self.len())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
