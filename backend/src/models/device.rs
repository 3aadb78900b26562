//! Devices and their persisted scheduling settings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Madhab;

/// Device identifier (repository primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub i64);

impl DeviceId {
    pub fn new(value: i64) -> Self {
        DeviceId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playback device known to the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
}

/// City whose coordinates drive a device's prayer times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Reference to an audio asset understood by the playback collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(pub String);

impl fmt::Display for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted per-device settings.
///
/// `method` and `city` are optional because a device can be registered
/// before it is configured; such a device cannot be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub madhab: Madhab,
    #[serde(default)]
    pub city: Option<City>,
    #[serde(default)]
    pub audio: Option<AudioRef>,
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_enabled() -> bool {
    true
}

fn default_volume() -> u8 {
    25
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            method: None,
            madhab: Madhab::default(),
            city: None,
            audio: None,
            volume: default_volume(),
        }
    }
}

impl DeviceSettings {
    /// Settings with everything needed to compute a schedule, or `None`.
    pub fn schedulable(&self) -> Option<SchedulableSettings<'_>> {
        Some(SchedulableSettings {
            method: self.method.as_deref().filter(|m| !m.trim().is_empty())?,
            city: self.city.as_ref()?,
            madhab: self.madhab,
            audio: self.audio.as_ref(),
            volume: self.volume,
        })
    }
}

/// Borrowed view of complete settings.
#[derive(Debug, Clone, Copy)]
pub struct SchedulableSettings<'a> {
    pub method: &'a str,
    pub city: &'a City,
    pub madhab: Madhab,
    pub audio: Option<&'a AudioRef>,
    pub volume: u8,
}
