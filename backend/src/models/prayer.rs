//! Prayer names and the per-day set of computed times.
//!
//! [`PrayerTimeSet`] keeps one optional zoned time per [`PrayerName`] and
//! serializes them as an ordered `name -> "HH:MM:SS"` map.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Named prayer events, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrayerName {
    Imsak,
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Sunset,
    Maghrib,
    Isha,
    Midnight,
    Firstthird,
    Lastthird,
}

impl PrayerName {
    /// Full vocabulary in display order.
    pub const ALL: [PrayerName; 11] = [
        PrayerName::Imsak,
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Sunset,
        PrayerName::Maghrib,
        PrayerName::Isha,
        PrayerName::Midnight,
        PrayerName::Firstthird,
        PrayerName::Lastthird,
    ];

    /// Prayers that get a playback job. The rest are informational.
    pub const SCHEDULABLE: [PrayerName; 5] = [
        PrayerName::Fajr,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Imsak => "Imsak",
            PrayerName::Fajr => "Fajr",
            PrayerName::Sunrise => "Sunrise",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Sunset => "Sunset",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
            PrayerName::Midnight => "Midnight",
            PrayerName::Firstthird => "Firstthird",
            PrayerName::Lastthird => "Lastthird",
        }
    }

    pub fn is_schedulable(&self) -> bool {
        Self::SCHEDULABLE.contains(self)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PrayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrayerName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrayerName::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown prayer name: {}", s))
    }
}

/// Jurisprudential school, which selects the Asr shadow factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Madhab {
    /// Shafi'i, Maliki and Hanbali: shadow equals object length.
    #[default]
    Shafi,
    /// Hanafi: shadow equals twice the object length.
    Hanafi,
}

impl Madhab {
    pub fn asr_factor(&self) -> f64 {
        match self {
            Madhab::Shafi => 1.0,
            Madhab::Hanafi => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Madhab::Shafi => "Shafi",
            Madhab::Hanafi => "Hanafi",
        }
    }
}

impl From<&str> for Madhab {
    /// Anything outside the Shafi family uses the doubled shadow factor.
    fn from(s: &str) -> Self {
        let s = s.trim().to_lowercase();
        if s.starts_with("sh") || s == "maliki" || s == "hanbali" || s == "standard" {
            Madhab::Shafi
        } else {
            Madhab::Hanafi
        }
    }
}

impl From<String> for Madhab {
    fn from(s: String) -> Self {
        Madhab::from(s.as_str())
    }
}

impl From<Madhab> for String {
    fn from(m: Madhab) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for Madhab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Twilight colour used by the Moonsighting Isha estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shafaq {
    #[default]
    General,
    /// Red twilight.
    #[serde(alias = "red")]
    Ahmer,
    /// White twilight.
    #[serde(alias = "white")]
    Abyad,
}

impl FromStr for Shafaq {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(Shafaq::General),
            "ahmer" | "red" => Ok(Shafaq::Ahmer),
            "abyad" | "white" => Ok(Shafaq::Abyad),
            other => Err(format!("Unknown shafaq: {}", other)),
        }
    }
}

/// One day of prayer times, localized to the requested timezone.
///
/// A value is `None` when the sun geometry leaves the event undefined on
/// that day (polar day/night, twilight that never ends). Iteration and
/// serialization follow [`PrayerName::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrayerTimeSet {
    times: [Option<DateTime<Tz>>; 11],
}

impl PrayerTimeSet {
    pub(crate) fn empty() -> Self {
        Self { times: [None; 11] }
    }

    pub(crate) fn set(&mut self, name: PrayerName, value: Option<DateTime<Tz>>) {
        self.times[name.index()] = value;
    }

    /// Shift a present value by `minutes`. Absent values stay absent.
    pub(crate) fn shift(&mut self, name: PrayerName, minutes: f64) {
        let delta = Duration::milliseconds((minutes * 60_000.0).round() as i64);
        if let Some(t) = self.times[name.index()].as_mut() {
            *t += delta;
        }
    }

    pub fn get(&self, name: PrayerName) -> Option<DateTime<Tz>> {
        self.times[name.index()]
    }

    /// `HH:MM:SS` local time, truncated to whole seconds.
    pub fn formatted(&self, name: PrayerName) -> Option<String> {
        self.get(name).map(|t| t.format("%H:%M:%S").to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrayerName, Option<DateTime<Tz>>)> + '_ {
        PrayerName::ALL.into_iter().map(|p| (p, self.get(p)))
    }

    /// Present schedulable prayers, in display order.
    pub fn schedulable(&self) -> impl Iterator<Item = (PrayerName, DateTime<Tz>)> + '_ {
        PrayerName::SCHEDULABLE
            .into_iter()
            .filter_map(|p| self.get(p).map(|t| (p, t)))
    }
}

impl Serialize for PrayerTimeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PrayerName::ALL.len()))?;
        for name in PrayerName::ALL {
            map.serialize_entry(name.as_str(), &self.formatted(name))?;
        }
        map.end()
    }
}
