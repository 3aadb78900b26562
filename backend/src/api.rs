//! Public API surface for prayer-time computation.
//!
//! Thin functions over [`PrayerTimeEngine`] that take plain strings for the
//! method, madhab and timezone, plus the serializable daily DTO.

use chrono::NaiveDate;
use serde::Serialize;

use crate::astro::HijriDate;
use crate::error::Result;
use crate::models::method::{self, MethodInfo};
use crate::models::{GeoMoment, Madhab, PrayerTimeSet};
use crate::services::PrayerTimeEngine;

pub use crate::models::{DeviceId, PrayerName};
pub use crate::scheduler::{ScheduleResult, ScheduleStatus};

/// One day of prayer times, ready for JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPrayerTimes {
    pub date: NaiveDate,
    pub hijri_date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub method: String,
    pub madhab: Madhab,
    pub timezone: String,
    /// `HH:MM:SS` per prayer in vocabulary order; `null` when undefined.
    pub times: PrayerTimeSet,
}

impl DailyPrayerTimes {
    pub fn new(moment: &GeoMoment, times: PrayerTimeSet) -> Self {
        Self {
            date: moment.date,
            hijri_date: HijriDate::from_gregorian(moment.date).to_string(),
            latitude: moment.latitude,
            longitude: moment.longitude,
            method: moment.method.id.to_string(),
            madhab: moment.madhab,
            timezone: moment.timezone.name().to_string(),
            times,
        }
    }
}

/// Prayer times for one date and location.
///
/// # Arguments
/// * `date` - Calendar date at the location
/// * `latitude`, `longitude` - Degrees, north and east positive
/// * `method` - Case-insensitive method name (see [`available_methods`])
/// * `madhab` - Selects the Asr shadow factor
/// * `timezone` - IANA timezone of the returned times
///
/// # Errors
/// * `Configuration` for an unknown method or timezone
/// * `InvalidInput` for coordinates out of range
pub fn compute_prayer_times(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    method: &str,
    madhab: Madhab,
    timezone: &str,
) -> Result<PrayerTimeSet> {
    let moment = GeoMoment::new(date, latitude, longitude, method, madhab, timezone)?;
    Ok(PrayerTimeEngine::for_moment(&moment).compute_moment(&moment))
}

/// Same as [`compute_prayer_times`], wrapped in the daily DTO.
pub fn daily_prayer_times(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    method: &str,
    madhab: Madhab,
    timezone: &str,
) -> Result<DailyPrayerTimes> {
    let moment = GeoMoment::new(date, latitude, longitude, method, madhab, timezone)?;
    let times = PrayerTimeEngine::for_moment(&moment).compute_moment(&moment);
    Ok(DailyPrayerTimes::new(&moment, times))
}

/// Every day of a month, in calendar order.
pub fn compute_month(
    year: i32,
    month: u32,
    latitude: f64,
    longitude: f64,
    method: &str,
    madhab: Madhab,
    timezone: &str,
) -> Result<Vec<(NaiveDate, PrayerTimeSet)>> {
    PrayerTimeEngine::new(method, madhab, timezone)?.compute_month(year, month, latitude, longitude)
}

/// Every day of a year, in calendar order.
pub fn compute_year(
    year: i32,
    latitude: f64,
    longitude: f64,
    method: &str,
    madhab: Madhab,
    timezone: &str,
) -> Result<Vec<(NaiveDate, PrayerTimeSet)>> {
    PrayerTimeEngine::new(method, madhab, timezone)?.compute_year(year, latitude, longitude)
}

/// Registered methods as `{method, description}`, in registry order.
pub fn available_methods() -> Vec<MethodInfo> {
    method::available_methods()
}

/// Tabular Islamic calendar date for a Gregorian date.
pub fn to_hijri(date: NaiveDate) -> HijriDate {
    HijriDate::from_gregorian(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_dto_serialization() {
        let daily = daily_prayer_times(
            date(2025, 10, 2),
            48.8566,
            2.3522,
            "mwl",
            Madhab::Shafi,
            "Europe/Paris",
        )
        .unwrap();

        assert_eq!(daily.method, "MWL");
        assert_eq!(daily.timezone, "Europe/Paris");

        let json = serde_json::to_value(&daily).unwrap();
        assert_eq!(json["date"], "2025-10-02");
        assert_eq!(json["madhab"], "Shafi");
        assert_eq!(json["times"]["Sunrise"], "07:51:48");
        assert!(json["hijri_date"].as_str().unwrap().contains("1447"));

        let keys: Vec<&String> = json["times"].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 11);
    }

    #[test]
    fn test_facade_matches_engine() {
        let via_api = compute_prayer_times(
            date(2025, 6, 21),
            21.4225,
            39.8262,
            "MAKKAH",
            Madhab::Shafi,
            "Asia/Riyadh",
        )
        .unwrap();
        let via_engine = PrayerTimeEngine::new("MAKKAH", Madhab::Shafi, "Asia/Riyadh")
            .unwrap()
            .compute(date(2025, 6, 21), 21.4225, 39.8262)
            .unwrap();
        assert_eq!(via_api, via_engine);
    }

    #[test]
    fn test_facade_errors() {
        assert!(compute_prayer_times(date(2025, 1, 1), 0.0, 0.0, "BOGUS", Madhab::Shafi, "UTC")
            .unwrap_err()
            .is_configuration());
        assert!(compute_month(2025, 0, 0.0, 0.0, "MWL", Madhab::Shafi, "UTC").is_err());
        assert_eq!(available_methods().len(), 24);
    }

    #[test]
    fn test_to_hijri() {
        let hijri = to_hijri(date(2024, 3, 11));
        assert_eq!((hijri.year, hijri.month, hijri.day), (1445, 9, 1));
    }
}
