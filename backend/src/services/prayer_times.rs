//! Prayer time computation service.
//!
//! Combines the solar ephemeris, the method registry and the Moonsighting
//! estimator into a full day of prayer times for one location.
//!
//! All solving happens in "UTC minutes since 00:00 UTC of the requested
//! date"; values are localized to the target timezone only at the end.
//! Every event found by solving an hour angle gets exactly one refinement
//! pass using the declination at the first estimate.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use log::debug;
use rayon::prelude::*;

use crate::astro::moonsighting;
use crate::astro::sun::{
    asr_altitude, hour_angle_for_zenith, julian_day, sun_position, MINUTES_PER_DEGREE,
    SUNRISE_ZENITH,
};
use crate::error::{AdhanError, Result};
use crate::models::geo::{parse_timezone, validate_coordinates};
use crate::models::method::{self, apply_offsets, CalculationMethod, FajrRule, IshaRule};
use crate::models::{GeoMoment, Madhab, PrayerName, PrayerTimeSet, Shafaq};

const IMSAK_MINUTES_BEFORE_FAJR: i64 = 10;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Raw solution for one date, in UTC minutes since that date's 00:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SolarDay {
    fajr: Option<f64>,
    sunrise: Option<f64>,
    dhuhr: f64,
    asr: Option<f64>,
    sunset: Option<f64>,
    isha: Option<f64>,
}

/// Computes prayer times for one method/madhab/timezone combination.
///
/// The engine holds no mutable state, so a single instance can be shared
/// across threads and reused for any number of dates and locations.
#[derive(Debug, Clone)]
pub struct PrayerTimeEngine {
    method: &'static CalculationMethod,
    madhab: Madhab,
    shafaq: Shafaq,
    timezone: Tz,
}

impl PrayerTimeEngine {
    /// Create an engine from a method name and IANA timezone.
    ///
    /// # Errors
    /// `AdhanError::Configuration` for an unknown method or timezone.
    pub fn new(method: &str, madhab: Madhab, timezone: &str) -> Result<Self> {
        Ok(Self {
            method: method::lookup(method)?,
            madhab,
            shafaq: Shafaq::default(),
            timezone: parse_timezone(timezone)?,
        })
    }

    /// Create an engine from already-resolved parts.
    pub fn from_parts(method: &'static CalculationMethod, madhab: Madhab, timezone: Tz) -> Self {
        Self {
            method,
            madhab,
            shafaq: Shafaq::default(),
            timezone,
        }
    }

    /// Create an engine matching an already-validated [`GeoMoment`].
    pub fn for_moment(moment: &GeoMoment) -> Self {
        Self {
            method: moment.method,
            madhab: moment.madhab,
            shafaq: Shafaq::default(),
            timezone: moment.timezone,
        }
    }

    /// Twilight colour for the Moonsighting Isha estimator.
    pub fn with_shafaq(mut self, shafaq: Shafaq) -> Self {
        self.shafaq = shafaq;
        self
    }

    /// The calculation method in use.
    pub fn method(&self) -> &'static CalculationMethod {
        self.method
    }

    /// Madhab selecting the Asr shadow factor.
    pub fn madhab(&self) -> Madhab {
        self.madhab
    }

    /// Zone the computed times are expressed in.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Prayer times for `date` at the given coordinates.
    ///
    /// # Errors
    /// `AdhanError::InvalidInput` for coordinates out of range. Undefined
    /// events (polar latitudes) are absent values, not errors.
    pub fn compute(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Result<PrayerTimeSet> {
        validate_coordinates(latitude, longitude)?;
        Ok(self.compute_day(date, latitude, longitude))
    }

    /// Prayer times for a validated [`GeoMoment`].
    pub fn compute_moment(&self, moment: &GeoMoment) -> PrayerTimeSet {
        self.compute_day(moment.date, moment.latitude, moment.longitude)
    }

    /// Every day of a calendar month, in date order.
    pub fn compute_month(
        &self,
        year: i32,
        month: u32,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<(NaiveDate, PrayerTimeSet)>> {
        validate_coordinates(latitude, longitude)?;
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            AdhanError::invalid_input(format!("Invalid month {}-{:02}", year, month))
        })?;
        let days: Vec<NaiveDate> = first
            .iter_days()
            .take_while(|d| d.month() == month)
            .collect();
        Ok(self.compute_days(days, latitude, longitude))
    }

    /// Every day of a calendar year, in date order.
    pub fn compute_year(
        &self,
        year: i32,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<(NaiveDate, PrayerTimeSet)>> {
        validate_coordinates(latitude, longitude)?;
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| AdhanError::invalid_input(format!("Invalid year {}", year)))?;
        let days: Vec<NaiveDate> = first
            .iter_days()
            .take_while(|d| d.year() == year)
            .collect();
        Ok(self.compute_days(days, latitude, longitude))
    }

    /// Parallel fan-out; each day is independent and the result keeps input order.
    fn compute_days(
        &self,
        days: Vec<NaiveDate>,
        latitude: f64,
        longitude: f64,
    ) -> Vec<(NaiveDate, PrayerTimeSet)> {
        debug!(
            "Computing {} days of {} times at ({}, {})",
            days.len(),
            self.method.id,
            latitude,
            longitude
        );
        days.into_par_iter()
            .map(|date| (date, self.compute_day(date, latitude, longitude)))
            .collect()
    }

    fn compute_day(&self, date: NaiveDate, latitude: f64, longitude: f64) -> PrayerTimeSet {
        let today = self.solar_day(date, latitude, longitude);
        let tomorrow = date
            .succ_opt()
            .map(|next| (next, self.solar_day(next, latitude, longitude)));

        let mut times = PrayerTimeSet::empty();
        times.set(PrayerName::Fajr, self.localize(date, today.fajr));
        times.set(PrayerName::Sunrise, self.localize(date, today.sunrise));
        times.set(PrayerName::Dhuhr, self.localize(date, Some(today.dhuhr)));
        times.set(PrayerName::Asr, self.localize(date, today.asr));
        times.set(PrayerName::Sunset, self.localize(date, today.sunset));
        times.set(PrayerName::Maghrib, self.localize(date, today.sunset));
        times.set(PrayerName::Isha, self.localize(date, today.isha));

        if let (Some(fajr), Some(sunset)) = (times.get(PrayerName::Fajr), times.get(PrayerName::Sunset)) {
            times.set(
                PrayerName::Imsak,
                Some(fajr - Duration::minutes(IMSAK_MINUTES_BEFORE_FAJR)),
            );

            let next_sunrise = tomorrow.and_then(|(next, day)| self.localize(next, day.sunrise));
            times.set(
                PrayerName::Midnight,
                next_sunrise.map(|sunrise| sunset + (sunrise - sunset) / 2),
            );

            if let Some(next_fajr) = tomorrow.and_then(|(next, day)| self.localize(next, day.fajr)) {
                let night = next_fajr - sunset;
                times.set(PrayerName::Firstthird, Some(sunset + night / 3));
                times.set(PrayerName::Lastthird, Some(sunset + night * 2 / 3));
            }
        }

        apply_offsets(self.method, times)
    }

    fn solar_day(&self, date: NaiveDate, latitude: f64, longitude: f64) -> SolarDay {
        let lat = latitude.to_radians();
        let jd0 = julian_day(date.year(), date.month(), date.day());
        let (dec0, eqt) = sun_position(jd0);
        let noon = 720.0 - MINUTES_PER_DEGREE * longitude - eqt;

        let sunrise = refined_time(lat, jd0, dec0, noon, SUNRISE_ZENITH, -1.0);
        let sunset = refined_time(lat, jd0, dec0, noon, SUNRISE_ZENITH, 1.0);

        // Asr altitude is fixed by the declination at noon; only the hour
        // angle is refined.
        let (dec_noon, _) = sun_position(jd0 + noon / MINUTES_PER_DAY);
        let asr_zenith = 90.0 - asr_altitude(lat, dec_noon, self.madhab.asr_factor()).to_degrees();
        let asr = refined_time(lat, jd0, dec_noon, noon, asr_zenith, 1.0);

        let fajr = match self.method.fajr {
            FajrRule::Angle(angle) => refined_time(lat, jd0, dec0, noon, 90.0 + angle, -1.0),
            FajrRule::Moonsighting => sunrise
                .map(|t| t - moonsighting::fajr_minutes_before_sunrise(date, latitude)),
        };
        let isha = match self.method.isha {
            IshaRule::Angle(angle) => refined_time(lat, jd0, dec0, noon, 90.0 + angle, 1.0),
            IshaRule::MinutesAfterMaghrib(minutes) => sunset.map(|t| t + minutes),
            IshaRule::Moonsighting => sunset.map(|t| {
                t + moonsighting::isha_minutes_after_sunset(date, latitude, self.shafaq)
            }),
        };

        SolarDay {
            fajr,
            sunrise,
            dhuhr: noon,
            asr,
            sunset,
            isha,
        }
    }

    fn localize(&self, date: NaiveDate, minutes_utc: Option<f64>) -> Option<DateTime<Tz>> {
        let minutes = minutes_utc?;
        let midnight_utc = date.and_time(NaiveTime::MIN).and_utc();
        let offset = Duration::milliseconds((minutes * 60_000.0).round() as i64);
        Some((midnight_utc + offset).with_timezone(&self.timezone))
    }
}

/// Time (UTC minutes) at which the sun reaches `zenith` on the side of noon
/// given by `direction` (-1 before, +1 after).
///
/// The first estimate uses `dec`; a single correction re-solves with the
/// declination at that estimate. If the corrected solve fails, the first
/// estimate is kept.
fn refined_time(lat: f64, jd0: f64, dec: f64, noon: f64, zenith: f64, direction: f64) -> Option<f64> {
    let h = hour_angle_for_zenith(lat, dec, zenith)?;
    let estimate = noon + direction * h * MINUTES_PER_DEGREE;

    let (dec_at_estimate, _) = sun_position(jd0 + estimate / MINUTES_PER_DAY);
    Some(match hour_angle_for_zenith(lat, dec_at_estimate, zenith) {
        Some(h) => noon + direction * h * MINUTES_PER_DEGREE,
        None => estimate,
    })
}
