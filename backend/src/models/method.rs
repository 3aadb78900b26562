//! Calculation method registry.
//!
//! Each method defines how Fajr and Isha are found (a solar depression angle,
//! a fixed delay after sunset, or the Moonsighting model) and which minute
//! offsets are applied once everything else is computed.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::astro::sun::SUNRISE_ZENITH;
use crate::error::{AdhanError, Result};
use crate::models::{PrayerName, PrayerTimeSet};

/// How Fajr is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FajrRule {
    /// Sun depression below the horizon, in degrees.
    Angle(f64),
    Moonsighting,
}

/// How Isha is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IshaRule {
    /// Sun depression below the horizon, in degrees.
    Angle(f64),
    /// Fixed delay after sunset.
    MinutesAfterMaghrib(f64),
    Moonsighting,
}

/// Method-specific Maghrib variant. Maghrib is otherwise equal to sunset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaghribRule {
    /// Sun depression in degrees, applied as an equivalent minute offset.
    Angle(f64),
    Minutes(f64),
}

impl MaghribRule {
    /// Minutes after sunset. Angles use the 4 min/degree equatorial rate
    /// measured from the refraction-adjusted horizon.
    pub fn offset_minutes(&self) -> f64 {
        match *self {
            MaghribRule::Angle(angle) => (angle - (SUNRISE_ZENITH - 90.0)) * 4.0,
            MaghribRule::Minutes(minutes) => minutes,
        }
    }
}

/// A named parameter set for Fajr/Isha.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationMethod {
    pub id: &'static str,
    pub description: &'static str,
    pub fajr: FajrRule,
    pub isha: IshaRule,
    pub maghrib: Option<MaghribRule>,
    /// Minutes added to named prayers after all other computation.
    pub offsets: &'static [(PrayerName, f64)],
}

impl CalculationMethod {
    const fn angles(id: &'static str, description: &'static str, fajr: f64, isha: f64) -> Self {
        Self {
            id,
            description,
            fajr: FajrRule::Angle(fajr),
            isha: IshaRule::Angle(isha),
            maghrib: None,
            offsets: &[],
        }
    }

    const fn with_isha(mut self, isha: IshaRule) -> Self {
        self.isha = isha;
        self
    }

    const fn with_maghrib(mut self, maghrib: MaghribRule) -> Self {
        self.maghrib = Some(maghrib);
        self
    }

    const fn with_offsets(mut self, offsets: &'static [(PrayerName, f64)]) -> Self {
        self.offsets = offsets;
        self
    }

    pub fn is_moonsighting(&self) -> bool {
        matches!(self.fajr, FajrRule::Moonsighting) || matches!(self.isha, IshaRule::Moonsighting)
    }

    /// All post-processing offsets, Maghrib variant included.
    pub fn all_offsets(&self) -> Vec<(PrayerName, f64)> {
        let mut offsets: Vec<(PrayerName, f64)> = self
            .maghrib
            .iter()
            .map(|rule| (PrayerName::Maghrib, rule.offset_minutes()))
            .collect();
        offsets.extend_from_slice(self.offsets);
        offsets
    }
}

/// `{method, description}` entry for method listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub method: String,
    pub description: String,
}

static METHODS: [CalculationMethod; 24] = [
    CalculationMethod::angles("MWL", "Muslim World League", 18.0, 17.0),
    CalculationMethod::angles("ISNA", "Islamic Society of North America", 15.0, 15.0),
    CalculationMethod::angles("EGYPT", "Egyptian General Authority of Survey", 19.5, 17.5),
    CalculationMethod::angles("MAKKAH", "Umm al-Qura University", 18.5, 0.0)
        .with_isha(IshaRule::MinutesAfterMaghrib(90.0)),
    CalculationMethod::angles("KARACHI", "University of Islamic Sciences, Karachi", 18.0, 18.0),
    CalculationMethod::angles("TEHRAN", "Institute of Geophysics, University of Tehran", 17.7, 14.0)
        .with_maghrib(MaghribRule::Angle(4.5)),
    CalculationMethod::angles("JAFARI", "Shia Ithna-Ashari, Leva Institute, Qum", 16.0, 14.0)
        .with_maghrib(MaghribRule::Angle(4.0)),
    CalculationMethod::angles("GULF", "Gulf Region", 19.5, 0.0)
        .with_isha(IshaRule::MinutesAfterMaghrib(90.0)),
    CalculationMethod::angles("KUWAIT", "Kuwait", 18.0, 17.5),
    CalculationMethod::angles("QATAR", "Qatar", 18.0, 0.0)
        .with_isha(IshaRule::MinutesAfterMaghrib(90.0)),
    CalculationMethod::angles("SINGAPORE", "Singapore", 20.0, 18.0),
    CalculationMethod::angles("FRANCE", "French Government", 12.0, 12.0)
        .with_offsets(&[(PrayerName::Fajr, 15.0), (PrayerName::Isha, 15.0)]),
    CalculationMethod::angles("TURKEY", "Turkey", 18.0, 17.0),
    CalculationMethod::angles("RUSSIA", "Russia", 16.0, 15.0),
    CalculationMethod {
        id: "MOONSIGHTING",
        description: "Moonsighting Committee",
        fajr: FajrRule::Moonsighting,
        isha: IshaRule::Moonsighting,
        maghrib: None,
        offsets: &[],
    },
    CalculationMethod::angles("DUBAI", "Dubai", 18.2, 18.2),
    CalculationMethod::angles("JAKIM", "Malaysia", 20.0, 18.0),
    CalculationMethod::angles("TUNISIA", "Tunisia", 18.0, 18.0),
    CalculationMethod::angles("ALGERIA", "Algeria", 18.0, 17.0),
    CalculationMethod::angles("KEMENAG", "Indonesia", 20.0, 18.0),
    CalculationMethod::angles("MOROCCO", "Morocco", 19.0, 17.0),
    CalculationMethod::angles("PORTUGAL", "Portugal", 18.0, 0.0)
        .with_isha(IshaRule::MinutesAfterMaghrib(77.0))
        .with_maghrib(MaghribRule::Minutes(3.0)),
    CalculationMethod::angles("JORDAN", "Jordan", 18.0, 18.0)
        .with_maghrib(MaghribRule::Minutes(5.0)),
    CalculationMethod::angles("CUSTOM", "Custom method", 18.0, 18.0),
];

static REGISTRY: Lazy<HashMap<String, &'static CalculationMethod>> = Lazy::new(|| {
    METHODS
        .iter()
        .map(|method| (method.id.to_uppercase(), method))
        .collect()
});

/// Look up a method by case-insensitive name.
///
/// # Errors
/// `AdhanError::Configuration` for unknown names. There is no fallback.
pub fn lookup(name: &str) -> Result<&'static CalculationMethod> {
    REGISTRY
        .get(&name.trim().to_uppercase())
        .copied()
        .ok_or_else(|| AdhanError::configuration(format!("Unknown method '{}'", name)))
}

/// All registered methods, in registry order.
pub fn available_methods() -> Vec<MethodInfo> {
    METHODS
        .iter()
        .map(|m| MethodInfo {
            method: m.id.to_string(),
            description: m.description.to_string(),
        })
        .collect()
}

/// Apply the method's post-processing minute offsets.
pub fn apply_offsets(method: &CalculationMethod, mut times: PrayerTimeSet) -> PrayerTimeSet {
    for (prayer, minutes) in method.all_offsets() {
        times.shift(prayer, minutes);
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("mwl").unwrap().id, "MWL");
        assert_eq!(lookup("Moonsighting").unwrap().id, "MOONSIGHTING");
        assert_eq!(lookup(" france ").unwrap().id, "FRANCE");
    }

    #[test]
    fn test_unknown_method_is_configuration_error() {
        let err = lookup("NOT_A_METHOD").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("NOT_A_METHOD"));
    }

    #[test]
    fn test_every_method_is_listed_once() {
        let methods = available_methods();
        assert_eq!(methods.len(), METHODS.len());
        assert_eq!(methods[0].method, "MWL");
        assert_eq!(methods[0].description, "Muslim World League");
        for info in &methods {
            assert_eq!(lookup(&info.method).unwrap().id, info.method);
        }
    }

    #[test]
    fn test_moonsighting_rules() {
        let method = lookup("MOONSIGHTING").unwrap();
        assert!(method.is_moonsighting());
        assert!(!lookup("MWL").unwrap().is_moonsighting());
    }

    #[test]
    fn test_fixed_minutes_isha() {
        assert_eq!(
            lookup("MAKKAH").unwrap().isha,
            IshaRule::MinutesAfterMaghrib(90.0)
        );
    }

    #[test]
    fn test_maghrib_angle_offset() {
        let offset = MaghribRule::Angle(4.5).offset_minutes();
        assert!((offset - 14.6668).abs() < 1e-3);
        assert_eq!(MaghribRule::Minutes(3.0).offset_minutes(), 3.0);
    }

    #[test]
    fn test_apply_offsets_only_touches_listed_prayers() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        let mut times = PrayerTimeSet::empty();
        let sunset = tz.with_ymd_and_hms(2025, 6, 1, 21, 0, 0).unwrap();
        times.set(PrayerName::Sunset, Some(sunset));
        times.set(PrayerName::Maghrib, Some(sunset));

        let adjusted = apply_offsets(lookup("PORTUGAL").unwrap(), times);
        assert_eq!(adjusted.formatted(PrayerName::Maghrib).as_deref(), Some("21:03:00"));
        assert_eq!(adjusted.get(PrayerName::Sunset), Some(sunset));

        let untouched = apply_offsets(lookup("MWL").unwrap(), times);
        assert_eq!(untouched, times);
    }

    #[test]
    fn test_france_shifts_fajr_and_isha() {
        let tz: Tz = "Europe/Paris".parse().unwrap();
        let mut times = PrayerTimeSet::empty();
        let fajr = tz.with_ymd_and_hms(2025, 10, 2, 6, 30, 0).unwrap();
        let sunset = tz.with_ymd_and_hms(2025, 10, 2, 19, 27, 0).unwrap();
        let isha = tz.with_ymd_and_hms(2025, 10, 2, 20, 30, 0).unwrap();
        times.set(PrayerName::Fajr, Some(fajr));
        times.set(PrayerName::Maghrib, Some(sunset));
        times.set(PrayerName::Isha, Some(isha));

        let adjusted = apply_offsets(lookup("FRANCE").unwrap(), times);
        assert_eq!(adjusted.formatted(PrayerName::Fajr).as_deref(), Some("06:45:00"));
        assert_eq!(adjusted.formatted(PrayerName::Isha).as_deref(), Some("20:45:00"));
        assert_eq!(adjusted.get(PrayerName::Maghrib), Some(sunset));
    }
}
