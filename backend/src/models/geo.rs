//! Validated location and date input for the engine.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::{AdhanError, Result};
use crate::models::method::{self, CalculationMethod};
use crate::models::Madhab;

/// Validated input of a single prayer-time computation.
#[derive(Debug, Clone)]
pub struct GeoMoment {
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub method: &'static CalculationMethod,
    pub madhab: Madhab,
    pub timezone: Tz,
}

impl GeoMoment {
    /// Resolve and validate every part of the request.
    ///
    /// # Errors
    /// * `Configuration` for an unknown method or timezone
    /// * `InvalidInput` for coordinates out of range
    pub fn new(
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
        method: &str,
        madhab: Madhab,
        timezone: &str,
    ) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self {
            date,
            latitude,
            longitude,
            method: method::lookup(method)?,
            madhab,
            timezone: parse_timezone(timezone)?,
        })
    }
}

/// Parse an IANA timezone identifier.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| AdhanError::configuration(format!("Unknown timezone '{}': {}", name, e)))
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AdhanError::invalid_input(format!(
            "Latitude {} outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AdhanError::invalid_input(format!(
            "Longitude {} outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 2).unwrap()
    }

    #[test]
    fn test_valid_moment() {
        let moment =
            GeoMoment::new(day(), 48.8566, 2.3522, "mwl", Madhab::Shafi, "Europe/Paris").unwrap();
        assert_eq!(moment.method.id, "MWL");
        assert_eq!(moment.timezone, chrono_tz::Europe::Paris);
    }

    #[test]
    fn test_unknown_timezone() {
        let err = GeoMoment::new(day(), 0.0, 0.0, "MWL", Madhab::Shafi, "Mars/Olympus").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_out_of_range_coordinates() {
        assert!(matches!(
            GeoMoment::new(day(), 91.0, 0.0, "MWL", Madhab::Shafi, "UTC"),
            Err(AdhanError::InvalidInput(_))
        ));
        assert!(matches!(
            GeoMoment::new(day(), 0.0, -180.5, "MWL", Madhab::Shafi, "UTC"),
            Err(AdhanError::InvalidInput(_))
        ));
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
