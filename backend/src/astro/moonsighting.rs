//! Moonsighting Committee twilight model.
//!
//! Instead of solving for a fixed depression angle, Fajr and Isha are placed
//! a number of minutes before sunrise / after sunset. The offset is
//! interpolated over the season (days since the winter solstice of the
//! observer's hemisphere) between four latitude-dependent coefficients.
//! This stays defined at latitudes where angle-based twilight never ends.

use chrono::{Datelike, NaiveDate};

use crate::models::Shafaq;

/// Seasonal breakpoints, in days since the local winter solstice.
const BREAKPOINTS: [i64; 5] = [91, 137, 183, 229, 275];

/// Latitude-dependent coefficients `a..d` of one estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Coefficients {
    fn new(base: f64, slopes: [f64; 4], latitude: f64) -> Self {
        let lat = latitude.abs();
        Self {
            a: base + slopes[0] / 55.0 * lat,
            b: base + slopes[1] / 55.0 * lat,
            c: base + slopes[2] / 55.0 * lat,
            d: base + slopes[3] / 55.0 * lat,
        }
    }

    /// Piecewise-linear interpolation a → b → c → d → c → b → a.
    ///
    /// The final segment reuses the 91-day span of the first one.
    fn interpolate(&self, dyy: i64) -> f64 {
        let Self { a, b, c, d } = *self;
        let dyy = dyy as f64;
        let [p1, p2, p3, p4, p5] = BREAKPOINTS.map(|v| v as f64);

        if dyy < p1 {
            a + (b - a) / p1 * dyy
        } else if dyy < p2 {
            b + (c - b) / (p2 - p1) * (dyy - p1)
        } else if dyy < p3 {
            c + (d - c) / (p3 - p2) * (dyy - p2)
        } else if dyy < p4 {
            d + (c - d) / (p4 - p3) * (dyy - p3)
        } else if dyy < p5 {
            c + (b - c) / (p5 - p4) * (dyy - p4)
        } else {
            b + (a - b) / p1 * (dyy - p5)
        }
    }
}

/// Days elapsed since the hemisphere's winter solstice anchor.
///
/// The anchor is Dec 21 (north) or Jun 21 (south) of the same calendar year;
/// dates on or before the anchor wrap around by 365 days.
pub fn days_since_solstice(date: NaiveDate, latitude: f64) -> i64 {
    let (month, day) = if latitude >= 0.0 { (12, 21) } else { (6, 21) };
    let anchor = NaiveDate::from_ymd_opt(date.year(), month, day).unwrap_or(date);
    let diff = (date - anchor).num_days();
    if diff > 0 {
        diff
    } else {
        365 + diff
    }
}

/// Minutes between Fajr and sunrise.
pub fn fajr_minutes_before_sunrise(date: NaiveDate, latitude: f64) -> f64 {
    let coeffs = Coefficients::new(75.0, [28.65, 19.44, 32.74, 48.1], latitude);
    coeffs
        .interpolate(days_since_solstice(date, latitude))
        .round()
}

/// Minutes between sunset and Isha for the chosen twilight colour.
pub fn isha_minutes_after_sunset(date: NaiveDate, latitude: f64, shafaq: Shafaq) -> f64 {
    let coeffs = match shafaq {
        Shafaq::Ahmer => Coefficients::new(62.0, [17.4, -7.16, 5.12, 19.44], latitude),
        Shafaq::Abyad => Coefficients::new(75.0, [25.6, 7.16, 36.84, 81.84], latitude),
        Shafaq::General => Coefficients::new(75.0, [25.6, 2.05, -9.21, 6.14], latitude),
    };
    coeffs
        .interpolate(days_since_solstice(date, latitude))
        .round()
}
