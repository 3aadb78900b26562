//! Low-precision solar ephemeris.
//!
//! Accuracy is well under a minute of time for dates within a few centuries
//! of J2000, which is the intrinsic resolution of prayer times.

/// Julian Day of the J2000.0 epoch.
pub const J2000: f64 = 2451545.0;

/// Zenith of the sun's upper limb at sunrise/sunset, including refraction.
pub const SUNRISE_ZENITH: f64 = 90.8333;

/// Minutes of time per degree of hour angle (360° / 24 h).
pub const MINUTES_PER_DEGREE: f64 = 4.0;

/// Below this, cos(lat)·cos(dec) is treated as zero (observer at a pole).
const POLE_EPSILON: f64 = 1e-15;

/// Julian Day at 0h UTC for a proleptic Gregorian date.
///
/// January and February are counted as months 13 and 14 of the previous
/// year; the century term applies the Gregorian leap-year correction.
pub fn julian_day(year: i32, month: u32, day: u32) -> f64 {
    let (mut y, mut m) = (year as i64, month as i64);
    if m <= 2 {
        y -= 1;
        m += 12;
    }
    let a = y.div_euclid(100);
    let b = 2 - a + a.div_euclid(4);

    (365.25 * (y + 4716) as f64).trunc() + (30.6001 * (m + 1) as f64).trunc() + day as f64
        + b as f64
        - 1524.5
}

/// Solar declination (radians) and equation of time (minutes) at `jd`.
pub fn sun_position(jd: f64) -> (f64, f64) {
    let d = jd - J2000;

    let g = (357.529 + 0.98560028 * d).rem_euclid(360.0).to_radians();
    let q = (280.459 + 0.98564736 * d).rem_euclid(360.0);
    let l = (q + 1.915 * g.sin() + 0.020 * (2.0 * g).sin())
        .rem_euclid(360.0)
        .to_radians();
    let e = (23.439 - 0.00000036 * d).to_radians();

    let ra_deg = (e.cos() * l.sin())
        .atan2(l.cos())
        .to_degrees()
        .rem_euclid(360.0);
    let declination = (e.sin() * l.sin()).asin();

    let mut eqt_hours = q / 15.0 - ra_deg / 15.0;
    if eqt_hours > 12.0 {
        eqt_hours -= 24.0;
    }
    if eqt_hours < -12.0 {
        eqt_hours += 24.0;
    }

    (declination, eqt_hours * 60.0)
}

/// Hour angle (degrees) at which the sun reaches `zenith_deg`.
///
/// Returns `None` at the poles and when the sun never reaches that zenith on
/// the given day (midnight sun, polar night, twilight that never ends).
pub fn hour_angle_for_zenith(lat_rad: f64, dec_rad: f64, zenith_deg: f64) -> Option<f64> {
    let denom = lat_rad.cos() * dec_rad.cos();
    if denom.abs() < POLE_EPSILON {
        return None;
    }

    let cos_h = (zenith_deg.to_radians().cos() - lat_rad.sin() * dec_rad.sin()) / denom;
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }

    Some(cos_h.acos().to_degrees())
}

/// Sun altitude (radians) at which a gnomon's shadow equals `factor` times
/// its length plus the noon shadow.
pub fn asr_altitude(lat_rad: f64, dec_rad: f64, factor: f64) -> f64 {
    (1.0 / (factor + (lat_rad - dec_rad).abs().tan())).atan()
}
