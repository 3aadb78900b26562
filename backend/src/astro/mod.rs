//! Astronomical models: solar ephemeris, the Moonsighting twilight
//! estimator and the Hijri calendar.
//!
//! Everything here is pure and stateless.

pub mod hijri;
pub mod moonsighting;
pub mod sun;

pub use hijri::HijriDate;
pub use sun::{hour_angle_for_zenith, julian_day, sun_position};
