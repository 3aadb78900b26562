//! Gregorian to Hijri conversion.
//!
//! Uses the arithmetical (tabular) Islamic calendar with the civil epoch
//! (1 Muharram 1 AH = 16 July 622 Julian). Observational calendars such as
//! Umm al-Qura can differ from it by a day.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::sun::julian_day;

const MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-awwal",
    "Rabi' al-thani",
    "Jumada al-awwal",
    "Jumada al-thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

const DAY_NAMES: [&str; 7] = [
    "al-Ithnayn",
    "al-Thulatha'",
    "al-Arba'a'",
    "al-Khamis",
    "al-Jum'ah",
    "al-Sabt",
    "al-Ahad",
];

/// A date in the Islamic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HijriDate {
    pub year: i64,
    /// 1-based month.
    pub month: u32,
    pub day: u32,
    /// Weekday, Monday = 0.
    #[serde(skip)]
    weekday: u32,
}

impl HijriDate {
    /// Convert a Gregorian date.
    pub fn from_gregorian(date: NaiveDate) -> Self {
        let jdn = (julian_day(date.year(), date.month(), date.day()) + 0.5) as i64;

        let mut l = jdn - 1948440 + 10632;
        let n = (l - 1).div_euclid(10631);
        l = l - 10631 * n + 354;
        let j = ((10985 - l) / 5316) * ((50 * l) / 17719) + (l / 5670) * ((43 * l) / 15238);
        l = l - ((30 - j) / 15) * ((17719 * j) / 50) - (j / 16) * ((15238 * j) / 43) + 29;
        let month = (24 * l) / 709;
        let day = l - (709 * month) / 24;
        let year = 30 * n + j - 30;

        Self {
            year,
            month: month as u32,
            day: day as u32,
            weekday: date.weekday().num_days_from_monday(),
        }
    }

    /// English transliteration of the month name.
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize - 1) % 12]
    }

    /// Transliterated weekday name.
    pub fn day_name(&self) -> &'static str {
        DAY_NAMES[self.weekday as usize % 7]
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.day_name(),
            self.day,
            self.month_name(),
            self.year
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hijri(y: i32, m: u32, d: u32) -> HijriDate {
        HijriDate::from_gregorian(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_start_of_ramadan_1445() {
        let h = hijri(2024, 3, 11);
        assert_eq!((h.year, h.month, h.day), (1445, 9, 1));
        assert_eq!(h.month_name(), "Ramadan");
    }

    #[test]
    fn test_known_dates() {
        let h = hijri(2025, 10, 2);
        assert_eq!((h.year, h.month, h.day), (1447, 4, 9));

        let h = hijri(2000, 1, 1);
        assert_eq!((h.year, h.month, h.day), (1420, 9, 24));
    }

    #[test]
    fn test_display_includes_weekday() {
        // 2024-03-11 was a Monday
        let h = hijri(2024, 3, 11);
        assert_eq!(h.to_string(), "al-Ithnayn 1 Ramadan 1445");
    }

    #[test]
    fn test_consecutive_days_advance() {
        let a = hijri(2025, 3, 29);
        let b = hijri(2025, 3, 30);
        assert!(b > a);
    }
}
