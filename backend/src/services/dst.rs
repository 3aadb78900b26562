//! Daylight-saving transition detection.
//!
//! Compares a timezone's UTC offset at local midnight of a date and of the
//! following date; when they differ, the transition instant is located by
//! bisection to five-minute precision.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Bisection stops once the bracket is this narrow.
const SEARCH_PRECISION_MINUTES: i64 = 5;
/// The corrective refresh fires this long before the transition.
const REFRESH_LEAD_MINUTES: i64 = 1;

/// A UTC-offset change inside one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstTransition {
    /// First probed instant carrying the new offset (within five minutes
    /// of the true transition, never before it).
    pub transition_at: DateTime<Utc>,
    /// When a dst-refresh job should fire; strictly before `transition_at`.
    pub refresh_at: DateTime<Utc>,
    pub offset_before_secs: i32,
    pub offset_after_secs: i32,
}

impl DstTransition {
    /// Clock shift in minutes; positive when clocks spring forward.
    pub fn shift_minutes(&self) -> i64 {
        i64::from(self.offset_after_secs - self.offset_before_secs) / 60
    }
}

/// Detect a UTC-offset change between local midnight of `date` and local
/// midnight of the next day.
///
/// # Returns
/// * `Some(DstTransition)` - The offset changes within that window
/// * `None` - No change, or `date` is the last representable day
pub fn detect_transition(tz: Tz, date: NaiveDate) -> Option<DstTransition> {
    let start = local_midnight(tz, date);
    let end = local_midnight(tz, date.succ_opt()?);

    let offset_before = utc_offset_secs(tz, start);
    let offset_after = utc_offset_secs(tz, end);
    if offset_before == offset_after {
        return None;
    }

    let (mut low, mut high) = (start, end);
    while high - low > Duration::minutes(SEARCH_PRECISION_MINUTES) {
        let mid = low + (high - low) / 2;
        if utc_offset_secs(tz, mid) == offset_before {
            low = mid;
        } else {
            high = mid;
        }
    }

    Some(DstTransition {
        transition_at: high,
        refresh_at: high - Duration::minutes(REFRESH_LEAD_MINUTES),
        offset_before_secs: offset_before,
        offset_after_secs: offset_after,
    })
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(tz, date.and_time(NaiveTime::MIN))
}

/// UTC instant of a local wall-clock time.
///
/// Ambiguous times (fall-back overlap) resolve to the earliest instant.
/// Times inside a spring-forward gap keep the pre-gap offset, which lands
/// them after the gap by its size.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            let before_gap = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            (local - Duration::seconds(i64::from(before_gap.local_minus_utc()))).and_utc()
        }
    }
}

fn utc_offset_secs(tz: Tz, instant: DateTime<Utc>) -> i32 {
    tz.offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_spring_forward_paris() {
        let t = detect_transition(chrono_tz::Europe::Paris, date(2025, 3, 30)).unwrap();
        assert!(t.transition_at >= utc(2025, 3, 30, 1, 0));
        assert!(t.transition_at <= utc(2025, 3, 30, 1, 5));
        assert_eq!(t.refresh_at, t.transition_at - Duration::minutes(1));
        assert_eq!(t.offset_before_secs, 3600);
        assert_eq!(t.offset_after_secs, 7200);
        assert_eq!(t.shift_minutes(), 60);
    }

    #[test]
    fn test_fall_back_new_york() {
        let t = detect_transition(chrono_tz::America::New_York, date(2025, 11, 2)).unwrap();
        // 02:00 EDT is 06:00Z
        assert!(t.transition_at >= utc(2025, 11, 2, 6, 0));
        assert!(t.transition_at <= utc(2025, 11, 2, 6, 5));
        assert!(t.refresh_at < t.transition_at);
        assert_eq!(t.shift_minutes(), -60);
    }

    #[test]
    fn test_ordinary_day_has_no_transition() {
        assert!(detect_transition(chrono_tz::Europe::Paris, date(2025, 10, 2)).is_none());
        assert!(detect_transition(chrono_tz::UTC, date(2025, 3, 30)).is_none());
    }

    #[test]
    fn test_local_to_utc_gap_and_overlap() {
        let paris = chrono_tz::Europe::Paris;
        // 02:30 does not exist on 2025-03-30; it lands at 03:30 CEST
        let gap = date(2025, 3, 30).and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(local_to_utc(paris, gap), utc(2025, 3, 30, 1, 30));

        // 02:30 happens twice on 2025-10-26; the CEST reading comes first
        let overlap = date(2025, 10, 26).and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(local_to_utc(paris, overlap), utc(2025, 10, 26, 0, 30));

        let plain = date(2025, 10, 3).and_hms_opt(1, 0, 0).unwrap();
        assert_eq!(local_to_utc(paris, plain), utc(2025, 10, 2, 23, 0));
    }

    #[test]
    fn test_day_before_transition_is_quiet() {
        // Midnight-to-midnight window of 03-29 ends before the 03-30 jump
        assert!(detect_transition(chrono_tz::Europe::Paris, date(2025, 3, 29)).is_none());
    }
}
