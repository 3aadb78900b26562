use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Offset, Timelike};
use proptest::prelude::*;

use adhan_rust::api::{
    available_methods, compute_month, compute_prayer_times, compute_year, daily_prayer_times,
    to_hijri,
};
use adhan_rust::models::{Madhab, PrayerName, PrayerTimeSet};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn paris(day: NaiveDate) -> PrayerTimeSet {
    compute_prayer_times(day, 48.8566, 2.3522, "MWL", Madhab::Shafi, "Europe/Paris").unwrap()
}

/// Present events in chronological vocabulary order must not go backwards.
fn assert_daytime_order(times: &PrayerTimeSet) {
    let chain = [
        PrayerName::Imsak,
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Sunset,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];
    let present: Vec<_> = chain.iter().filter_map(|p| times.get(*p)).collect();
    for pair in present.windows(2) {
        assert!(pair[0] <= pair[1], "{} after {}", pair[0], pair[1]);
    }
}

#[test]
fn test_paris_reference_times() {
    let times = paris(date(2025, 10, 2));

    assert_eq!(times.formatted(PrayerName::Fajr).as_deref(), Some("06:06:18"));
    assert_eq!(times.formatted(PrayerName::Dhuhr).as_deref(), Some("13:40:00"));
    assert_eq!(times.formatted(PrayerName::Maghrib).as_deref(), Some("19:27:19"));
    assert_eq!(times.formatted(PrayerName::Isha).as_deref(), Some("21:06:13"));
    assert_daytime_order(&times);
}

#[test]
fn test_makkah_uses_fixed_isha_interval() {
    let times = compute_prayer_times(
        date(2025, 6, 21),
        21.4225,
        39.8262,
        "MAKKAH",
        Madhab::Shafi,
        "Asia/Riyadh",
    )
    .unwrap();

    let maghrib = times.get(PrayerName::Maghrib).unwrap();
    let isha = times.get(PrayerName::Isha).unwrap();
    assert_eq!(isha - maghrib, Duration::minutes(90));
    // Riyadh stays on +03:00 all year
    assert_eq!(isha.offset().fix().local_minus_utc(), 3 * 3600);
}

#[test]
fn test_southern_hemisphere_summer() {
    // December is summer in Cape Town: long day, late Maghrib
    let times = compute_prayer_times(
        date(2025, 12, 21),
        -33.9249,
        18.4241,
        "MWL",
        Madhab::Shafi,
        "Africa/Johannesburg",
    )
    .unwrap();

    assert_daytime_order(&times);
    let maghrib = times.get(PrayerName::Maghrib).unwrap();
    assert!(maghrib.hour() >= 19, "Maghrib at {}", maghrib);
    let sunrise = times.get(PrayerName::Sunrise).unwrap();
    assert!(sunrise.hour() <= 6, "Sunrise at {}", sunrise);
}

#[test]
fn test_spring_forward_day_is_in_summer_offset() {
    // Clocks jump at 02:00 local; every prayer that day is after the jump
    let times = paris(date(2025, 3, 30));
    for (name, value) in times.iter() {
        if let Some(t) = value {
            assert_eq!(
                t.offset().fix().local_minus_utc(),
                7200,
                "{} should be CEST",
                name
            );
        }
    }

    // Dhuhr shifts by roughly an hour of wall clock across the jump
    let before = paris(date(2025, 3, 29)).get(PrayerName::Dhuhr).unwrap();
    let after = paris(date(2025, 3, 30)).get(PrayerName::Dhuhr).unwrap();
    let wall_shift = (after.hour() * 60 + after.minute()) as i64
        - (before.hour() * 60 + before.minute()) as i64;
    assert!((59..=61).contains(&wall_shift), "shift was {} min", wall_shift);
}

#[test]
fn test_year_is_consistent_with_single_days() {
    let year = compute_year(2025, 48.8566, 2.3522, "MWL", Madhab::Shafi, "Europe/Paris").unwrap();
    assert_eq!(year.len(), 365);
    assert_eq!(year.first().unwrap().0, date(2025, 1, 1));
    assert_eq!(year.last().unwrap().0, date(2025, 12, 31));

    for (day, times) in year.iter().step_by(37) {
        assert_eq!(*times, paris(*day), "mismatch on {}", day);
    }
}

#[test]
fn test_month_facade() {
    let june = compute_month(2025, 6, 51.5074, -0.1278, "MWL", Madhab::Hanafi, "Europe/London")
        .unwrap();
    assert_eq!(june.len(), 30);
    assert!(june.iter().all(|(d, _)| d.month() == 6));
    // London is far enough north that MWL Isha disappears around the solstice
    assert!(june
        .iter()
        .any(|(_, times)| times.get(PrayerName::Isha).is_none()));
    assert!(june
        .iter()
        .all(|(_, times)| times.get(PrayerName::Dhuhr).is_some()));
}

#[test]
fn test_daily_json_shape() {
    let daily = daily_prayer_times(
        date(2025, 10, 2),
        48.8566,
        2.3522,
        "MWL",
        Madhab::Shafi,
        "Europe/Paris",
    )
    .unwrap();
    let json = serde_json::to_value(&daily).unwrap();

    let names: Vec<&str> = json["times"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        names,
        vec![
            "Imsak",
            "Fajr",
            "Sunrise",
            "Dhuhr",
            "Asr",
            "Sunset",
            "Maghrib",
            "Isha",
            "Midnight",
            "Firstthird",
            "Lastthird"
        ]
    );
    assert_eq!(json["method"], "MWL");
}

#[test]
fn test_methods_registry_is_unique() {
    let methods = available_methods();
    let ids: HashSet<&str> = methods.iter().map(|m| m.method.as_str()).collect();
    assert_eq!(ids.len(), methods.len());
    assert!(ids.contains("MWL"));
    assert!(ids.contains("MOONSIGHTING"));

    for info in &methods {
        compute_prayer_times(date(2025, 4, 1), 30.0, 31.0, &info.method, Madhab::Shafi, "UTC")
            .unwrap_or_else(|e| panic!("{} failed: {}", info.method, e));
    }
}

#[test]
fn test_invalid_inputs() {
    let err = compute_prayer_times(date(2025, 1, 1), 91.0, 0.0, "MWL", Madhab::Shafi, "UTC")
        .unwrap_err();
    assert!(!err.is_configuration());

    let err = compute_prayer_times(date(2025, 1, 1), 0.0, 0.0, "MWL", Madhab::Shafi, "Mars/Olympus")
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_hijri_month_rollover() {
    let eid = to_hijri(date(2024, 4, 10));
    assert_eq!((eid.month, eid.day), (10, 1));
    assert_eq!(eid.month_name(), "Shawwal");
}

proptest! {
    #[test]
    fn prop_events_are_ordered_and_dhuhr_exists(
        lat in -55.0f64..55.0,
        lon in -179.0f64..179.0,
        ordinal in 1u32..=365,
        hanafi in any::<bool>(),
    ) {
        let day = NaiveDate::from_yo_opt(2025, ordinal).unwrap();
        let madhab = if hanafi { Madhab::Hanafi } else { Madhab::Shafi };
        let times = compute_prayer_times(day, lat, lon, "MWL", madhab, "UTC").unwrap();

        prop_assert!(times.get(PrayerName::Dhuhr).is_some());
        prop_assert!(times.get(PrayerName::Sunrise).is_some());
        prop_assert!(times.get(PrayerName::Sunset).is_some());
        assert_daytime_order(&times);

        if let (Some(first), Some(last)) = (
            times.get(PrayerName::Firstthird),
            times.get(PrayerName::Lastthird),
        ) {
            prop_assert!(times.get(PrayerName::Sunset).unwrap() < first);
            prop_assert!(first < last);
        }
    }

    #[test]
    fn prop_hijri_never_goes_backwards(ordinal in 1u32..365) {
        let day = NaiveDate::from_yo_opt(2025, ordinal).unwrap();
        prop_assert!(to_hijri(day) < to_hijri(day.succ_opt().unwrap()));
    }
}
