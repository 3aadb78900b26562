//! Print a month of prayer times for a city.
//!
//! ```bash
//! cargo run --example monthly_timetable -- 2025 10 48.8566 2.3522 MWL Europe/Paris
//! ```

use std::env;

use adhan_rust::api::{available_methods, compute_month, to_hijri};
use adhan_rust::models::{Madhab, PrayerName};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--methods") {
        for info in available_methods() {
            println!("{:<14} {}", info.method, info.description);
        }
        return Ok(());
    }

    let year: i32 = args.first().map(|s| s.parse()).transpose()?.unwrap_or(2025);
    let month: u32 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(10);
    let lat: f64 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(48.8566);
    let lon: f64 = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(2.3522);
    let method = args.get(4).map(String::as_str).unwrap_or("MWL");
    let timezone = args.get(5).map(String::as_str).unwrap_or("Europe/Paris");

    let days = compute_month(year, month, lat, lon, method, Madhab::Shafi, timezone)?;

    let columns = [
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    print!("{:<12} {:<22}", "Date", "Hijri");
    for name in columns {
        print!(" {:>8}", name.as_str());
    }
    println!();

    for (date, times) in days {
        print!("{:<12} {:<22}", date, to_hijri(date).to_string());
        for name in columns {
            let value = times.formatted(name).unwrap_or_else(|| "--:--:--".to_string());
            print!(" {:>8}", value);
        }
        println!();
    }

    Ok(())
}
