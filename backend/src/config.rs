//! Application configuration.
//!
//! Read from an `adhan.toml` file, then adjusted by `ADHAN_*` environment
//! variables:
//!
//! ```toml
//! [defaults]
//! method = "MWL"
//! madhab = "Shafi"
//! timezone = "Europe/Paris"
//!
//! [scheduler]
//! refresh_hour = 1
//!
//! [[devices]]
//! id = 1
//! name = "Living room"
//! city = { name = "Paris", lat = 48.8566, lon = 2.3522 }
//! audio = "adhan_makkah.mp3"
//! volume = 30
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{AdhanError, Result};
use crate::models::geo::parse_timezone;
use crate::models::{Device, DeviceId, DeviceSettings, Madhab, Shafaq};
use crate::scheduler::SchedulerConfig;

/// Used when neither the config, `TZ` nor the host provide a usable zone.
pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

/// Environment variable naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "ADHAN_CONFIG";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: DefaultSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// Computation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSettings {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub madhab: Madhab,
    /// IANA zone; resolved from the host when absent.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub shafaq: Shafaq,
}

/// Scheduler tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_refresh_hour")]
    pub refresh_hour: u32,
    #[serde(default)]
    pub refresh_interval_minutes: Option<u32>,
    #[serde(default)]
    pub debug: bool,
}

/// A device and its settings, as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Falls back to `[defaults].madhab` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub madhab: Option<Madhab>,
    #[serde(flatten)]
    pub settings: DeviceSettings,
}

fn default_method() -> String {
    "MWL".to_string()
}

fn default_refresh_hour() -> u32 {
    1
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            method: default_method(),
            madhab: Madhab::default(),
            timezone: None,
            shafaq: Shafaq::default(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            refresh_hour: default_refresh_hour(),
            refresh_interval_minutes: None,
            debug: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` if successful
    /// * `Err(AdhanError::Configuration)` if the file cannot be read, parsed
    ///   or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AdhanError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| AdhanError::configuration(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `adhan.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// # Returns
    /// * `Ok(Some(AppConfig))` if found and parsed successfully
    /// * `Ok(None)` if no config file exists
    /// * `Err(AdhanError)` if a file exists but is invalid
    pub fn from_default_location() -> Result<Option<Self>> {
        let search_paths = [
            PathBuf::from("adhan.toml"),
            PathBuf::from("backend/adhan.toml"),
            PathBuf::from("../adhan.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Apply `ADHAN_*` environment overrides.
    ///
    /// # Environment Variables
    /// - `ADHAN_METHOD`: default calculation method
    /// - `ADHAN_MADHAB`: default madhab
    /// - `ADHAN_TIMEZONE`: IANA timezone
    /// - `ADHAN_REFRESH_HOUR`: local hour of the daily refresh (0-23)
    /// - `ADHAN_DEBUG`: `true`/`1` to dump live jobs after each scheduling pass
    ///
    /// # Errors
    /// `AdhanError::Configuration` when a value cannot be parsed.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(method) = non_empty_var("ADHAN_METHOD") {
            self.defaults.method = method;
        }
        if let Some(madhab) = non_empty_var("ADHAN_MADHAB") {
            self.defaults.madhab = Madhab::from(madhab.as_str());
        }
        if let Some(timezone) = non_empty_var("ADHAN_TIMEZONE") {
            self.defaults.timezone = Some(timezone);
        }
        if let Some(hour) = non_empty_var("ADHAN_REFRESH_HOUR") {
            self.scheduler.refresh_hour = hour.parse().map_err(|_| {
                AdhanError::configuration(format!("ADHAN_REFRESH_HOUR must be an hour, got '{}'", hour))
            })?;
        }
        if let Some(debug) = non_empty_var("ADHAN_DEBUG") {
            self.scheduler.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.scheduler.refresh_hour > 23 {
            return Err(AdhanError::configuration(format!(
                "refresh_hour must be within 0-23, got {}",
                self.scheduler.refresh_hour
            )));
        }
        if self.scheduler.refresh_interval_minutes == Some(0) {
            return Err(AdhanError::configuration(
                "refresh_interval_minutes must be at least 1",
            ));
        }
        if let Some(timezone) = &self.defaults.timezone {
            parse_timezone(timezone)?;
        }
        let mut ids: Vec<i64> = self.devices.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        if let Some(w) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(AdhanError::configuration(format!(
                "Device id {} is declared twice",
                w[0]
            )));
        }
        Ok(())
    }

    /// Timezone used for scheduling.
    ///
    /// Resolution order: configured timezone, the `TZ` environment
    /// variable, the host zone, then [`DEFAULT_TIMEZONE`].
    ///
    /// # Errors
    /// `AdhanError::Configuration` if the configured timezone is invalid.
    /// Unusable `TZ` or host values are skipped.
    pub fn resolve_timezone(&self) -> Result<Tz> {
        if let Some(timezone) = &self.defaults.timezone {
            return parse_timezone(timezone);
        }

        if let Some(tz) = non_empty_var("TZ") {
            match parse_timezone(tz.trim_start_matches(':')) {
                Ok(tz) => return Ok(tz),
                Err(e) => warn!("Ignoring TZ: {}", e),
            }
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => match parse_timezone(&name) {
                Ok(tz) => return Ok(tz),
                Err(e) => warn!("Ignoring host timezone: {}", e),
            },
            Err(e) => debug!("Host timezone unavailable: {}", e),
        }

        parse_timezone(DEFAULT_TIMEZONE)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new()
            .with_refresh_hour(self.scheduler.refresh_hour)
            .with_refresh_interval_minutes(self.scheduler.refresh_interval_minutes)
            .with_shafaq(self.defaults.shafaq)
            .with_debug(self.scheduler.debug)
    }

    /// Devices with their settings. A device without a method or madhab
    /// inherits the one from `[defaults]`.
    pub fn device_entries(&self) -> Vec<(Device, Option<DeviceSettings>)> {
        self.devices
            .iter()
            .map(|entry| {
                let mut settings = entry.settings.clone();
                if settings.method.is_none() {
                    settings.method = Some(self.defaults.method.clone());
                }
                settings.madhab = entry.madhab.unwrap_or(self.defaults.madhab);
                let device = Device {
                    id: DeviceId(entry.id),
                    name: entry.name.clone(),
                };
                (device, Some(settings))
            })
            .collect()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[defaults]
method = "ISNA"
madhab = "Hanafi"
timezone = "America/New_York"
shafaq = "ahmer"

[scheduler]
refresh_hour = 2
refresh_interval_minutes = 30
debug = true

[[devices]]
id = 1
name = "Kitchen"
city = { name = "New York", lat = 40.7128, lon = -74.006 }
audio = "adhan.mp3"
volume = 40

[[devices]]
id = 2
enabled = false
"#;

        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(config.defaults.method, "ISNA");
        assert_eq!(config.defaults.madhab, Madhab::Hanafi);
        assert_eq!(config.defaults.shafaq, Shafaq::Ahmer);
        assert_eq!(config.scheduler.refresh_interval_minutes, Some(30));
        assert_eq!(config.devices.len(), 2);

        let kitchen = &config.devices[0];
        assert_eq!(kitchen.name, "Kitchen");
        assert_eq!(kitchen.settings.volume, 40);
        assert_eq!(kitchen.settings.city.as_ref().unwrap().lat, 40.7128);
        assert!(!config.devices[1].settings.enabled);

        let sc = config.scheduler_config();
        assert_eq!(sc.refresh_hour, 2);
        assert!(sc.debug);
        assert_eq!(config.resolve_timezone().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.defaults.method, "MWL");
        assert_eq!(config.scheduler.refresh_hour, 1);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn test_device_inherits_default_method() {
        let config = AppConfig::from_toml(
            r#"
[defaults]
method = "KARACHI"
madhab = "Hanafi"

[[devices]]
id = 5
city = { lat = 24.86, lon = 67.0 }

[[devices]]
id = 6
method = "MWL"
madhab = "Shafi"
"#,
        )
        .unwrap();
        let entries = config.device_entries();
        let first = entries[0].1.as_ref().unwrap();
        let second = entries[1].1.as_ref().unwrap();
        assert_eq!(entries[0].0.id, DeviceId(5));
        assert_eq!(first.method.as_deref(), Some("KARACHI"));
        assert_eq!(first.madhab, Madhab::Hanafi);
        assert_eq!(second.method.as_deref(), Some("MWL"));
        assert_eq!(second.madhab, Madhab::Shafi);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let bad_hour = AppConfig::from_toml("[scheduler]\nrefresh_hour = 24\n").unwrap_err();
        assert!(bad_hour.is_configuration());

        let bad_tz = AppConfig::from_toml("[defaults]\ntimezone = \"Moon/Base\"\n").unwrap_err();
        assert!(bad_tz.is_configuration());

        let duplicate = AppConfig::from_toml("[[devices]]\nid = 1\n[[devices]]\nid = 1\n").unwrap_err();
        assert!(duplicate.to_string().contains("declared twice"));

        let zero_interval =
            AppConfig::from_toml("[scheduler]\nrefresh_interval_minutes = 0\n").unwrap_err();
        assert!(zero_interval.is_configuration());

        assert!(AppConfig::from_toml("not = [valid").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/definitely/not/here/adhan.toml").unwrap_err();
        assert!(err.is_configuration());
    }
}
