//! Repository traits for devices and their settings.
//!
//! The scheduler only reads through these traits; how settings are stored
//! is up to the implementation.

pub mod error;

use async_trait::async_trait;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{Device, DeviceId, DeviceSettings};

/// Source of the devices to schedule.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// List every registered device.
    ///
    /// # Returns
    /// * `Ok(Vec<Device>)` - All devices, in ascending id order
    /// * `Err(RepositoryError)` - If the backend fails
    async fn list_devices(&self) -> RepositoryResult<Vec<Device>>;
}

/// Source of per-device settings.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the settings of one device.
    ///
    /// # Arguments
    /// * `device_id` - The device to look up
    ///
    /// # Returns
    /// * `Ok(Some(DeviceSettings))` - Stored settings
    /// * `Ok(None)` - The device has no settings yet
    /// * `Err(RepositoryError)` - If the backend fails
    async fn get_device_settings(
        &self,
        device_id: DeviceId,
    ) -> RepositoryResult<Option<DeviceSettings>>;
}

/// Combined repository used by the scheduler.
pub trait FullRepository: DeviceRepository + SettingsRepository {}

impl<T> FullRepository for T where T: DeviceRepository + SettingsRepository {}
