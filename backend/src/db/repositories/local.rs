//! In-memory repository for local runs and tests.
//!
//! Devices and settings loaded from the TOML config live here for the
//! lifetime of the daemon.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::db::repository::{
    DeviceRepository, ErrorContext, RepositoryError, RepositoryResult, SettingsRepository,
};
use crate::models::{Device, DeviceId, DeviceSettings};

#[derive(Debug, Default)]
struct LocalData {
    devices: BTreeMap<DeviceId, Device>,
    settings: BTreeMap<DeviceId, DeviceSettings>,
}

/// Thread-safe in-memory device/settings store.
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-populated with devices and their settings.
    pub fn from_entries(entries: impl IntoIterator<Item = (Device, Option<DeviceSettings>)>) -> Self {
        let repo = Self::new();
        for (device, settings) in entries {
            let id = device.id;
            repo.upsert_device(device);
            if let Some(settings) = settings {
                repo.set_settings(id, settings);
            }
        }
        repo
    }

    /// Insert or replace a device.
    pub fn upsert_device(&self, device: Device) {
        self.data.write().devices.insert(device.id, device);
    }

    /// Insert or replace the settings of a device.
    pub fn set_settings(&self, device_id: DeviceId, settings: DeviceSettings) {
        self.data.write().settings.insert(device_id, settings);
    }

    /// Drop a device's settings, leaving the device registered.
    pub fn clear_settings(&self, device_id: DeviceId) -> Option<DeviceSettings> {
        self.data.write().settings.remove(&device_id)
    }

    /// Remove a device and its settings.
    ///
    /// # Errors
    /// `RepositoryError::NotFound` if the device is unknown.
    pub fn remove_device(&self, device_id: DeviceId) -> RepositoryResult<Device> {
        let mut data = self.data.write();
        data.settings.remove(&device_id);
        data.devices.remove(&device_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Device {} not found", device_id),
                ErrorContext::new("remove_device")
                    .with_entity("device")
                    .with_entity_id(device_id),
            )
        })
    }

    pub fn device_count(&self) -> usize {
        self.data.read().devices.len()
    }
}

#[async_trait]
impl DeviceRepository for LocalRepository {
    async fn list_devices(&self) -> RepositoryResult<Vec<Device>> {
        Ok(self.data.read().devices.values().cloned().collect())
    }
}

#[async_trait]
impl SettingsRepository for LocalRepository {
    async fn get_device_settings(
        &self,
        device_id: DeviceId,
    ) -> RepositoryResult<Option<DeviceSettings>> {
        Ok(self.data.read().settings.get(&device_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::City;

    fn device(id: i64) -> Device {
        Device {
            id: DeviceId(id),
            name: format!("speaker-{}", id),
        }
    }

    #[tokio::test]
    async fn test_devices_listed_in_id_order() {
        let repo = LocalRepository::new();
        repo.upsert_device(device(3));
        repo.upsert_device(device(1));
        repo.upsert_device(device(2));

        let ids: Vec<i64> = repo
            .list_devices()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id.value())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_settings_roundtrip_and_absence() {
        let settings = DeviceSettings {
            method: Some("MWL".into()),
            city: Some(City {
                name: "Paris".into(),
                lat: 48.8566,
                lon: 2.3522,
            }),
            ..Default::default()
        };
        let repo = LocalRepository::from_entries(vec![
            (device(1), Some(settings.clone())),
            (device(2), None),
        ]);

        assert_eq!(
            repo.get_device_settings(DeviceId(1)).await.unwrap(),
            Some(settings)
        );
        assert_eq!(repo.get_device_settings(DeviceId(2)).await.unwrap(), None);
        assert_eq!(repo.get_device_settings(DeviceId(9)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_device() {
        let repo = LocalRepository::from_entries(vec![(device(1), Some(DeviceSettings::default()))]);
        let clone = repo.clone();

        assert_eq!(clone.remove_device(DeviceId(1)).unwrap().name, "speaker-1");
        assert_eq!(repo.device_count(), 0);
        assert!(repo.get_device_settings(DeviceId(1)).await.unwrap().is_none());

        let err = repo.remove_device(DeviceId(1)).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(err.context().entity_id.as_deref(), Some("1"));
    }
}
