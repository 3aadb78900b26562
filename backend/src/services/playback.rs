//! Playback collaborator interface.
//!
//! Prayer jobs call a [`DevicePlayer`] when they fire. Failures are the
//! player's to report; the scheduler logs them and carries on.

use async_trait::async_trait;
use log::info;

use crate::models::{AudioRef, DeviceId};

/// Error raised by a playback collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Device {0} unreachable: {1}")]
    Unreachable(DeviceId, String),

    #[error("Audio '{0}' not found")]
    AudioNotFound(AudioRef),

    #[error("Playback failed: {0}")]
    Other(String),
}

/// Plays audio on a device.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; jobs for different devices may
/// call `play` concurrently.
#[async_trait]
pub trait DevicePlayer: Send + Sync {
    /// Start playing `audio` on `device_id` at `volume` (0-100).
    async fn play(&self, device_id: DeviceId, audio: &AudioRef, volume: u8)
        -> Result<(), PlaybackError>;
}

/// Player that only logs what it would play.
#[derive(Debug, Clone, Default)]
pub struct LoggingPlayer;

#[async_trait]
impl DevicePlayer for LoggingPlayer {
    async fn play(
        &self,
        device_id: DeviceId,
        audio: &AudioRef,
        volume: u8,
    ) -> Result<(), PlaybackError> {
        info!("Playing '{}' on device {} at volume {}", audio, device_id, volume);
        Ok(())
    }
}
