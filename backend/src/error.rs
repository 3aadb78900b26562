//! Error types for the prayer-time core.
//!
//! Only genuine failures live here. Undefined sun geometry (polar day/night)
//! is modelled as absent values in [`crate::models::PrayerTimeSet`], and
//! per-device scheduling problems are reported through
//! [`crate::scheduler::ScheduleResult`] instead of being raised.

use crate::db::RepositoryError;

/// Result type for prayer-time operations
pub type Result<T> = std::result::Result<T, AdhanError>;

/// Error type for prayer-time computation and configuration.
#[derive(Debug, thiserror::Error)]
pub enum AdhanError {
    /// Unknown method name, unresolvable timezone or unreadable config.
    /// Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Coordinates or calendar values outside their valid range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure reported by a settings/device collaborator.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AdhanError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether this error comes from static configuration rather than runtime data.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
