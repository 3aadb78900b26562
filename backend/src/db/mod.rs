//! Device and settings storage.
//!
//! The scheduler depends only on the repository traits, so storage can be
//! swapped without touching scheduling code.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  DeviceScheduler                                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository.rs)                      │
//! │  - DeviceRepository::list_devices                       │
//! │  - SettingsRepository::get_device_settings              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │        (in-memory, seeded from config)        │
//!     └──────────────────────────────────────────────┘
//! ```

pub mod repositories;
pub mod repository;

pub use repositories::LocalRepository;
pub use repository::{
    DeviceRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    SettingsRepository,
};
