//! Repository implementations module.
//!
//! - `local`: In-memory implementation backed by the TOML config
pub mod local;

pub use local::LocalRepository;
