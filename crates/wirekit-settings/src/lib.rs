//! WireKit Settings Crate
//!
//! Job configuration: slicing heights, corner sync, kerf and tolerances,
//! persisted as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{Config, KerfSettings, SlicingSettings, SyncSettings};
pub use error::{SettingsError, SettingsResult};
