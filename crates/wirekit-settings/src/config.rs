//! Configuration and settings management for WireKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in the platform configuration directory.
//!
//! Configuration is organized into logical sections:
//! - Slicing (rail heights, ruling span)
//! - Corner synchronization (angle threshold, lead-in point)
//! - Kerf compensation (wire radius, guide heights)
//! - Numeric tolerances

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wirekit_camtools::{KerfParams, PipelineParams};
use wirekit_core::{Point3, Tolerances};

/// Slicing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicingSettings {
    /// Bottom rail height, taken from the model when unset
    pub bottom_z: Option<f64>,
    /// Top rail height, taken from the model when unset
    pub top_z: Option<f64>,
    /// Fraction of the part height a ruling must span
    pub span_percentage: f64,
}

impl Default for SlicingSettings {
    fn default() -> Self {
        Self {
            bottom_z: None,
            top_z: None,
            span_percentage: 0.9,
        }
    }
}

/// Corner synchronization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Corners with an interior angle below this are synchronized (degrees)
    pub angle_threshold_deg: f64,
    /// Preferred start point on the top rail
    pub lead_in: Option<[f64; 3]>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            angle_threshold_deg: 135.0,
            lead_in: None,
        }
    }
}

/// Kerf compensation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KerfSettings {
    pub enabled: bool,
    /// Wire radius plus spark gap in mm
    pub wire_radius: f64,
    /// Lower wire guide height in mm
    pub bottom_guide_z: f64,
    /// Upper wire guide height in mm
    pub top_guide_z: f64,
}

impl Default for KerfSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wire_radius: 0.125,
            bottom_guide_z: 0.0,
            top_guide_z: 50.0,
        }
    }
}

/// Complete job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub slicing: SlicingSettings,
    pub sync: SyncSettings,
    pub kerf: KerfSettings,
    pub tolerances: Tolerances,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config location, `<config dir>/wirekit/config.toml`.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("wirekit");
        path.push("config.toml");
        path
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let slicing = &self.slicing;
        let heights = [
            ("slicing.bottom_z", slicing.bottom_z),
            ("slicing.top_z", slicing.top_z),
        ];
        for (key, value) in heights {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(SettingsError::invalid(key, "must be finite"));
            }
        }
        if let (Some(bottom), Some(top)) = (slicing.bottom_z, slicing.top_z) {
            if top <= bottom {
                return Err(SettingsError::invalid(
                    "slicing.top_z",
                    "must be above slicing.bottom_z",
                ));
            }
        }
        if !(0.0..=1.0).contains(&slicing.span_percentage) {
            return Err(SettingsError::invalid("slicing.span_percentage", "must be within 0..1"));
        }

        let angle = self.sync.angle_threshold_deg;
        if !angle.is_finite() || !(0.0..=180.0).contains(&angle) {
            return Err(SettingsError::invalid("sync.angle_threshold_deg", "must be within 0..180"));
        }
        if self.sync.lead_in.is_some_and(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(SettingsError::invalid("sync.lead_in", "must be finite"));
        }

        let kerf = &self.kerf;
        if !kerf.wire_radius.is_finite() || kerf.wire_radius <= 0.0 {
            return Err(SettingsError::invalid("kerf.wire_radius", "must be positive"));
        }
        if !kerf.bottom_guide_z.is_finite() || !kerf.top_guide_z.is_finite() {
            return Err(SettingsError::invalid("kerf", "guide heights must be finite"));
        }
        if kerf.top_guide_z <= kerf.bottom_guide_z {
            return Err(SettingsError::invalid(
                "kerf.top_guide_z",
                "must be above kerf.bottom_guide_z",
            ));
        }

        if !self.tolerances.is_valid() {
            return Err(SettingsError::invalid("tolerances", "must be finite and positive"));
        }
        Ok(())
    }

    /// Parameters for a pipeline session.
    pub fn to_session_params(&self) -> PipelineParams {
        PipelineParams {
            bottom_z: self.slicing.bottom_z,
            top_z: self.slicing.top_z,
            span_percentage: self.slicing.span_percentage,
            angle_threshold_deg: self.sync.angle_threshold_deg,
            lead_in: self.sync.lead_in.map(|[x, y, z]| Point3::new(x, y, z)),
            kerf: self.kerf.enabled.then_some(KerfParams {
                wire_radius: self.kerf.wire_radius,
                bottom_guide_z: self.kerf.bottom_guide_z,
                top_guide_z: self.kerf.top_guide_z,
            }),
            tolerances: self.tolerances,
        }
    }
}
