//! # Codec Configuration
//!
//! Loaded once at startup from TOML.
//!
//! ```toml
//! [codec]
//! float_epsilon = 0.01
//! log_rejections = true
//!
//! [[weapon]]
//! code = 31
//! name = "m4"
//! slot = 5
//! magazine = true
//! ```
//!
//! An empty weapon list means the built-in roster.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::{WeaponSpec, WeaponTable};

/// Tuning knobs of the frame codec.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Health and armor changes at or below this are not sent.
    pub float_epsilon: f32,
    /// Log stale and desynchronized frames.
    pub log_rejections: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            float_epsilon: 0.01,
            log_rejections: true,
        }
    }
}

/// Full configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaSyncConfig {
    /// Codec settings.
    pub codec: CodecConfig,
    /// Weapon roster override.
    pub weapon: Vec<WeaponSpec>,
}

impl DeltaSyncConfig {
    /// Parses a configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Builds the weapon table this configuration describes.
    pub fn weapon_table(&self) -> Result<WeaponTable, ConfigError> {
        if self.weapon.is_empty() {
            Ok(WeaponTable::standard())
        } else {
            WeaponTable::from_specs(self.weapon.iter().cloned())
        }
    }
}
