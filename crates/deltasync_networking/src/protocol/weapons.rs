//! # Weapon Table
//!
//! Read-only weapon properties shared by every connection.
//!
//! The table decides structure, not just semantics: whether a weapon is
//! magazine-fed controls whether an ammo sub-block exists on the wire. Both
//! peers must therefore load the same table.
//!
//! ## TOML Format
//!
//! ```toml
//! [[weapon]]
//! code = 31
//! name = "m4"
//! slot = 5
//! magazine = true
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::fields::{WeaponCode, MAX_WEAPON_SLOT};
use crate::error::ConfigError;

/// Properties of one weapon type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Wire code.
    pub code: WeaponCode,
    /// Script-facing name.
    pub name: String,
    /// Inventory slot the weapon lives in.
    pub slot: u8,
    /// Magazine-fed weapons carry clip and total ammo.
    #[serde(default)]
    pub magazine: bool,
}

/// Standard roster: (code, name, slot).
///
/// Slots 2 through 9 are the magazine-fed ones.
const STANDARD_WEAPONS: &[(WeaponCode, &str, u8)] = &[
    (0, "fist", 0),
    (1, "brassknuckle", 0),
    (2, "golfclub", 1),
    (3, "nightstick", 1),
    (4, "knife", 1),
    (5, "bat", 1),
    (6, "shovel", 1),
    (7, "poolstick", 1),
    (8, "katana", 1),
    (9, "chainsaw", 1),
    (14, "flowers", 10),
    (15, "cane", 10),
    (16, "grenade", 8),
    (17, "teargas", 8),
    (18, "molotov", 8),
    (22, "pistol", 2),
    (23, "silenced_pistol", 2),
    (24, "desert_eagle", 2),
    (25, "shotgun", 3),
    (26, "sawnoff_shotgun", 3),
    (27, "spas12_shotgun", 3),
    (28, "uzi", 4),
    (29, "mp5", 4),
    (30, "ak47", 5),
    (31, "m4", 5),
    (32, "tec9", 4),
    (33, "rifle", 6),
    (34, "sniper_rifle", 6),
    (35, "rocket_launcher", 7),
    (36, "rocket_launcher_hs", 7),
    (37, "flamethrower", 7),
    (38, "minigun", 7),
    (39, "satchel", 8),
    (40, "detonator", 12),
    (41, "spraycan", 9),
    (42, "extinguisher", 9),
    (43, "camera", 9),
    (44, "nightvision", 11),
    (45, "infrared", 11),
    (46, "parachute", 11),
];

/// Lookup table of weapon properties.
#[derive(Clone, Debug, Default)]
pub struct WeaponTable {
    by_code: HashMap<WeaponCode, WeaponSpec>,
    by_name: HashMap<String, WeaponCode>,
}

impl WeaponTable {
    /// Builds a table from a list of specs.
    ///
    /// Rejects duplicate codes or names and slots that do not fit the wire.
    pub fn from_specs(specs: impl IntoIterator<Item = WeaponSpec>) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for spec in specs {
            if spec.slot > MAX_WEAPON_SLOT {
                return Err(ConfigError::InvalidWeaponTable(format!(
                    "weapon {} uses slot {}, max is {MAX_WEAPON_SLOT}",
                    spec.code, spec.slot
                )));
            }
            if table.by_name.insert(spec.name.clone(), spec.code).is_some() {
                return Err(ConfigError::InvalidWeaponTable(format!(
                    "duplicate weapon name {:?}",
                    spec.name
                )));
            }
            if let Some(previous) = table.by_code.insert(spec.code, spec) {
                return Err(ConfigError::InvalidWeaponTable(format!(
                    "duplicate weapon code {}",
                    previous.code
                )));
            }
        }
        Ok(table)
    }

    /// The built-in roster.
    #[must_use]
    pub fn standard() -> Self {
        let by_code: HashMap<WeaponCode, WeaponSpec> = STANDARD_WEAPONS
            .iter()
            .map(|&(code, name, slot)| {
                let spec = WeaponSpec {
                    code,
                    name: name.to_owned(),
                    slot,
                    magazine: (2..=9).contains(&slot),
                };
                (code, spec)
            })
            .collect();
        let by_name = by_code
            .values()
            .map(|spec| (spec.name.clone(), spec.code))
            .collect();
        Self { by_code, by_name }
    }

    /// Parses a `[[weapon]]` TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct WeaponFile {
            #[serde(default)]
            weapon: Vec<WeaponSpec>,
        }

        let file: WeaponFile = toml::from_str(source)?;
        Self::from_specs(file.weapon)
    }

    /// Looks up a weapon by code.
    #[inline]
    #[must_use]
    pub fn get(&self, code: WeaponCode) -> Option<&WeaponSpec> {
        self.by_code.get(&code)
    }

    /// Looks up a weapon code by name.
    #[must_use]
    pub fn code_of(&self, name: &str) -> Option<WeaponCode> {
        self.by_name.get(name).copied()
    }

    /// Whether an ammo sub-block exists for this weapon type.
    ///
    /// Unknown codes have no magazine.
    #[inline]
    #[must_use]
    pub fn has_magazine(&self, code: WeaponCode) -> bool {
        self.get(code).is_some_and(|spec| spec.magazine)
    }

    /// Slot a weapon type lives in.
    #[inline]
    #[must_use]
    pub fn slot_of(&self, code: WeaponCode) -> Option<u8> {
        self.get(code).map(|spec| spec.slot)
    }

    /// Number of known weapon types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// True if no weapon is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
