//! # Weapon Sub-Codec
//!
//! Nested differential block for the held weapon.
//!
//! ```text
//! ?selection [type 8, slot 4]
//! if magazine-fed(type):  ?ammo [clip compressed, total compressed]
//! yaw 16
//! if full aim:            origin 3 x f32, target 3 x f32
//! ```
//!
//! Reading and applying are separate. [`read_weapon_block`] consumes the
//! block using only wire data, so the bit count never depends on whether the
//! peer's weapon agrees with ours. [`apply_weapon`] then decides what, if
//! anything, reaches the player.

use deltasync_core::{BitReader, BitWriter};

use super::snapshot::WeaponSnapshot;
use crate::error::{FrameError, FrameResult};
use crate::integration::SyncedPlayer;
use crate::protocol::{
    is_full_aim, AimData, AimVectors, AmmoState, ControllerState, WeaponCode, WeaponFrame,
    WeaponTable, MAX_WEAPON_SLOT, WEAPON_SLOT_BITS,
};

/// Which parts of the weapon block carried a payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponChanges {
    /// Slot and type were sent.
    pub selection: bool,
    /// Clip and total were sent.
    pub ammo: bool,
}

/// A weapon block as read off the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponBlock {
    /// Slot the peer reports.
    pub slot: u8,
    /// Type the peer reports. It alone decided the layout.
    pub weapon_type: WeaponCode,
    /// Ammo, for magazine-fed types.
    pub ammo: Option<AmmoState>,
    /// Aim state.
    pub aim: AimData,
    /// Which sub-blocks carried a payload.
    pub changes: WeaponChanges,
}

/// Result of checking a reported weapon against the authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeaponVerdict {
    /// The peer holds what we think it holds.
    Correct,
    /// Probably stale data from before a weapon switch.
    Mismatch {
        /// Type on the wire.
        reported: WeaponCode,
        /// Type the authority has.
        expected: WeaponCode,
    },
}

impl WeaponVerdict {
    /// True for [`WeaponVerdict::Correct`].
    #[inline]
    #[must_use]
    pub const fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Writes a weapon block and returns the baseline the peer will hold.
pub fn write_weapon_block(
    writer: &mut BitWriter,
    weapon: &WeaponFrame,
    controller: &ControllerState,
    baseline: &WeaponSnapshot,
    table: &WeaponTable,
) -> FrameResult<(WeaponSnapshot, WeaponChanges)> {
    if weapon.slot > MAX_WEAPON_SLOT {
        return Err(FrameError::SlotOutOfRange(weapon.slot));
    }

    let mut next = *baseline;
    let mut changes = WeaponChanges::default();

    changes.selection = weapon.slot != baseline.slot || weapon.weapon_type != baseline.weapon_type;
    writer.write_bit(changes.selection)?;
    if changes.selection {
        writer.write_u8(weapon.weapon_type)?;
        writer.write_bits(u32::from(weapon.slot), WEAPON_SLOT_BITS)?;
        next.slot = weapon.slot;
        next.weapon_type = weapon.weapon_type;
    }

    if table.has_magazine(weapon.weapon_type) {
        let ammo = weapon.ammo.unwrap_or(baseline.ammo);
        changes.ammo = ammo != baseline.ammo;
        writer.write_bit(changes.ammo)?;
        if changes.ammo {
            writer.write_compressed(u32::from(ammo.in_clip))?;
            writer.write_compressed(u32::from(ammo.total))?;
            next.ammo = ammo;
        }
    }

    writer.write_angle(weapon.aim.yaw)?;
    if is_full_aim(controller) {
        let vectors = weapon.aim.vectors.unwrap_or_default();
        writer.write_vector(vectors.origin)?;
        writer.write_vector(vectors.target)?;
    }

    Ok((next, changes))
}

/// Reads a weapon block and returns it with the updated baseline.
///
/// While the selection is unchanged the baseline type decides the layout,
/// which is exactly what the encoder used.
pub fn read_weapon_block(
    reader: &mut BitReader,
    controller: &ControllerState,
    baseline: &WeaponSnapshot,
    table: &WeaponTable,
) -> FrameResult<(WeaponBlock, WeaponSnapshot)> {
    let mut next = *baseline;
    let mut changes = WeaponChanges::default();

    changes.selection = reader.read_bit()?;
    if changes.selection {
        next.weapon_type = reader.read_u8()?;
        next.slot = reader.read_bits(WEAPON_SLOT_BITS)? as u8;
    }

    let ammo = if table.has_magazine(next.weapon_type) {
        changes.ammo = reader.read_bit()?;
        if changes.ammo {
            next.ammo = AmmoState {
                in_clip: read_ammo_count(reader)?,
                total: read_ammo_count(reader)?,
            };
        }
        Some(next.ammo)
    } else {
        None
    };

    let yaw = reader.read_angle()?;
    let vectors = if is_full_aim(controller) {
        Some(AimVectors {
            origin: reader.read_vector()?,
            target: reader.read_vector()?,
        })
    } else {
        None
    };

    let block = WeaponBlock {
        slot: next.slot,
        weapon_type: next.weapon_type,
        ammo,
        aim: AimData { yaw, vectors },
        changes,
    };
    Ok((block, next))
}

/// Ammo counts are 16-bit; larger wire values saturate.
fn read_ammo_count(reader: &mut BitReader) -> FrameResult<u16> {
    let value = reader.read_compressed()?;
    Ok(u16::try_from(value).unwrap_or(u16::MAX))
}

/// Compares the reported type against the authority's.
#[inline]
#[must_use]
pub const fn check_weapon(reported: WeaponCode, expected: WeaponCode) -> WeaponVerdict {
    if reported == expected {
        WeaponVerdict::Correct
    } else {
        WeaponVerdict::Mismatch { reported, expected }
    }
}

/// Applies a read block to the player.
///
/// Only the verdict reaches the player on a mismatch.
pub fn apply_weapon<P: SyncedPlayer + ?Sized>(
    player: &mut P,
    block: &WeaponBlock,
    verdict: WeaponVerdict,
) {
    player.set_weapon_correct(verdict.is_correct());
    if !verdict.is_correct() {
        return;
    }

    player.set_weapon_slot(block.slot);
    player.set_ammo(block.ammo.unwrap_or(AmmoState::UNLIMITED));
    player.set_aim_yaw(block.aim.yaw);
    if let Some(vectors) = block.aim.vectors {
        player.set_aim_vectors(vectors);
    }
}

/// Applies a frame without a weapon: bare hands.
pub fn apply_unarmed<P: SyncedPlayer + ?Sized>(player: &mut P) {
    player.set_weapon_slot(0);
    player.set_ammo(AmmoState::UNLIMITED);
}
