//! # Sync Frame
//!
//! The plain record one encode or decode call works on.
//!
//! A frame exists only for the duration of a single call. Presence of every
//! optional part is carried by the `Option`s here; the encoder derives the
//! wire flags from them so flags and payload can never disagree.

use deltasync_core::{EntityRef, Vector3};

use super::fields::{
    is_full_aim, ControllerState, DamageReport, StatusFlags, WeaponCode,
};
use crate::integration::SyncedPlayer;

/// Clip and reserve ammunition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AmmoState {
    /// Rounds in the current clip.
    pub in_clip: u16,
    /// Rounds in total.
    pub total: u16,
}

impl AmmoState {
    /// What non-magazine weapons and bare hands report.
    pub const UNLIMITED: Self = Self {
        in_clip: 1,
        total: 1,
    };
}

/// Precise aim vectors, sent only while aiming or firing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AimVectors {
    /// Where the shot originates.
    pub origin: Vector3,
    /// Where it is aimed.
    pub target: Vector3,
}

/// Aim state of the held weapon.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AimData {
    /// Arm direction in radians.
    pub yaw: f32,
    /// Present only under full aim.
    pub vectors: Option<AimVectors>,
}

/// Weapon part of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeaponFrame {
    /// Selected slot.
    pub slot: u8,
    /// Weapon type in that slot.
    pub weapon_type: WeaponCode,
    /// Ammo, for magazine-fed types.
    pub ammo: Option<AmmoState>,
    /// Aim state.
    pub aim: AimData,
}

/// One frame of player state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SyncFrame {
    /// Controller input.
    pub controller: ControllerState,
    /// Boolean state. Presence bits are recomputed from the options below.
    pub flags: StatusFlags,
    /// Entity the player stands on, if any.
    pub contact: Option<EntityRef>,
    /// Absolute position.
    pub position: Vector3,
    /// Body rotation in radians.
    pub rotation: f32,
    /// Velocity, when it is being synchronized.
    pub velocity: Option<Vector3>,
    /// Health.
    pub health: f32,
    /// Armor.
    pub armor: f32,
    /// Camera rotation in radians.
    pub camera_rotation: f32,
    /// Held weapon, if any.
    pub weapon: Option<WeaponFrame>,
    /// Fresh hit to report.
    pub damage: Option<DamageReport>,
}

impl SyncFrame {
    /// Captures a frame from the live player.
    ///
    /// Velocity is synchronized while airborne or when the player asks for
    /// it. Slot 0 means unarmed. Aim vectors are kept only under full aim.
    #[must_use]
    pub fn capture<P: SyncedPlayer + ?Sized>(player: &P) -> Self {
        let controller = player.controller();
        let flags = player.status_flags();

        let syncing_velocity = !flags.contains(StatusFlags::ON_GROUND)
            || flags.contains(StatusFlags::SYNCING_VELOCITY);

        let slot = player.weapon_slot();
        let weapon = (slot != 0).then(|| {
            let mut aim = player.aim();
            if !is_full_aim(&controller) {
                aim.vectors = None;
            }
            WeaponFrame {
                slot,
                weapon_type: player.weapon_type(),
                ammo: Some(player.ammo()),
                aim,
            }
        });

        let mut frame = Self {
            controller,
            flags,
            contact: player.contact(),
            position: player.position(),
            rotation: player.rotation(),
            velocity: syncing_velocity.then(|| player.velocity()),
            health: player.health(),
            armor: player.armor(),
            camera_rotation: player.camera_rotation(),
            weapon,
            damage: None,
        };
        frame.flags = frame.wire_flags();
        frame
    }

    /// Attaches a damage report.
    #[must_use]
    pub fn with_damage(mut self, report: DamageReport) -> Self {
        self.damage = Some(report);
        self
    }

    /// Flags as they go on the wire, with presence bits taken from the
    /// optional fields.
    #[must_use]
    pub fn wire_flags(&self) -> StatusFlags {
        self.flags
            .with(StatusFlags::HAS_CONTACT, self.contact.is_some())
            .with(StatusFlags::HAS_WEAPON, self.weapon.is_some())
            .with(StatusFlags::SYNCING_VELOCITY, self.velocity.is_some())
    }
}
