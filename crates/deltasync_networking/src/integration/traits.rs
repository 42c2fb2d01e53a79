//! # Integration Traits
//!
//! The narrow interfaces the codec uses to reach the entity system.
//!
//! The codec never owns players or the world. It reads and writes them
//! through these traits, one field at a time, under whatever single-writer
//! discipline the entity system already enforces.

use std::collections::HashMap;

use deltasync_core::{EntityRef, Vector3};

use crate::protocol::{
    AimData, AimVectors, AmmoState, ControllerState, DamageReport, StatusFlags, WeaponCode,
};

/// Authoritative player state the codec synchronizes.
pub trait SyncedPlayer {
    /// Current controller input.
    fn controller(&self) -> ControllerState;
    /// Replaces the controller input.
    fn set_controller(&mut self, state: ControllerState);

    /// Boolean state as the entity reports it.
    fn status_flags(&self) -> StatusFlags;
    /// Applies a decoded flag set.
    fn set_status_flags(&mut self, flags: StatusFlags);

    /// Entity the player stands on.
    fn contact(&self) -> Option<EntityRef>;
    /// Replaces the contact entity.
    fn set_contact(&mut self, contact: Option<EntityRef>);
    /// Stores the position relative to the contact entity.
    fn set_contact_position(&mut self, relative: Vector3);

    /// Absolute position.
    fn position(&self) -> Vector3;
    /// Moves the player.
    fn set_position(&mut self, position: Vector3);

    /// Body rotation in radians.
    fn rotation(&self) -> f32;
    /// Sets the body rotation.
    fn set_rotation(&mut self, rotation: f32);

    /// Velocity.
    fn velocity(&self) -> Vector3;
    /// Sets the velocity.
    fn set_velocity(&mut self, velocity: Vector3);

    /// Health.
    fn health(&self) -> f32;
    /// Sets the health.
    fn set_health(&mut self, health: f32);
    /// Armor.
    fn armor(&self) -> f32;
    /// Sets the armor.
    fn set_armor(&mut self, armor: f32);
    /// True once the entity system has the player dead.
    fn is_dead(&self) -> bool;

    /// Camera rotation in radians.
    fn camera_rotation(&self) -> f32;
    /// Sets the camera rotation.
    fn set_camera_rotation(&mut self, rotation: f32);

    /// Selected weapon slot; 0 is unarmed.
    fn weapon_slot(&self) -> u8;
    /// Selects a weapon slot.
    fn set_weapon_slot(&mut self, slot: u8);
    /// Weapon type the authority believes the player holds.
    fn weapon_type(&self) -> WeaponCode;
    /// Ammo of the held weapon.
    fn ammo(&self) -> AmmoState;
    /// Sets the ammo of the held weapon.
    fn set_ammo(&mut self, ammo: AmmoState);
    /// Aim of the held weapon.
    fn aim(&self) -> AimData;
    /// Sets the arm direction.
    fn set_aim_yaw(&mut self, yaw: f32);
    /// Sets the precise aim vectors.
    fn set_aim_vectors(&mut self, vectors: AimVectors);
    /// Records whether the last weapon report matched the authority.
    fn set_weapon_correct(&mut self, correct: bool);

    /// Last reported hit.
    fn damage_info(&self) -> Option<DamageReport>;
    /// Records a reported hit.
    fn set_damage_info(&mut self, report: DamageReport);
}

/// Resolves entity references to positions.
pub trait EntityDirectory {
    /// Absolute position of a live entity, `None` if it is unknown.
    fn position_of(&self, entity: EntityRef) -> Option<Vector3>;
}

impl EntityDirectory for HashMap<EntityRef, Vector3> {
    fn position_of(&self, entity: EntityRef) -> Option<Vector3> {
        self.get(&entity).copied()
    }
}

/// A world with no other entities in it.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyWorld;

impl EntityDirectory for EmptyWorld {
    fn position_of(&self, _entity: EntityRef) -> Option<Vector3> {
        None
    }
}
