//! # Player Record
//!
//! Plain-data [`SyncedPlayer`] for hosts without their own entity type.

use deltasync_core::{EntityRef, Vector3};

use super::traits::SyncedPlayer;
use crate::protocol::{
    AimData, AimVectors, AmmoState, ControllerState, DamageReport, StatusFlags, WeaponCode,
};

/// Player state held as plain fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerRecord {
    /// Controller input.
    pub controller: ControllerState,
    /// Boolean state.
    pub flags: StatusFlags,
    /// Contact entity.
    pub contact: Option<EntityRef>,
    /// Position relative to the contact entity.
    pub contact_position: Vector3,
    /// Absolute position.
    pub position: Vector3,
    /// Body rotation.
    pub rotation: f32,
    /// Velocity.
    pub velocity: Vector3,
    /// Health.
    pub health: f32,
    /// Armor.
    pub armor: f32,
    /// Dead flag, owned by the entity system.
    pub dead: bool,
    /// Camera rotation.
    pub camera_rotation: f32,
    /// Selected slot.
    pub weapon_slot: u8,
    /// Weapon type in the selected slot.
    pub weapon_type: WeaponCode,
    /// Ammo of the held weapon.
    pub ammo: AmmoState,
    /// Aim of the held weapon.
    pub aim: AimData,
    /// Outcome of the last weapon check.
    pub weapon_correct: bool,
    /// Last reported hit.
    pub damage_info: Option<DamageReport>,
}

impl PlayerRecord {
    /// A freshly spawned player: full health, standing, unarmed.
    #[must_use]
    pub fn spawned() -> Self {
        Self {
            flags: StatusFlags::new(StatusFlags::ON_GROUND),
            health: 100.0,
            ammo: AmmoState::UNLIMITED,
            weapon_correct: true,
            ..Self::default()
        }
    }
}

impl SyncedPlayer for PlayerRecord {
    fn controller(&self) -> ControllerState {
        self.controller
    }

    fn set_controller(&mut self, state: ControllerState) {
        self.controller = state;
    }

    fn status_flags(&self) -> StatusFlags {
        self.flags
    }

    fn set_status_flags(&mut self, flags: StatusFlags) {
        self.flags = flags;
    }

    fn contact(&self) -> Option<EntityRef> {
        self.contact
    }

    fn set_contact(&mut self, contact: Option<EntityRef>) {
        self.contact = contact;
    }

    fn set_contact_position(&mut self, relative: Vector3) {
        self.contact_position = relative;
    }

    fn position(&self) -> Vector3 {
        self.position
    }

    fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    fn velocity(&self) -> Vector3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vector3) {
        self.velocity = velocity;
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    fn armor(&self) -> f32 {
        self.armor
    }

    fn set_armor(&mut self, armor: f32) {
        self.armor = armor;
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn camera_rotation(&self) -> f32 {
        self.camera_rotation
    }

    fn set_camera_rotation(&mut self, rotation: f32) {
        self.camera_rotation = rotation;
    }

    fn weapon_slot(&self) -> u8 {
        self.weapon_slot
    }

    fn set_weapon_slot(&mut self, slot: u8) {
        self.weapon_slot = slot;
    }

    fn weapon_type(&self) -> WeaponCode {
        self.weapon_type
    }

    fn ammo(&self) -> AmmoState {
        self.ammo
    }

    fn set_ammo(&mut self, ammo: AmmoState) {
        self.ammo = ammo;
    }

    fn aim(&self) -> AimData {
        self.aim
    }

    fn set_aim_yaw(&mut self, yaw: f32) {
        self.aim.yaw = yaw;
    }

    fn set_aim_vectors(&mut self, vectors: AimVectors) {
        self.aim.vectors = Some(vectors);
    }

    fn set_weapon_correct(&mut self, correct: bool) {
        self.weapon_correct = correct;
    }

    fn damage_info(&self) -> Option<DamageReport> {
        self.damage_info
    }

    fn set_damage_info(&mut self, report: DamageReport) {
        self.damage_info = Some(report);
    }
}
