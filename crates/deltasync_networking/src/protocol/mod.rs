//! # Wire Protocol
//!
//! Field-level wire forms, the frame record and the weapon table.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ resync (2) │ time (8)                                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │ ?controller │ ?flags │ ?contact                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │ position │ rotation │ [velocity] │ ?health+armor │ camera    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ [weapon block] │ damage bit [+ report]                       │
//! └──────────────────────────────────────────────────────────────┘
//!   ?x  = change bit, payload only when set
//!   [x] = present only when a status flag says so
//! ```
//!
//! No length prefixes anywhere.

mod fields;
mod frame;
mod weapons;

pub use fields::{
    is_full_aim, BodyPart, ControllerState, DamageReport, StatusFlags, WeaponCode,
    ARMOR_FORMAT, BODY_PART_BITS, HEALTH_FORMAT, MAX_WEAPON_SLOT, POSITION_FORMAT,
    RESYNC_TOKEN_BITS, STATUS_FLAG_BITS, VELOCITY_FORMAT, WEAPON_SLOT_BITS,
};
pub use frame::{AimData, AimVectors, AmmoState, SyncFrame, WeaponFrame};
pub use weapons::{WeaponSpec, WeaponTable};
