//! # Field Codec Primitives
//!
//! Wire forms of the individual values a sync frame is made of.
//!
//! ## Widths
//!
//! ```text
//! resync token      2 bits
//! time token        8 bits
//! controller       48 bits  (buttons 16, sticks 2x8, triggers 2x8)
//! status flags     12 bits
//! entity ref       17 bits  (all ones = none)
//! position     3 x 24 bits  (signed 14.10)
//! rotation         16 bits  (angle)
//! velocity     3 x 16 bits  (signed 6.10)
//! health/armor 2 x 16 bits  (unsigned 8.8)
//! camera           32 bits  (f32)
//! weapon slot       4 bits
//! body part         3 bits  (code - 3)
//! ```

use bytemuck::{Pod, Zeroable};
use deltasync_core::{BitReader, BitResult, BitWriter, EntityRef, FixedPoint};

use crate::error::{FrameError, FrameResult};

/// Width of the resync token.
pub const RESYNC_TOKEN_BITS: u8 = 2;

/// Width of the status flag set.
pub const STATUS_FLAG_BITS: u8 = 12;

/// Width of a weapon slot index.
pub const WEAPON_SLOT_BITS: u8 = 4;

/// Width of an encoded body part.
pub const BODY_PART_BITS: u8 = 3;

/// Highest slot index that fits [`WEAPON_SLOT_BITS`].
pub const MAX_WEAPON_SLOT: u8 = (1 << WEAPON_SLOT_BITS) - 1;

/// Position components: +-8192 units at 1/1024 precision.
pub const POSITION_FORMAT: FixedPoint = FixedPoint::signed(14, 10);

/// Velocity components: +-32 units per tick at 1/1024 precision.
pub const VELOCITY_FORMAT: FixedPoint = FixedPoint::signed(6, 10);

/// Health: 0 to just under 256 at 1/256 precision.
pub const HEALTH_FORMAT: FixedPoint = FixedPoint::unsigned(8, 8);

/// Armor shares the health format.
pub const ARMOR_FORMAT: FixedPoint = FixedPoint::unsigned(8, 8);

/// Weapon type identifier.
pub type WeaponCode = u8;

/// Full controller state as sampled by the client.
///
/// Size: 6 bytes, 48 bits on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct ControllerState {
    /// Digital buttons, one bit each.
    pub buttons: u16,
    /// Left stick horizontal axis.
    pub left_stick_x: i8,
    /// Left stick vertical axis.
    pub left_stick_y: i8,
    /// Analog left trigger.
    pub left_shoulder2: u8,
    /// Analog right trigger.
    pub right_shoulder2: u8,
}

impl ControllerState {
    /// Wire width.
    pub const BITS: usize = 48;

    /// Button: cross (sprint).
    pub const BUTTON_CROSS: u16 = 1 << 0;
    /// Button: circle (fire).
    pub const BUTTON_CIRCLE: u16 = 1 << 1;
    /// Button: square (jump).
    pub const BUTTON_SQUARE: u16 = 1 << 2;
    /// Button: triangle (enter/exit).
    pub const BUTTON_TRIANGLE: u16 = 1 << 3;
    /// Button: left shoulder.
    pub const LEFT_SHOULDER1: u16 = 1 << 4;
    /// Button: right shoulder (aim).
    pub const RIGHT_SHOULDER1: u16 = 1 << 5;
    /// Button: left stick press (crouch).
    pub const SHOCK_BUTTON_L: u16 = 1 << 6;
    /// Button: walk modifier.
    pub const PED_WALK: u16 = 1 << 7;
    /// Button: d-pad up.
    pub const DPAD_UP: u16 = 1 << 8;
    /// Button: d-pad down.
    pub const DPAD_DOWN: u16 = 1 << 9;
    /// Button: d-pad left.
    pub const DPAD_LEFT: u16 = 1 << 10;
    /// Button: d-pad right.
    pub const DPAD_RIGHT: u16 = 1 << 11;

    /// Returns true if every bit of `button` is pressed.
    #[inline]
    #[must_use]
    pub const fn pressed(self, button: u16) -> bool {
        self.buttons & button == button
    }

    /// Returns a copy with `button` pressed or released.
    #[inline]
    #[must_use]
    pub const fn with_button(mut self, button: u16, pressed: bool) -> Self {
        if pressed {
            self.buttons |= button;
        } else {
            self.buttons &= !button;
        }
        self
    }

    /// Writes the full state.
    pub fn write(&self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_u16(self.buttons)?;
        writer.write_u8(self.left_stick_x as u8)?;
        writer.write_u8(self.left_stick_y as u8)?;
        writer.write_u8(self.left_shoulder2)?;
        writer.write_u8(self.right_shoulder2)
    }

    /// Reads the full state.
    pub fn read(reader: &mut BitReader) -> BitResult<Self> {
        Ok(Self {
            buttons: reader.read_u16()?,
            left_stick_x: reader.read_u8()? as i8,
            left_stick_y: reader.read_u8()? as i8,
            left_shoulder2: reader.read_u8()?,
            right_shoulder2: reader.read_u8()?,
        })
    }
}

/// True when the player is aiming or firing.
///
/// Gates the precise aim vectors. Both directions evaluate it on controller
/// state already known to both sides, so it never travels as its own bit.
#[inline]
#[must_use]
pub const fn is_full_aim(controller: &ControllerState) -> bool {
    controller.pressed(ControllerState::RIGHT_SHOULDER1)
        || controller.pressed(ControllerState::BUTTON_CIRCLE)
}

/// Boolean player state, 12 bits on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct StatusFlags(pub u16);

impl StatusFlags {
    /// Swimming.
    pub const IN_WATER: u16 = 1 << 0;
    /// Standing on something.
    pub const ON_GROUND: u16 = 1 << 1;
    /// Wearing a jetpack.
    pub const HAS_JETPACK: u16 = 1 << 2;
    /// Crouched.
    pub const DUCKED: u16 = 1 << 3;
    /// Wearing goggles.
    pub const GOGGLES: u16 = 1 << 4;
    /// Choking on gas.
    pub const CHOKING: u16 = 1 << 5;
    /// Akimbo arm raised.
    pub const AKIMBO_UP: u16 = 1 << 6;
    /// Burning.
    pub const ON_FIRE: u16 = 1 << 7;
    /// Position is relative to a contact entity.
    pub const HAS_CONTACT: u16 = 1 << 8;
    /// A weapon block follows.
    pub const HAS_WEAPON: u16 = 1 << 9;
    /// A velocity vector follows.
    pub const SYNCING_VELOCITY: u16 = 1 << 10;
    /// Stealth aiming.
    pub const STEALTH_AIMING: u16 = 1 << 11;

    const MASK: u16 = (1 << STATUS_FLAG_BITS) - 1;

    /// Creates a flag set, dropping bits outside the wire width.
    #[inline]
    #[must_use]
    pub const fn new(bits: u16) -> Self {
        Self(bits & Self::MASK)
    }

    /// Returns true if every bit of `flag` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    /// Returns a copy with `flag` set or cleared.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: u16, set: bool) -> Self {
        if set {
            Self::new(self.0 | flag)
        } else {
            Self::new(self.0 & !flag)
        }
    }

    /// Writes the flag set.
    #[inline]
    pub fn write(self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_bits(u32::from(self.0 & Self::MASK), STATUS_FLAG_BITS)
    }

    /// Reads a flag set.
    #[inline]
    pub fn read(reader: &mut BitReader) -> BitResult<Self> {
        Ok(Self::new(reader.read_bits(STATUS_FLAG_BITS)? as u16))
    }
}

/// Body part hit by a damage report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BodyPart {
    /// Torso.
    Torso = 3,
    /// Lower back.
    Ass = 4,
    /// Left arm.
    LeftArm = 5,
    /// Right arm.
    RightArm = 6,
    /// Left leg.
    LeftLeg = 7,
    /// Right leg.
    RightLeg = 8,
    /// Head.
    Head = 9,
}

impl BodyPart {
    /// Lowest body part code.
    const FIRST_CODE: u8 = 3;

    /// Converts from the numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            3 => Some(Self::Torso),
            4 => Some(Self::Ass),
            5 => Some(Self::LeftArm),
            6 => Some(Self::RightArm),
            7 => Some(Self::LeftLeg),
            8 => Some(Self::RightLeg),
            9 => Some(Self::Head),
            _ => None,
        }
    }

    /// The numeric code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Writes the part as `code - 3`.
    #[inline]
    pub fn write(self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_bits(u32::from(self.code() - Self::FIRST_CODE), BODY_PART_BITS)
    }

    /// Reads a part, rejecting the unused top code.
    pub fn read(reader: &mut BitReader) -> FrameResult<Self> {
        let code = reader.read_bits(BODY_PART_BITS)? as u8 + Self::FIRST_CODE;
        Self::from_code(code).ok_or(FrameError::InvalidBodyPart(code))
    }
}

/// A fresh hit reported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageReport {
    /// Who dealt the damage, if anyone.
    pub attacker: Option<EntityRef>,
    /// Weapon used.
    pub weapon_type: WeaponCode,
    /// Where it landed.
    pub body_part: BodyPart,
}

impl DamageReport {
    /// Writes attacker, weapon and body part.
    pub fn write(&self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_entity(self.attacker)?;
        writer.write_u8(self.weapon_type)?;
        self.body_part.write(writer)
    }

    /// Reads attacker, weapon and body part.
    pub fn read(reader: &mut BitReader) -> FrameResult<Self> {
        Ok(Self {
            attacker: reader.read_entity()?,
            weapon_type: reader.read_u8()?,
            body_part: BodyPart::read(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_is_48_bits() {
        let state = ControllerState {
            buttons: ControllerState::BUTTON_CROSS | ControllerState::DPAD_RIGHT,
            left_stick_x: -128,
            left_stick_y: 127,
            left_shoulder2: 255,
            right_shoulder2: 3,
        };

        let mut writer = BitWriter::new();
        state.write(&mut writer).unwrap();
        assert_eq!(writer.bits_written(), ControllerState::BITS);

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(ControllerState::read(&mut reader).unwrap(), state);
    }

    #[test]
    fn test_full_aim_predicate() {
        let idle = ControllerState::default();
        assert!(!is_full_aim(&idle));
        assert!(is_full_aim(
            &idle.with_button(ControllerState::RIGHT_SHOULDER1, true)
        ));
        assert!(is_full_aim(&idle.with_button(ControllerState::BUTTON_CIRCLE, true)));
        assert!(!is_full_aim(&idle.with_button(ControllerState::BUTTON_SQUARE, true)));
    }

    #[test]
    fn test_status_flags_mask() {
        let flags = StatusFlags::new(0xFFFF);
        assert_eq!(flags.0, 0x0FFF);
        assert!(flags.contains(StatusFlags::STEALTH_AIMING));

        let cleared = flags.with(StatusFlags::ON_GROUND, false);
        assert!(!cleared.contains(StatusFlags::ON_GROUND));
        assert!(cleared.contains(StatusFlags::IN_WATER));
    }

    #[test]
    fn test_body_part_codes() {
        for code in 3..=9 {
            let part = BodyPart::from_code(code).unwrap();
            let mut writer = BitWriter::new();
            part.write(&mut writer).unwrap();
            assert_eq!(writer.bits_written(), usize::from(BODY_PART_BITS));
            let mut reader = BitReader::new(writer.as_slice());
            assert_eq!(BodyPart::read(&mut reader).unwrap(), part);
        }
        assert_eq!(BodyPart::from_code(2), None);
        assert_eq!(BodyPart::from_code(10), None);
    }

    #[test]
    fn test_body_part_top_code_is_malformed() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b111, BODY_PART_BITS).unwrap();
        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(
            BodyPart::read(&mut reader),
            Err(FrameError::InvalidBodyPart(10))
        );
    }

    #[test]
    fn test_damage_report_width() {
        let report = DamageReport {
            attacker: EntityRef::new(77),
            weapon_type: 31,
            body_part: BodyPart::Head,
        };
        let mut writer = BitWriter::new();
        report.write(&mut writer).unwrap();
        assert_eq!(writer.bits_written(), 17 + 8 + 3);

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(DamageReport::read(&mut reader).unwrap(), report);
    }
}
