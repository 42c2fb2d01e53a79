//! # Frame Differential Codec
//!
//! Encodes a [`SyncFrame`] against the sent baseline and decodes one against
//! the received baseline, field by field in a fixed order.
//!
//! ## Encode
//!
//! Work happens on a copy of `last_sent`. Only a fully written frame
//! commits the copy, so an overflow never leaves the baseline ahead of the
//! peer.
//!
//! ## Decode
//!
//! ```text
//! context ─→ controller ─→ flags ─→ contact ─→ position ─→ rotation
//!    │                                                        │
//!    └─ rejected: nothing touched         velocity ←──────────┘
//!                                            │
//!   events ←─ health ←─ damage ←─ weapon ←─ camera ←─ health/armor
//! ```
//!
//! Each field updates the player and `last_received` together. A truncated
//! frame keeps the fields applied before the cut and emits no events.
//!
//! Relayed frames carry a latency block between the context and the
//! controller. It is read only once the context admits the frame.

use std::sync::Arc;

use deltasync_core::{BitReader, BitWriter, FixedPoint, Vector3};

use super::context::{read_context, Admission, RejectReason};
use super::events::{derive_events, EventSink, VitalState};
use super::snapshot::{ConnectionSyncState, TimeToken};
use super::weapon::{
    apply_unarmed, apply_weapon, check_weapon, read_weapon_block, write_weapon_block,
    WeaponVerdict,
};
use crate::config::CodecConfig;
use crate::error::{ConfigError, FrameResult};
use crate::integration::{EntityDirectory, SyncedPlayer};
use crate::protocol::{
    ControllerState, DamageReport, StatusFlags, SyncFrame, WeaponTable, ARMOR_FORMAT,
    HEALTH_FORMAT, POSITION_FORMAT, VELOCITY_FORMAT,
};
use crate::DeltaSyncConfig;

/// Converts an absolute position to what goes on the wire.
///
/// With a contact entity the wire carries the offset from it.
#[inline]
#[must_use]
pub fn to_wire_space(position: Vector3, contact_origin: Option<Vector3>) -> Vector3 {
    match contact_origin {
        Some(origin) => position - origin,
        None => position,
    }
}

/// Inverse of [`to_wire_space`].
#[inline]
#[must_use]
pub fn from_wire_space(wire: Vector3, contact_origin: Option<Vector3>) -> Vector3 {
    match contact_origin {
        Some(origin) => wire + origin,
        None => wire,
    }
}

fn quantize_vector(vector: Vector3, format: FixedPoint) -> Vector3 {
    Vector3::new(
        format.quantize(vector.x),
        format.quantize(vector.y),
        format.quantize(vector.z),
    )
}

/// Which change-bits were set in a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Controller input.
    pub controller: bool,
    /// Status flags.
    pub flags: bool,
    /// Contact reference.
    pub contact: bool,
    /// Health and armor.
    pub vitals: bool,
    /// Weapon slot and type.
    pub weapon_selection: bool,
    /// Weapon ammo.
    pub ammo: bool,
    /// Relayed latency.
    pub latency: bool,
}

impl ChangeSet {
    /// Number of change-bits set.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.controller as usize
            + self.flags as usize
            + self.contact as usize
            + self.vitals as usize
            + self.weapon_selection as usize
            + self.ammo as usize
            + self.latency as usize
    }

    /// True if nothing changed.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Result of a successful encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeReport {
    /// Bits this frame took.
    pub bits_written: usize,
    /// Change-bits set.
    pub changes: ChangeSet,
}

/// Result of an applied frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Bits this frame took.
    pub bits_read: usize,
    /// Time token the frame carried.
    pub time_token: TimeToken,
    /// Change-bits set.
    pub changes: ChangeSet,
    /// Weapon check, when the frame had a weapon.
    pub weapon: Option<WeaponVerdict>,
    /// Subject latency in milliseconds, for relayed frames.
    pub latency: Option<u32>,
}

/// What happened to an inbound frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Every field was applied and events were derived.
    Applied(FrameReport),
    /// The context check turned the frame away. Nothing changed.
    Rejected(RejectReason),
}

/// Per-field differential codec.
///
/// Holds no per-connection state. One codec serves every connection.
#[derive(Clone, Debug)]
pub struct FrameCodec {
    config: CodecConfig,
    weapons: Arc<WeaponTable>,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default(), Arc::new(WeaponTable::standard()))
    }
}

impl FrameCodec {
    /// Creates a codec.
    #[must_use]
    pub fn new(config: CodecConfig, weapons: Arc<WeaponTable>) -> Self {
        Self { config, weapons }
    }

    /// Creates a codec from a loaded configuration file.
    pub fn from_config(config: &DeltaSyncConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.codec, Arc::new(config.weapon_table()?)))
    }

    /// Codec settings.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Shared weapon table.
    #[inline]
    #[must_use]
    pub fn weapons(&self) -> &WeaponTable {
        &self.weapons
    }

    /// Encodes one frame and commits it to `last_sent`.
    ///
    /// A contact the world cannot resolve is dropped and the position goes
    /// out absolute. On error the writer holds a partial frame that must be
    /// discarded; the baseline is untouched.
    pub fn encode_frame<W: EntityDirectory + ?Sized>(
        &self,
        writer: &mut BitWriter,
        frame: &SyncFrame,
        time_token: TimeToken,
        state: &mut ConnectionSyncState,
        world: &W,
    ) -> FrameResult<EncodeReport> {
        self.encode_with_latency(writer, frame, time_token, None, state, world)
    }

    /// Encodes one frame, with a latency block after the time token when
    /// `latency` is given.
    pub(super) fn encode_with_latency<W: EntityDirectory + ?Sized>(
        &self,
        writer: &mut BitWriter,
        frame: &SyncFrame,
        time_token: TimeToken,
        latency: Option<u32>,
        state: &mut ConnectionSyncState,
        world: &W,
    ) -> FrameResult<EncodeReport> {
        let start = writer.bits_written();
        let mut staged = state.last_sent;
        let mut changes = ChangeSet::default();

        let mut wire = *frame;
        let contact_origin = match frame.contact {
            Some(contact) => {
                let origin = world.position_of(contact);
                if origin.is_none() {
                    tracing::warn!("contact {} not in world, sending absolute position", contact);
                    wire.contact = None;
                }
                origin
            }
            None => None,
        };
        let flags = wire.wire_flags();

        state.resync_token().write(writer)?;
        writer.write_u8(time_token)?;

        if let Some(latency) = latency {
            changes.latency = latency != staged.latency;
            writer.write_bit(changes.latency)?;
            if changes.latency {
                writer.write_compressed(latency)?;
                staged.latency = latency;
            }
        }

        changes.controller = wire.controller != staged.controller;
        writer.write_bit(changes.controller)?;
        if changes.controller {
            wire.controller.write(writer)?;
            staged.controller = wire.controller;
        }

        changes.flags = flags != staged.flags;
        writer.write_bit(changes.flags)?;
        if changes.flags {
            flags.write(writer)?;
            staged.flags = flags;
        }

        changes.contact = wire.contact != staged.contact;
        writer.write_bit(changes.contact)?;
        if changes.contact {
            writer.write_entity(wire.contact)?;
            staged.contact = wire.contact;
        }

        let position = to_wire_space(wire.position, contact_origin);
        writer.write_fixed_vector(position, POSITION_FORMAT)?;
        staged.position = quantize_vector(position, POSITION_FORMAT);

        writer.write_angle(wire.rotation)?;

        if let Some(velocity) = wire.velocity {
            writer.write_fixed_vector(velocity, VELOCITY_FORMAT)?;
        }

        // diffed on wire values so an unchanged frame never resends them
        let health = HEALTH_FORMAT.quantize(wire.health);
        let armor = ARMOR_FORMAT.quantize(wire.armor);
        let epsilon = self.config.float_epsilon;
        changes.vitals =
            (health - staged.health).abs() > epsilon || (armor - staged.armor).abs() > epsilon;
        writer.write_bit(changes.vitals)?;
        if changes.vitals {
            writer.write_fixed(health, HEALTH_FORMAT)?;
            writer.write_fixed(armor, ARMOR_FORMAT)?;
            staged.health = health;
            staged.armor = armor;
        }

        writer.write_f32(wire.camera_rotation)?;

        if let Some(weapon) = &wire.weapon {
            let (baseline, weapon_changes) = write_weapon_block(
                writer,
                weapon,
                &wire.controller,
                &staged.weapon,
                &self.weapons,
            )?;
            staged.weapon = baseline;
            changes.weapon_selection = weapon_changes.selection;
            changes.ammo = weapon_changes.ammo;
        }

        writer.write_bit(wire.damage.is_some())?;
        if let Some(report) = &wire.damage {
            report.write(writer)?;
        }

        state.last_sent = staged;

        let bits_written = writer.bits_written() - start;
        tracing::trace!(
            "encoded frame: time={} bits={} changes={}",
            time_token,
            bits_written,
            changes.count()
        );
        Ok(EncodeReport {
            bits_written,
            changes,
        })
    }

    /// Decodes one frame into `player`.
    ///
    /// Stale and desynchronized frames come back as
    /// [`DecodeOutcome::Rejected`] with no side effects. Malformed or
    /// truncated frames return an error; fields applied before the failure
    /// stay applied.
    pub fn decode_frame<P, W, S>(
        &self,
        reader: &mut BitReader,
        state: &mut ConnectionSyncState,
        player: &mut P,
        world: &W,
        sink: &mut S,
    ) -> FrameResult<DecodeOutcome>
    where
        P: SyncedPlayer + ?Sized,
        W: EntityDirectory + ?Sized,
        S: EventSink + ?Sized,
    {
        self.decode_with_latency(reader, false, state, player, world, sink)
    }

    /// Decodes one frame, reading a latency block after the time token
    /// when `relayed` is set.
    pub(super) fn decode_with_latency<P, W, S>(
        &self,
        reader: &mut BitReader,
        relayed: bool,
        state: &mut ConnectionSyncState,
        player: &mut P,
        world: &W,
        sink: &mut S,
    ) -> FrameResult<DecodeOutcome>
    where
        P: SyncedPlayer + ?Sized,
        W: EntityDirectory + ?Sized,
        S: EventSink + ?Sized,
    {
        let start = reader.bits_read();

        let time_token = match read_context(reader, state)? {
            Admission::Admitted(token) => token,
            Admission::Rejected(reason) => {
                self.log_rejection(reason);
                return Ok(DecodeOutcome::Rejected(reason));
            }
        };

        let mut changes = ChangeSet::default();
        let baseline = &mut state.last_received;

        let latency = if relayed {
            changes.latency = reader.read_bit()?;
            if changes.latency {
                baseline.latency = reader.read_compressed()?;
            }
            Some(baseline.latency)
        } else {
            None
        };

        let before = VitalState::capture(player);

        changes.controller = reader.read_bit()?;
        if changes.controller {
            let controller = ControllerState::read(reader)?;
            player.set_controller(controller);
            baseline.controller = controller;
        }
        let controller = baseline.controller;

        changes.flags = reader.read_bit()?;
        if changes.flags {
            let flags = StatusFlags::read(reader)?;
            player.set_status_flags(flags);
            baseline.flags = flags;
        }
        let flags = baseline.flags;

        changes.contact = reader.read_bit()?;
        if changes.contact {
            baseline.contact = reader.read_entity()?;
        }
        let contact = baseline
            .contact
            .and_then(|entity| world.position_of(entity).map(|origin| (entity, origin)));
        player.set_contact(contact.map(|(entity, _)| entity));

        let position = reader.read_fixed_vector(POSITION_FORMAT)?;
        baseline.position = position;
        let contact_origin = contact.map(|(_, origin)| origin);
        if contact_origin.is_some() {
            player.set_contact_position(position);
        }
        player.set_position(from_wire_space(position, contact_origin));

        player.set_rotation(reader.read_angle()?);

        if flags.contains(StatusFlags::SYNCING_VELOCITY) {
            player.set_velocity(reader.read_fixed_vector(VELOCITY_FORMAT)?);
        }

        changes.vitals = reader.read_bit()?;
        if changes.vitals {
            let health = reader.read_fixed(HEALTH_FORMAT)?;
            let armor = reader.read_fixed(ARMOR_FORMAT)?;
            player.set_armor(armor);
            baseline.health = health;
            baseline.armor = armor;
        }
        let health = baseline.health;

        player.set_camera_rotation(reader.read_f32()?);

        let weapon = if flags.contains(StatusFlags::HAS_WEAPON) {
            let (block, next) =
                read_weapon_block(reader, &controller, &baseline.weapon, &self.weapons)?;
            baseline.weapon = next;
            changes.weapon_selection = block.changes.selection;
            changes.ammo = block.changes.ammo;

            let verdict = check_weapon(block.weapon_type, player.weapon_type());
            if let WeaponVerdict::Mismatch { reported, expected } = verdict {
                tracing::warn!(
                    "weapon mismatch: peer reports {}, expected {}; withholding weapon data",
                    reported,
                    expected
                );
            }
            apply_weapon(player, &block, verdict);
            Some(verdict)
        } else {
            apply_unarmed(player);
            None
        };

        if reader.read_bit()? {
            player.set_damage_info(DamageReport::read(reader)?);
        }

        player.set_health(if player.is_dead() { 0.0 } else { health });

        let after = VitalState::capture(player);
        derive_events(&before, &after, player.damage_info(), sink);

        let bits_read = reader.bits_read() - start;
        tracing::trace!(
            "decoded frame: time={} bits={} changes={}",
            time_token,
            bits_read,
            changes.count()
        );
        Ok(DecodeOutcome::Applied(FrameReport {
            bits_read,
            time_token,
            changes,
            weapon,
            latency,
        }))
    }

    fn log_rejection(&self, reason: RejectReason) {
        if !self.config.log_rejections {
            return;
        }
        match reason {
            RejectReason::ResyncMismatch { .. } => {
                tracing::warn!("dropping frame: {}", reason);
            }
            RejectReason::Stale { .. } => {
                tracing::debug!("dropping frame: {}", reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{EmptyWorld, PlayerRecord};
    use crate::protocol::{AimData, AmmoState, BodyPart, WeaponFrame};
    use crate::sync::{ResyncToken, SyncEvent};
    use deltasync_core::EntityRef;
    use std::collections::HashMap;

    fn roundtrip(
        codec: &FrameCodec,
        frame: &SyncFrame,
        time: TimeToken,
        sender: &mut ConnectionSyncState,
        receiver: &mut ConnectionSyncState,
        player: &mut PlayerRecord,
        events: &mut Vec<SyncEvent>,
    ) -> (EncodeReport, DecodeOutcome) {
        let mut writer = BitWriter::new();
        let report = codec
            .encode_frame(&mut writer, frame, time, sender, &EmptyWorld)
            .unwrap();
        let mut reader = BitReader::new(writer.as_slice());
        let outcome = codec
            .decode_frame(&mut reader, receiver, player, &EmptyWorld, events)
            .unwrap();
        (report, outcome)
    }

    #[test]
    fn test_wire_space_pair() {
        let origin = Vector3::new(10.0, 20.0, 5.0);
        let position = Vector3::new(12.5, 19.0, 6.0);

        let wire = to_wire_space(position, Some(origin));
        assert_eq!(wire, Vector3::new(2.5, -1.0, 1.0));
        assert_eq!(from_wire_space(wire, Some(origin)), position);
        assert_eq!(to_wire_space(position, None), position);
    }

    #[test]
    fn test_minimal_frame_size() {
        let codec = FrameCodec::default();
        let mut state = ConnectionSyncState::new();
        let mut writer = BitWriter::new();

        let report = codec
            .encode_frame(&mut writer, &SyncFrame::default(), 1, &mut state, &EmptyWorld)
            .unwrap();

        // resync, time, 3 change bits, position, rotation, vitals bit,
        // camera, damage bit
        assert_eq!(report.bits_written, 2 + 8 + 3 + 72 + 16 + 1 + 32 + 1);
        assert!(report.changes.is_empty());
    }

    #[test]
    fn test_baseline_commits_only_on_success() {
        let codec = FrameCodec::default();
        let mut state = ConnectionSyncState::new();
        let frame = SyncFrame {
            health: 50.0,
            weapon: Some(WeaponFrame {
                slot: 40,
                weapon_type: 31,
                ammo: None,
                aim: AimData::default(),
            }),
            ..SyncFrame::default()
        };

        let mut writer = BitWriter::new();
        assert!(codec
            .encode_frame(&mut writer, &frame, 1, &mut state, &EmptyWorld)
            .is_err());
        assert_eq!(state.last_sent, Default::default());
    }

    #[test]
    fn test_vitals_idempotent_below_resolution() {
        let codec = FrameCodec::new(
            CodecConfig {
                float_epsilon: 0.001,
                ..CodecConfig::default()
            },
            Arc::new(WeaponTable::standard()),
        );
        assert!(codec.config().float_epsilon < HEALTH_FORMAT.resolution());

        for health in [80.002, 300.0] {
            let mut state = ConnectionSyncState::new();
            let frame = SyncFrame {
                health,
                armor: 12.3,
                ..SyncFrame::default()
            };
            let vitals: Vec<bool> = (1..=3)
                .map(|time| {
                    let mut writer = BitWriter::new();
                    codec
                        .encode_frame(&mut writer, &frame, time, &mut state, &EmptyWorld)
                        .unwrap()
                        .changes
                        .vitals
                })
                .collect();
            assert_eq!(vitals, vec![true, false, false], "health {health}");
        }
    }

    #[test]
    fn test_unresolved_contact_sent_absolute() {
        let codec = FrameCodec::default();
        let mut state = ConnectionSyncState::new();
        let frame = SyncFrame {
            contact: EntityRef::new(9),
            position: Vector3::new(100.0, 0.0, 0.0),
            ..SyncFrame::default()
        };

        let mut writer = BitWriter::new();
        let report = codec
            .encode_frame(&mut writer, &frame, 1, &mut state, &EmptyWorld)
            .unwrap();
        assert!(!report.changes.contact);
        assert_eq!(state.last_sent.contact, None);
        assert_eq!(state.last_sent.position, Vector3::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn test_contact_relative_position() {
        let codec = FrameCodec::default();
        let mut world = HashMap::new();
        let boat = EntityRef::new(3).unwrap();
        world.insert(boat, Vector3::new(500.0, 500.0, 2.0));

        let frame = SyncFrame {
            contact: Some(boat),
            position: Vector3::new(501.5, 498.0, 3.0),
            ..SyncFrame::default()
        };

        let mut sender = ConnectionSyncState::new();
        let mut writer = BitWriter::new();
        codec
            .encode_frame(&mut writer, &frame, 1, &mut sender, &world)
            .unwrap();
        assert_eq!(sender.last_sent.position, Vector3::new(1.5, -2.0, 1.0));

        let mut receiver = ConnectionSyncState::new();
        let mut player = PlayerRecord::spawned();
        let mut events = Vec::new();
        let mut reader = BitReader::new(writer.as_slice());
        codec
            .decode_frame(&mut reader, &mut receiver, &mut player, &world, &mut events)
            .unwrap();

        assert_eq!(player.contact, Some(boat));
        assert_eq!(player.contact_position, Vector3::new(1.5, -2.0, 1.0));
        assert_eq!(player.position, Vector3::new(501.5, 498.0, 3.0));
    }

    #[test]
    fn test_dead_player_health_forced_to_zero() {
        let codec = FrameCodec::default();
        let mut sender = ConnectionSyncState::new();
        let mut receiver = ConnectionSyncState::new();
        let mut player = PlayerRecord::spawned();
        player.dead = true;
        player.health = 30.0;
        let mut events = Vec::new();

        let frame = SyncFrame {
            health: 30.0,
            ..SyncFrame::default()
        };
        roundtrip(
            &codec,
            &frame,
            1,
            &mut sender,
            &mut receiver,
            &mut player,
            &mut events,
        );

        assert!(player.health.abs() < f32::EPSILON);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_damage_report_retained() {
        let codec = FrameCodec::default();
        let mut sender = ConnectionSyncState::new();
        let mut receiver = ConnectionSyncState::new();
        let mut player = PlayerRecord::spawned();
        let mut events = Vec::new();

        let report = DamageReport {
            attacker: EntityRef::new(77),
            weapon_type: 24,
            body_part: BodyPart::LeftLeg,
        };
        let frame = SyncFrame {
            health: 100.0,
            ..SyncFrame::default()
        }
        .with_damage(report);
        roundtrip(
            &codec,
            &frame,
            1,
            &mut sender,
            &mut receiver,
            &mut player,
            &mut events,
        );
        assert_eq!(player.damage_info, Some(report));
        assert!(events.is_empty());

        let frame = SyncFrame {
            health: 90.0,
            ..SyncFrame::default()
        };
        roundtrip(
            &codec,
            &frame,
            2,
            &mut sender,
            &mut receiver,
            &mut player,
            &mut events,
        );
        assert_eq!(
            events,
            vec![SyncEvent::Damage {
                attacker: EntityRef::new(77),
                weapon_type: Some(24),
                body_part: Some(BodyPart::LeftLeg),
                amount: 10.0,
            }]
        );
    }

    #[test]
    fn test_no_weapon_applies_unarmed() {
        let codec = FrameCodec::default();
        let mut sender = ConnectionSyncState::new();
        let mut receiver = ConnectionSyncState::new();
        let mut player = PlayerRecord::spawned();
        player.weapon_slot = 3;
        player.ammo = AmmoState {
            in_clip: 2,
            total: 8,
        };
        let mut events = Vec::new();

        let (_, outcome) = roundtrip(
            &codec,
            &SyncFrame::default(),
            1,
            &mut sender,
            &mut receiver,
            &mut player,
            &mut events,
        );

        match outcome {
            DecodeOutcome::Applied(report) => assert_eq!(report.weapon, None),
            DecodeOutcome::Rejected(reason) => panic!("rejected: {reason}"),
        }
        assert_eq!(player.weapon_slot, 0);
        assert_eq!(player.ammo, AmmoState::UNLIMITED);
    }

    #[test]
    fn test_rejection_is_silent_without_logging() {
        let codec = FrameCodec::new(
            CodecConfig {
                log_rejections: false,
                ..CodecConfig::default()
            },
            Arc::new(WeaponTable::standard()),
        );
        let mut sender = ConnectionSyncState::new();
        let mut receiver = ConnectionSyncState::new();
        receiver.accept_resync(ResyncToken::new(2));
        let mut player = PlayerRecord::spawned();
        let before = player.clone();
        let mut events = Vec::new();

        let (_, outcome) = roundtrip(
            &codec,
            &SyncFrame::default(),
            1,
            &mut sender,
            &mut receiver,
            &mut player,
            &mut events,
        );
        assert!(matches!(
            outcome,
            DecodeOutcome::Rejected(RejectReason::ResyncMismatch { .. })
        ));
        assert_eq!(player, before);
        assert!(events.is_empty());
    }
}
