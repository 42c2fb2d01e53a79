//! # Event Deriver
//!
//! Turns the difference between pre- and post-decode state into
//! notifications.
//!
//! The deriver is the only part of the codec that talks to the outside
//! world, and it only runs once every field of a frame has been applied.
//! Sinks must not feed another frame for the same connection back into the
//! codec while handling an event.

use crossbeam_channel::Sender;
use deltasync_core::EntityRef;

use crate::integration::SyncedPlayer;
use crate::protocol::{BodyPart, DamageReport, WeaponCode};

/// Notification derived from an applied frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SyncEvent {
    /// The entity the player stands on changed.
    Contact {
        /// Contact before the frame.
        previous: Option<EntityRef>,
        /// Contact after the frame.
        current: Option<EntityRef>,
    },
    /// The player lost health or armor.
    Damage {
        /// Attacker from the player's damage info.
        attacker: Option<EntityRef>,
        /// Weapon from the player's damage info.
        weapon_type: Option<WeaponCode>,
        /// Body part from the player's damage info.
        body_part: Option<BodyPart>,
        /// Health lost plus armor lost.
        amount: f32,
    },
}

/// Receiver of derived events.
pub trait EventSink {
    /// Delivers one event.
    fn emit(&mut self, event: SyncEvent);
}

impl EventSink for Vec<SyncEvent> {
    #[inline]
    fn emit(&mut self, event: SyncEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<SyncEvent> {
    fn emit(&mut self, event: SyncEvent) {
        if self.send(event).is_err() {
            tracing::debug!("event receiver gone, dropping {:?}", event);
        }
    }
}

/// The parts of a player the deriver compares.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VitalState {
    /// Contact entity.
    pub contact: Option<EntityRef>,
    /// Health.
    pub health: f32,
    /// Armor.
    pub armor: f32,
}

impl VitalState {
    /// Reads the compared fields from a player.
    #[must_use]
    pub fn capture<P: SyncedPlayer + ?Sized>(player: &P) -> Self {
        Self {
            contact: player.contact(),
            health: player.health(),
            armor: player.armor(),
        }
    }
}

/// Health lost plus armor lost. Gains count as zero.
#[inline]
#[must_use]
pub fn damage_amount(before: &VitalState, after: &VitalState) -> f32 {
    (before.health - after.health).max(0.0) + (before.armor - after.armor).max(0.0)
}

/// Emits the contact and damage notifications for one applied frame.
pub fn derive_events<S: EventSink + ?Sized>(
    before: &VitalState,
    after: &VitalState,
    damage_info: Option<DamageReport>,
    sink: &mut S,
) {
    if before.contact != after.contact {
        sink.emit(SyncEvent::Contact {
            previous: before.contact,
            current: after.contact,
        });
    }

    let amount = damage_amount(before, after);
    if amount > 0.0 {
        sink.emit(SyncEvent::Damage {
            attacker: damage_info.and_then(|info| info.attacker),
            weapon_type: damage_info.map(|info| info.weapon_type),
            body_part: damage_info.map(|info| info.body_part),
            amount,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(health: f32, armor: f32) -> VitalState {
        VitalState {
            contact: None,
            health,
            armor,
        }
    }

    #[test]
    fn test_damage_sums_losses() {
        let mut events = Vec::new();
        derive_events(&vitals(80.0, 20.0), &vitals(60.0, 15.0), None, &mut events);
        assert_eq!(
            events,
            vec![SyncEvent::Damage {
                attacker: None,
                weapon_type: None,
                body_part: None,
                amount: 25.0,
            }]
        );
    }

    #[test]
    fn test_gains_never_damage() {
        let mut events = Vec::new();
        derive_events(&vitals(80.0, 20.0), &vitals(90.0, 20.0), None, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_mixed_gain_and_loss() {
        assert!((damage_amount(&vitals(80.0, 20.0), &vitals(90.0, 5.0)) - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_damage_carries_info() {
        let info = DamageReport {
            attacker: EntityRef::new(12),
            weapon_type: 31,
            body_part: BodyPart::Head,
        };
        let mut events = Vec::new();
        derive_events(&vitals(50.0, 0.0), &vitals(0.0, 0.0), Some(info), &mut events);
        assert_eq!(
            events,
            vec![SyncEvent::Damage {
                attacker: EntityRef::new(12),
                weapon_type: Some(31),
                body_part: Some(BodyPart::Head),
                amount: 50.0,
            }]
        );
    }

    #[test]
    fn test_contact_transition() {
        let before = VitalState::default();
        let after = VitalState {
            contact: EntityRef::new(7),
            ..VitalState::default()
        };

        let mut events = Vec::new();
        derive_events(&before, &after, None, &mut events);
        assert_eq!(
            events,
            vec![SyncEvent::Contact {
                previous: None,
                current: EntityRef::new(7),
            }]
        );

        events.clear();
        derive_events(&after, &after, None, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = crossbeam_channel::unbounded();
        tx.emit(SyncEvent::Contact {
            previous: None,
            current: None,
        });
        assert_eq!(rx.try_recv().unwrap(), SyncEvent::Contact {
            previous: None,
            current: None,
        });

        drop(rx);
        tx.emit(SyncEvent::Contact {
            previous: None,
            current: None,
        });
    }
}
