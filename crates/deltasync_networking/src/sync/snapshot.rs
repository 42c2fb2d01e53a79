//! # Shadow State
//!
//! Per-connection baselines the differential codec diffs against.
//!
//! ```text
//!            ┌──────────────┐  encode   ┌──────────────┐
//!  live ───→ │  last_sent   │ ────────→ │ peer's       │
//!            └──────────────┘           │ last_received│
//!                                       └──────────────┘
//! ```
//!
//! The sender's `last_sent` must always equal what the peer holds as
//! `last_received`. Values are stored exactly as they crossed the wire, so
//! quantization never causes the two to drift.

use deltasync_core::{BitReader, BitResult, BitWriter, EntityRef, Vector3};

use crate::protocol::{AmmoState, ControllerState, StatusFlags, WeaponCode, RESYNC_TOKEN_BITS};

/// Ordering token carried by every frame.
pub type TimeToken = u8;

/// Returns true if `candidate` comes after `last` under wraparound.
///
/// Half the token space counts as "ahead", the other half as "behind".
/// Equal tokens are not newer.
#[inline]
#[must_use]
pub const fn is_newer(candidate: TimeToken, last: TimeToken) -> bool {
    (candidate.wrapping_sub(last) as i8) > 0
}

/// Baseline generation counter.
///
/// Both ends must agree on it. A frame carrying a different token was
/// encoded against a different baseline and cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResyncToken(u8);

impl ResyncToken {
    const MASK: u8 = (1 << RESYNC_TOKEN_BITS) - 1;

    /// Creates a token, keeping only the bits that fit the wire.
    #[inline]
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw & Self::MASK)
    }

    /// Raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The following generation, wrapping within the wire width.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    /// Writes the token.
    pub fn write(self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_bits(u32::from(self.0), RESYNC_TOKEN_BITS)
    }

    /// Reads a token.
    pub fn read(reader: &mut BitReader) -> BitResult<Self> {
        Ok(Self::new(reader.read_bits(RESYNC_TOKEN_BITS)? as u8))
    }
}

impl std::fmt::Display for ResyncToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weapon part of a baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponSnapshot {
    /// Last slot on the wire.
    pub slot: u8,
    /// Last weapon type on the wire. Decides the block layout while the
    /// selection is unchanged.
    pub weapon_type: WeaponCode,
    /// Last ammo on the wire.
    pub ammo: AmmoState,
}

/// One direction's baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SyncSnapshot {
    /// Controller input.
    pub controller: ControllerState,
    /// Wire flags.
    pub flags: StatusFlags,
    /// Contact reference.
    pub contact: Option<EntityRef>,
    /// Position in wire space, quantized.
    pub position: Vector3,
    /// Health, quantized.
    pub health: f32,
    /// Armor, quantized.
    pub armor: f32,
    /// Weapon baseline.
    pub weapon: WeaponSnapshot,
    /// Relayed latency in milliseconds.
    pub latency: u32,
}

/// Everything the codec remembers about one connection.
///
/// Created on connect and dropped on disconnect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionSyncState {
    /// Baseline for outbound frames.
    pub last_sent: SyncSnapshot,
    /// Baseline for inbound frames.
    pub last_received: SyncSnapshot,
    resync_token: ResyncToken,
    last_time_token: Option<TimeToken>,
}

impl ConnectionSyncState {
    /// Fresh state for a new connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current baseline generation.
    #[inline]
    #[must_use]
    pub const fn resync_token(&self) -> ResyncToken {
        self.resync_token
    }

    /// Time token of the last accepted inbound frame.
    #[inline]
    #[must_use]
    pub const fn last_time_token(&self) -> Option<TimeToken> {
        self.last_time_token
    }

    /// Records an accepted time token.
    #[inline]
    pub(crate) fn store_time_token(&mut self, token: TimeToken) {
        self.last_time_token = Some(token);
    }

    /// Starts a new baseline generation and returns its token.
    ///
    /// Both baselines go back to their defaults. The peer has to be told
    /// the token through the session layer and call [`Self::accept_resync`].
    pub fn begin_resync(&mut self) -> ResyncToken {
        self.accept_resync(self.resync_token.next());
        self.resync_token
    }

    /// Adopts a generation announced by the peer.
    pub fn accept_resync(&mut self, token: ResyncToken) {
        self.resync_token = token;
        self.last_sent = SyncSnapshot::default();
        self.last_received = SyncSnapshot::default();
        self.last_time_token = None;
    }
}
