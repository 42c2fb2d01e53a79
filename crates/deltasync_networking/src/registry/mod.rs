//! # Connection Registry
//!
//! Sync state for every connected peer.
//!
//! ## Locking
//!
//! The map sits behind an `RwLock` that is only written on connect and
//! disconnect. Each connection's state has its own `Mutex`, so frames for
//! one connection are applied one at a time while other connections
//! proceed in parallel.
//!
//! Event sinks run while the connection's lock is held. A sink that feeds a
//! frame for the same connection back into the registry deadlocks.

use std::collections::HashMap;

use deltasync_core::{BitReader, BitWriter};
use parking_lot::{Mutex, RwLock};

use crate::error::RegistryError;
use crate::integration::{EntityDirectory, SyncedPlayer};
use crate::protocol::SyncFrame;
use crate::sync::{
    ConnectionSyncState, DecodeOutcome, EncodeReport, EventSink, FrameCodec, ResyncToken,
    TimeToken,
};

/// Unique identifier for a peer connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    /// Invalid/null connection ID.
    pub const NULL: Self = Self(u32::MAX);

    /// Returns true if this is a null/invalid ID.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Owns the sync state of every connection and the codec that drives it.
#[derive(Debug, Default)]
pub struct SyncRegistry {
    codec: FrameCodec,
    connections: RwLock<HashMap<ConnectionId, Mutex<ConnectionSyncState>>>,
}

impl SyncRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            codec,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// The shared codec.
    #[inline]
    #[must_use]
    pub const fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    /// Creates fresh sync state for a connection.
    ///
    /// Returns false if the connection already had state, which is kept.
    pub fn connect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write();
        if connections.contains_key(&id) {
            return false;
        }
        connections.insert(id, Mutex::new(ConnectionSyncState::new()));
        tracing::info!("sync state created for {}", id);
        true
    }

    /// Drops a connection's sync state.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().remove(&id).is_some();
        if removed {
            tracing::info!("sync state dropped for {}", id);
        }
        removed
    }

    /// True if the connection has sync state.
    #[must_use]
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    /// Number of connections with sync state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// True if no connection has sync state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Encodes a frame for a connection.
    pub fn encode_for<W: EntityDirectory + ?Sized>(
        &self,
        id: ConnectionId,
        writer: &mut BitWriter,
        frame: &SyncFrame,
        time_token: TimeToken,
        world: &W,
    ) -> Result<EncodeReport, RegistryError> {
        self.with_state(id, |state| {
            Ok(self
                .codec
                .encode_frame(writer, frame, time_token, state, world)?)
        })
    }

    /// Decodes a frame from a connection into its player.
    pub fn decode_from<P, W, S>(
        &self,
        id: ConnectionId,
        reader: &mut BitReader,
        player: &mut P,
        world: &W,
        sink: &mut S,
    ) -> Result<DecodeOutcome, RegistryError>
    where
        P: SyncedPlayer + ?Sized,
        W: EntityDirectory + ?Sized,
        S: EventSink + ?Sized,
    {
        self.with_state(id, |state| {
            Ok(self.codec.decode_frame(reader, state, player, world, sink)?)
        })
    }

    /// Starts a new baseline generation for a connection.
    pub fn begin_resync(&self, id: ConnectionId) -> Result<ResyncToken, RegistryError> {
        let token = self.with_state(id, |state| Ok(state.begin_resync()))?;
        tracing::info!("resync {} for {}", token, id);
        Ok(token)
    }

    /// Adopts a generation the peer announced.
    pub fn accept_resync(&self, id: ConnectionId, token: ResyncToken) -> Result<(), RegistryError> {
        self.with_state(id, |state| {
            state.accept_resync(token);
            Ok(())
        })?;
        tracing::info!("accepted resync {} for {}", token, id);
        Ok(())
    }

    /// Copy of a connection's sync state.
    pub fn snapshot(&self, id: ConnectionId) -> Result<ConnectionSyncState, RegistryError> {
        self.with_state(id, |state| Ok(state.clone()))
    }

    fn with_state<T>(
        &self,
        id: ConnectionId,
        f: impl FnOnce(&mut ConnectionSyncState) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let connections = self.connections.read();
        let slot = connections
            .get(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        let mut state = slot.lock();
        f(&mut state)
    }
}
