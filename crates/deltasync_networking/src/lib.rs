//! # DeltaSync Networking - Player Delta Sync
//!
//! Per-connection, bit-level differential codec for player state.
//!
//! ## Architecture
//!
//! - **Protocol**: field wire forms, the `SyncFrame` record, weapon tables
//! - **Sync**: shadow baselines, context validation, the frame codec, the
//!   weapon sub-codec and the event deriver
//! - **Registry**: one `ConnectionSyncState` per peer behind its own lock
//! - **Integration**: the traits a host implements to plug in its players
//!   and world
//!
//! ## Guarantees
//!
//! - Only what changed since the last frame goes on the wire
//! - Encoder and decoder consume exactly the same bits for every frame,
//!   including frames whose weapon data is rejected
//! - Stale or desynchronized frames never touch any state
//!
//! ```text
//! SENDER                               RECEIVER
//!   |  last_sent          bits           last_received  |
//!   |------ frame ─────────────────────────→ validate   |
//!   |                                       apply       |
//!   |                                       events      |
//! ```
//!
//! ## Example
//!
//! ```rust
//! use deltasync_core::{BitReader, BitWriter};
//! use deltasync_networking::{
//!     ConnectionSyncState, DecodeOutcome, EmptyWorld, FrameCodec, PlayerRecord, SyncFrame,
//! };
//!
//! let codec = FrameCodec::default();
//! let mut client = ConnectionSyncState::new();
//! let mut server = ConnectionSyncState::new();
//!
//! let mut local = PlayerRecord::spawned();
//! local.health = 80.0;
//!
//! let mut writer = BitWriter::new();
//! codec
//!     .encode_frame(&mut writer, &SyncFrame::capture(&local), 1, &mut client, &EmptyWorld)
//!     .unwrap();
//!
//! let mut remote = PlayerRecord::spawned();
//! let mut events = Vec::new();
//! let mut reader = BitReader::new(writer.as_slice());
//! let outcome = codec
//!     .decode_frame(&mut reader, &mut server, &mut remote, &EmptyWorld, &mut events)
//!     .unwrap();
//!
//! assert!(matches!(outcome, DecodeOutcome::Applied(_)));
//! assert_eq!(remote.health, 80.0);
//! assert_eq!(events.len(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod integration;
pub mod protocol;
pub mod registry;
pub mod sync;

// Re-exports for convenience
pub use config::{CodecConfig, DeltaSyncConfig};
pub use error::{ConfigError, FrameError, FrameResult, RegistryError};
pub use integration::{EmptyWorld, EntityDirectory, PlayerRecord, SyncedPlayer};
pub use protocol::{
    AimData, AimVectors, AmmoState, BodyPart, ControllerState, DamageReport, StatusFlags,
    SyncFrame, WeaponFrame, WeaponSpec, WeaponTable,
};
pub use registry::{ConnectionId, SyncRegistry};
pub use sync::{
    ConnectionSyncState, DecodeOutcome, EncodeReport, EventSink, FrameCodec, FrameReport,
    RejectReason, ResyncToken, SyncEvent, TimeToken,
};
