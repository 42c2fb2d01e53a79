//! # Sync Error Types
//!
//! Everything that can go wrong while encoding, decoding or configuring.
//!
//! Stale and desynchronized frames are NOT errors: they come back as
//! [`crate::DecodeOutcome::Rejected`]. Only malformed or truncated data and
//! bad configuration end up here.

use deltasync_core::BitError;
use thiserror::Error;

use crate::registry::ConnectionId;

/// Errors raised while reading or writing a single frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// A primitive read or write ran out of room.
    #[error("bit stream: {0}")]
    Bits(#[from] BitError),

    /// The damage report named a body part outside the known range.
    #[error("invalid body part code {0}")]
    InvalidBodyPart(u8),

    /// A weapon slot that does not fit its wire field.
    #[error("weapon slot {0} does not fit the wire")]
    SlotOutOfRange(u8),
}

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("reading configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The weapon table is inconsistent.
    #[error("invalid weapon table: {0}")]
    InvalidWeaponTable(String),
}

/// Errors raised by the connection registry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No sync state exists for this connection.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// The frame itself failed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}
