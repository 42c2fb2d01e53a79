//! # DeltaSync Core
//!
//! Leaf primitives shared by every DeltaSync codec:
//!
//! - **Bit stream**: `BitWriter` / `BitReader` over one MTU-sized packet
//! - **Numeric forms**: fixed point, 16-bit angles, variable-width integers
//! - **Vectors**: `Vector3` with the arithmetic the codecs need
//! - **Entity references**: 17-bit ids with a reserved "no entity" value
//!
//! Nothing here knows about frames, players or connections.
//!
//! ## Example
//!
//! ```rust
//! use deltasync_core::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true).unwrap();
//! writer.write_compressed(300).unwrap();
//!
//! let mut reader = BitReader::new(writer.as_slice());
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_compressed().unwrap(), 300);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bits;
pub mod entity;
pub mod math;

pub use bits::{
    angle_from_raw, angle_to_raw, BitError, BitReader, BitResult, BitWriter, FixedPoint,
    ANGLE_BITS, MAX_PACKET_SIZE,
};
pub use entity::{EntityRef, ENTITY_REF_BITS, INVALID_ENTITY_RAW};
pub use math::Vector3;
