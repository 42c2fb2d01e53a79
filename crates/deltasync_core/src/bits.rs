//! # Bit Stream
//!
//! Bit-granular writer and reader over a single MTU-sized packet.
//!
//! ## Layout
//!
//! - Bits are packed LSB-first inside each byte
//! - Multi-bit values are written least significant bit first
//! - Nothing is self-describing: a reader must ask for exactly the widths
//!   the writer produced, in the same order
//!
//! ## Primitives
//!
//! ```text
//! bit / bits(n)   raw values, n in 1..=32
//! u8 / u16 / f32  fixed-width shorthands
//! compressed      7-bit groups, each preceded by a continue bit
//! fixed point     signed or unsigned, integer.fraction bits
//! angle           16-bit turn fraction
//! ```

use std::f32::consts::{PI, TAU};

use thiserror::Error;

use crate::math::Vector3;

/// Maximum packet size in bytes.
///
/// 1200 bytes stays under every common path MTU.
pub const MAX_PACKET_SIZE: usize = 1200;

/// Payload bits per group of a compressed integer.
const COMPRESSED_GROUP_BITS: u8 = 7;

/// A `u32` never needs more than this many compressed groups.
const COMPRESSED_MAX_GROUPS: u32 = 5;

/// Width of an encoded angle.
pub const ANGLE_BITS: u8 = 16;

/// Errors raised by bit-level reads and writes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitError {
    /// The packet buffer cannot hold the requested bits.
    #[error("packet buffer full: {requested} bits requested at bit {position}")]
    Overflow {
        /// Bit position at the time of the write.
        position: usize,
        /// Bits the write needed.
        requested: u32,
    },

    /// The stream ended before the requested bits could be read.
    #[error("stream exhausted: {requested} bits requested, {remaining} remaining")]
    Exhausted {
        /// Bits the read needed.
        requested: u32,
        /// Bits left in the stream.
        remaining: usize,
    },

    /// A compressed integer kept asking for more groups than a `u32` holds.
    #[error("compressed integer longer than {0} groups")]
    CompressedTooLong(u32),
}

/// Result type for bit stream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Fixed-point number format.
///
/// `integer_bits` includes the sign bit for signed formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPoint {
    /// Bits before the binary point.
    pub integer_bits: u8,
    /// Bits after the binary point.
    pub fraction_bits: u8,
    /// Two's complement when set.
    pub signed: bool,
}

impl FixedPoint {
    /// Creates a signed format.
    #[must_use]
    pub const fn signed(integer_bits: u8, fraction_bits: u8) -> Self {
        Self {
            integer_bits,
            fraction_bits,
            signed: true,
        }
    }

    /// Creates an unsigned format.
    #[must_use]
    pub const fn unsigned(integer_bits: u8, fraction_bits: u8) -> Self {
        Self {
            integer_bits,
            fraction_bits,
            signed: false,
        }
    }

    /// Total encoded width in bits.
    #[inline]
    #[must_use]
    pub const fn total_bits(self) -> u8 {
        self.integer_bits + self.fraction_bits
    }

    /// Smallest representable step.
    #[inline]
    #[must_use]
    pub fn resolution(self) -> f32 {
        1.0 / self.scale()
    }

    #[inline]
    fn scale(self) -> f32 {
        (1u64 << self.fraction_bits) as f32
    }

    fn raw_range(self) -> (i64, i64) {
        let total = u32::from(self.total_bits());
        if self.signed {
            (-(1i64 << (total - 1)), (1i64 << (total - 1)) - 1)
        } else {
            (0, (1i64 << total) - 1)
        }
    }

    /// Converts a value to its raw wire bits, clamping to the format range.
    #[must_use]
    pub fn to_raw(self, value: f32) -> u32 {
        let (min, max) = self.raw_range();
        let scaled = if value.is_finite() {
            ((f64::from(value) * f64::from(self.scale())).round() as i64).clamp(min, max)
        } else {
            0
        };
        let mask = (1u64 << self.total_bits()) - 1;
        ((scaled as u64) & mask) as u32
    }

    /// Converts raw wire bits back to a value.
    #[must_use]
    pub fn from_raw(self, raw: u32) -> f32 {
        let total = u32::from(self.total_bits());
        let mut value = i64::from(raw);
        if self.signed && value & (1i64 << (total - 1)) != 0 {
            value -= 1i64 << total;
        }
        (value as f64 / f64::from(self.scale())) as f32
    }

    /// The value the peer ends up with after a round trip.
    #[inline]
    #[must_use]
    pub fn quantize(self, value: f32) -> f32 {
        self.from_raw(self.to_raw(value))
    }
}

/// Converts an angle in radians to its 16-bit wire form.
#[must_use]
pub fn angle_to_raw(radians: f32) -> u32 {
    if !radians.is_finite() {
        return 0;
    }
    let turn = radians.rem_euclid(TAU) / TAU;
    ((turn * 65536.0).round() as u32) & 0xFFFF
}

/// Converts a 16-bit wire angle back to radians in `(-PI, PI]`.
#[must_use]
pub fn angle_from_raw(raw: u32) -> f32 {
    let radians = (raw & 0xFFFF) as f32 / 65536.0 * TAU;
    if radians > PI {
        radians - TAU
    } else {
        radians
    }
}

/// Bit writer over a pre-allocated packet buffer.
///
/// Reused across frames; `reset` rewinds without reallocating.
pub struct BitWriter {
    buffer: [u8; MAX_PACKET_SIZE],
    bit_position: usize,
}

impl BitWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_PACKET_SIZE],
            bit_position: 0,
        }
    }

    /// Rewinds the writer and clears the buffer.
    pub fn reset(&mut self) {
        self.bit_position = 0;
        self.buffer = [0u8; MAX_PACKET_SIZE];
    }

    /// Number of bits written so far.
    #[inline]
    #[must_use]
    pub const fn bits_written(&self) -> usize {
        self.bit_position
    }

    /// Number of bytes written (rounded up).
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        (self.bit_position + 7) / 8
    }

    /// The packed bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.byte_len()]
    }

    /// Writes the low `bits` bits of `value` (1-32).
    pub fn write_bits(&mut self, value: u32, bits: u8) -> BitResult<()> {
        debug_assert!(bits > 0 && bits <= 32);

        if self.bit_position + bits as usize > MAX_PACKET_SIZE * 8 {
            return Err(BitError::Overflow {
                position: self.bit_position,
                requested: u32::from(bits),
            });
        }

        for i in 0..bits {
            let byte_idx = self.bit_position / 8;
            let bit_idx = self.bit_position % 8;
            if (value >> i) & 1 == 1 {
                self.buffer[byte_idx] |= 1 << bit_idx;
            } else {
                self.buffer[byte_idx] &= !(1 << bit_idx);
            }
            self.bit_position += 1;
        }

        Ok(())
    }

    /// Writes a boolean (1 bit).
    #[inline]
    pub fn write_bit(&mut self, value: bool) -> BitResult<()> {
        self.write_bits(u32::from(value), 1)
    }

    /// Writes a byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> BitResult<()> {
        self.write_bits(u32::from(value), 8)
    }

    /// Writes a u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> BitResult<()> {
        self.write_bits(u32::from(value), 16)
    }

    /// Writes an IEEE-754 float verbatim.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> BitResult<()> {
        self.write_bits(value.to_bits(), 32)
    }

    /// Writes an unsigned integer in 7-bit groups.
    ///
    /// Small values cost 8 bits; every further group adds 8.
    pub fn write_compressed(&mut self, value: u32) -> BitResult<()> {
        let mut value = value;
        loop {
            let proceed = value >= 1 << COMPRESSED_GROUP_BITS;
            self.write_bit(proceed)?;
            self.write_bits(value & 0x7F, COMPRESSED_GROUP_BITS)?;
            value >>= COMPRESSED_GROUP_BITS;
            if !proceed {
                return Ok(());
            }
        }
    }

    /// Writes a fixed-point value, clamped to the format range.
    #[inline]
    pub fn write_fixed(&mut self, value: f32, format: FixedPoint) -> BitResult<()> {
        self.write_bits(format.to_raw(value), format.total_bits())
    }

    /// Writes an angle in radians as a 16-bit turn fraction.
    #[inline]
    pub fn write_angle(&mut self, radians: f32) -> BitResult<()> {
        self.write_bits(angle_to_raw(radians), ANGLE_BITS)
    }

    /// Writes a vector as three verbatim floats.
    pub fn write_vector(&mut self, vector: Vector3) -> BitResult<()> {
        self.write_f32(vector.x)?;
        self.write_f32(vector.y)?;
        self.write_f32(vector.z)
    }

    /// Writes a vector with one fixed-point format per component.
    pub fn write_fixed_vector(&mut self, vector: Vector3, format: FixedPoint) -> BitResult<()> {
        self.write_fixed(vector.x, format)?;
        self.write_fixed(vector.y, format)?;
        self.write_fixed(vector.z, format)
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit reader over a received packet.
pub struct BitReader<'a> {
    buffer: &'a [u8],
    bit_position: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            bit_position: 0,
        }
    }

    /// Number of bits consumed so far.
    #[inline]
    #[must_use]
    pub const fn bits_read(&self) -> usize {
        self.bit_position
    }

    /// Number of bits left, including trailing byte padding.
    #[inline]
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.bit_position)
    }

    /// Reads `bits` bits (1-32).
    ///
    /// On failure the read position does not move.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u32> {
        debug_assert!(bits > 0 && bits <= 32);

        let remaining = self.bits_remaining();
        if remaining < bits as usize {
            return Err(BitError::Exhausted {
                requested: u32::from(bits),
                remaining,
            });
        }

        let mut value = 0u32;
        for i in 0..bits {
            let byte = self.buffer[self.bit_position / 8];
            if (byte >> (self.bit_position % 8)) & 1 == 1 {
                value |= 1 << i;
            }
            self.bit_position += 1;
        }
        Ok(value)
    }

    /// Reads a boolean (1 bit).
    #[inline]
    pub fn read_bit(&mut self) -> BitResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads a byte.
    #[inline]
    pub fn read_u8(&mut self) -> BitResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a u16.
    #[inline]
    pub fn read_u16(&mut self) -> BitResult<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Reads a verbatim float.
    #[inline]
    pub fn read_f32(&mut self) -> BitResult<f32> {
        Ok(f32::from_bits(self.read_bits(32)?))
    }

    /// Reads an unsigned integer written by [`BitWriter::write_compressed`].
    pub fn read_compressed(&mut self) -> BitResult<u32> {
        let mut output: u64 = 0;
        for group in 0..COMPRESSED_MAX_GROUPS {
            let proceed = self.read_bit()?;
            let chunk = self.read_bits(COMPRESSED_GROUP_BITS)?;
            output |= u64::from(chunk) << (group * u32::from(COMPRESSED_GROUP_BITS));
            if !proceed {
                return u32::try_from(output)
                    .map_err(|_| BitError::CompressedTooLong(COMPRESSED_MAX_GROUPS));
            }
        }
        Err(BitError::CompressedTooLong(COMPRESSED_MAX_GROUPS))
    }

    /// Reads a fixed-point value.
    #[inline]
    pub fn read_fixed(&mut self, format: FixedPoint) -> BitResult<f32> {
        Ok(format.from_raw(self.read_bits(format.total_bits())?))
    }

    /// Reads an angle in radians, in `(-PI, PI]`.
    #[inline]
    pub fn read_angle(&mut self) -> BitResult<f32> {
        Ok(angle_from_raw(self.read_bits(ANGLE_BITS)?))
    }

    /// Reads three verbatim floats.
    pub fn read_vector(&mut self) -> BitResult<Vector3> {
        Ok(Vector3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Reads a vector written by [`BitWriter::write_fixed_vector`].
    pub fn read_fixed_vector(&mut self, format: FixedPoint) -> BitResult<Vector3> {
        Ok(Vector3::new(
            self.read_fixed(format)?,
            self.read_fixed(format)?,
            self.read_fixed(format)?,
        ))
    }
}
