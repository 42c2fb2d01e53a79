//! # Entity References
//!
//! Identifiers for other entities in the world, as they appear on the wire.
//!
//! A reference is 17 bits wide. The all-ones value is reserved as the
//! "no entity" sentinel, so `Option<EntityRef>` maps onto the wire without
//! an extra presence bit.

use crate::bits::{BitReader, BitResult, BitWriter};

/// Wire width of an entity reference.
pub const ENTITY_REF_BITS: u8 = 17;

/// Raw wire value meaning "no entity".
pub const INVALID_ENTITY_RAW: u32 = (1 << ENTITY_REF_BITS) - 1;

/// Reference to an entity known to both peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef(u32);

impl EntityRef {
    /// Creates a reference, or `None` for the sentinel and out-of-range ids.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw < INVALID_ENTITY_RAW {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// The raw identifier.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Wire form of an optional reference.
    #[inline]
    #[must_use]
    pub const fn to_wire(entity: Option<Self>) -> u32 {
        match entity {
            Some(entity) => entity.0,
            None => INVALID_ENTITY_RAW,
        }
    }

    /// Optional reference from its wire form.
    #[inline]
    #[must_use]
    pub const fn from_wire(raw: u32) -> Option<Self> {
        Self::new(raw)
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl BitWriter {
    /// Writes an optional entity reference.
    #[inline]
    pub fn write_entity(&mut self, entity: Option<EntityRef>) -> BitResult<()> {
        self.write_bits(EntityRef::to_wire(entity), ENTITY_REF_BITS)
    }
}

impl BitReader<'_> {
    /// Reads an optional entity reference.
    #[inline]
    pub fn read_entity(&mut self) -> BitResult<Option<EntityRef>> {
        Ok(EntityRef::from_wire(self.read_bits(ENTITY_REF_BITS)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_none() {
        assert_eq!(EntityRef::new(INVALID_ENTITY_RAW), None);
        assert_eq!(EntityRef::new(INVALID_ENTITY_RAW + 5), None);
        assert_eq!(EntityRef::new(0).map(EntityRef::raw), Some(0));
    }

    #[test]
    fn test_entity_on_the_wire() {
        let entity = EntityRef::new(1234);

        let mut writer = BitWriter::new();
        writer.write_entity(entity).unwrap();
        writer.write_entity(None).unwrap();
        assert_eq!(writer.bits_written(), 2 * ENTITY_REF_BITS as usize);

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(reader.read_entity().unwrap(), entity);
        assert_eq!(reader.read_entity().unwrap(), None);
    }
}
