//! # Slot Keys
//!
//! Keys are lightweight handles consisting of:
//! - An index into the slot table
//! - A generation counter for safe reuse

use std::fmt;

/// Handle issued by a slot map.
///
/// The key is split into two parts:
/// - Lower 32 bits: Index into the slot table
/// - Upper 32 bits: Generation the slot had when the key was issued
///
/// A key stays syntactically valid forever but only resolves while the slot
/// still carries the same generation. Generations wrap after 2^32 reuses of
/// one slot; a key that old could in principle alias a newer one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotKey(u64);

impl SlotKey {
    /// Creates a key from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - Slot table index (0 to 2^32-2)
    /// * `generation` - Generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the key.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the key.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Packed 64-bit form, e.g. for GPU-side handle tables.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds a key from [`to_bits`](Self::to_bits).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Null key. No map ever issues it.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this is the null key.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("SlotKey(null)")
        } else {
            write!(f, "SlotKey({}v{})", self.index(), self.generation())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key = SlotKey::new(12345, 67890);
        assert_eq!(key.index(), 12345);
        assert_eq!(key.generation(), 67890);
        assert_eq!(SlotKey::from_bits(key.to_bits()), key);
    }

    #[test]
    fn test_equality_needs_both_fields() {
        assert_eq!(SlotKey::new(1, 2), SlotKey::new(1, 2));
        assert_ne!(SlotKey::new(1, 2), SlotKey::new(1, 3));
        assert_ne!(SlotKey::new(1, 2), SlotKey::new(2, 2));
    }

    #[test]
    fn test_null_default() {
        assert!(SlotKey::default().is_null());
        assert!(!SlotKey::new(0, 0).is_null());
        assert_eq!(format!("{:?}", SlotKey::new(4, 1)), "SlotKey(4v1)");
    }
}
