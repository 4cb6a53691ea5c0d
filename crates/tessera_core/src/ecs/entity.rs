//! # Entity Handles
//!
//! An entity is nothing but a key into the entity table. Components hang off
//! the table record, not off the handle.

use std::fmt;

use crate::slot::SlotKey;

/// Handle to an entity owned by an [`EntityManager`](super::EntityManager).
///
/// Copyable and hashable. A handle outlives its entity safely: once the
/// entity is released every lookup through the handle fails, even after the
/// slot is handed to a new entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Entity(SlotKey);

impl Entity {
    /// Handle that never names a live entity.
    pub const NULL: Self = Self(SlotKey::NULL);

    #[inline]
    pub(crate) const fn from_key(key: SlotKey) -> Self {
        Self(key)
    }

    /// The underlying entity table key.
    #[inline]
    #[must_use]
    pub const fn key(self) -> SlotKey {
        self.0
    }

    /// Slot index in the entity table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0.index()
    }

    /// Generation the slot had when this entity was allocated.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.0.generation()
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index(), self.generation())
        }
    }
}
