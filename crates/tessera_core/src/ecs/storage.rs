//! # Component Storage
//!
//! One [`ChunkSlotMap`] per component type, held behind a type-erased trait
//! object so the manager can keep every type in a single table indexed by
//! [`ComponentId`](super::ComponentId). Component chunks come from the
//! manager's allocator under [`MemoryTag::EcsComponentMap`](crate::MemoryTag).
//!
//! Only the operations that do not need the concrete type are erased
//! (erase by key, clear, len). Typed access downcasts.

use std::any::Any;

use super::component::Component;
use crate::memory::ChunkAllocator;
use crate::slot::{ChunkSlotMap, SlotKey};

/// Type-erased view of one component type's storage.
pub(crate) trait ErasedStorage: Any {
    /// Drops the component behind `key`. `false` if it was not live.
    fn erase(&mut self, key: SlotKey) -> bool;

    /// Drops every component of this type.
    fn clear(&mut self);

    /// Number of live components.
    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component, A: ChunkAllocator> ErasedStorage for ChunkSlotMap<C, A> {
    #[inline]
    fn erase(&mut self, key: SlotKey) -> bool {
        ChunkSlotMap::erase(self, key)
    }

    fn clear(&mut self) {
        ChunkSlotMap::clear(self);
    }

    #[inline]
    fn len(&self) -> usize {
        ChunkSlotMap::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Storage table entry: `None` until the first component of the type is
/// assigned.
pub(crate) type StorageSlot = Option<Box<dyn ErasedStorage>>;

/// Typed view of a table entry.
#[inline]
pub(crate) fn typed<C: Component, A: ChunkAllocator>(
    slot: &StorageSlot,
) -> Option<&ChunkSlotMap<C, A>> {
    slot.as_deref()?.as_any().downcast_ref::<ChunkSlotMap<C, A>>()
}

/// Mutable typed view of a table entry.
#[inline]
pub(crate) fn typed_mut<C: Component, A: ChunkAllocator>(
    slot: &mut StorageSlot,
) -> Option<&mut ChunkSlotMap<C, A>> {
    slot.as_deref_mut()?
        .as_any_mut()
        .downcast_mut::<ChunkSlotMap<C, A>>()
}
