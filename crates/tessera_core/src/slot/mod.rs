//! # Slot Maps
//!
//! Generational containers with O(1) insert, lookup and erase.
//!
//! ## Design Principles
//!
//! 1. **Stable keys**: a [`SlotKey`] keeps naming the same value until that
//!    value is erased, no matter how the container is compacted
//! 2. **Dense values**: live values sit contiguously and iterate without
//!    holes; erase moves the last value into the hole
//! 3. **Safe reuse**: every vacated slot bumps its generation, so old keys
//!    stop resolving instead of aliasing the next occupant
//!
//! ## Flavours
//!
//! - [`SlotMap`]: values in one `Vec`. Growth may move values.
//! - [`ChunkSlotMap`]: values in a [`ChunkPool`](crate::memory::ChunkPool).
//!   Growth never moves values.

mod chunk_slot_map;
mod key;
mod meta;
mod slot_map;

pub use chunk_slot_map::ChunkSlotMap;
pub use key::SlotKey;
pub use slot_map::SlotMap;
