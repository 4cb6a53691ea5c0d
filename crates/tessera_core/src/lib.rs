//! # Tessera Core
//!
//! Generational slot storage and a small entity manager built on it:
//! - O(1) insert, lookup and erase behind stable, reusable keys
//! - Dense value storage that iterates without holes
//! - Chunked variant whose values never move on growth
//!
//! ## Architecture Rules
//!
//! 1. **Stale keys never alias** - every reuse of a slot bumps its generation
//! 2. **Growth is by chunk** - `ChunkPool` appends, it never reallocates
//! 3. **Allocation is explicit** - chunk memory comes from a `ChunkAllocator`
//!    and is tagged by purpose
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{ComponentRegistry, EntityManager, SlotMap};
//!
//! let mut map = SlotMap::new();
//! let key = map.insert("value");
//! assert_eq!(map.try_get(key), Some(&"value"));
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register::<Health>()?;
//! let mut manager = EntityManager::new(registry);
//! let entity = manager.allocate();
//! manager.assign(entity, Health(100))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod slot;

pub use config::StorageConfig;
pub use ecs::{Component, ComponentId, ComponentRegistry, Entity, EntityManager};
pub use error::{
    ConfigError, ConfigResult, EcsError, EcsResult, PoolError, PoolResult, SlotMapError,
    SlotMapResult,
};
pub use memory::{
    ChunkAllocator, ChunkPool, MemoryTag, MemoryTracker, SystemAllocator, TrackingAllocator,
};
pub use slot::{ChunkSlotMap, SlotKey, SlotMap};
