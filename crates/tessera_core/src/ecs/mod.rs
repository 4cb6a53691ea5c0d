//! # Entity/Component Storage
//!
//! Entities are handles into a [`ChunkSlotMap`](crate::slot::ChunkSlotMap);
//! components live in one chunked slot map per type, drawn from the same
//! allocator.
//!
//! ## Design Principles
//!
//! 1. **Explicit registry**: component types get ids from a
//!    [`ComponentRegistry`] built at startup, never from global state
//! 2. **No leaks**: releasing an entity drops its components; assigning an
//!    existing component replaces it
//! 3. **Stale handles fail softly**: `try_get`, `contains`, `remove` and
//!    `release` report absence instead of erroring

mod component;
mod entity;
mod manager;
mod storage;

pub use component::{Component, ComponentId, ComponentRegistry, DEFAULT_MAX_COMPONENT_TYPES};
pub use entity::Entity;
pub use manager::EntityManager;
