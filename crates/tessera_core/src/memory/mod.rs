//! # Memory Management
//!
//! Chunked storage and the allocators that feed it.
//!
//! ## Design Philosophy
//!
//! Containers grow by whole chunks, never by reallocating and copying:
//! - Existing elements keep their addresses across growth
//! - Index decomposition is a shift and a mask (power-of-two chunks)
//! - Chunk memory comes from an explicit [`ChunkAllocator`], tagged by purpose

mod allocator;
mod chunk_pool;
mod tracker;

pub use allocator::{chunk_bytes, Chunk, ChunkAllocator, SystemAllocator, TrackingAllocator};
pub use chunk_pool::{ChunkPool, DEFAULT_ELEMENTS_PER_CHUNK};
pub use tracker::{MemoryTag, MemoryTracker, TagStats};
