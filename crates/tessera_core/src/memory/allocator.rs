//! # Chunk Allocators
//!
//! Allocation strategy for chunked pools, passed in explicitly as a type
//! parameter instead of hooking the global allocator.

use std::mem::size_of;
use std::sync::Arc;

use super::tracker::{MemoryTag, MemoryTracker};
use crate::error::{PoolError, PoolResult};

/// One fixed-capacity block of pool storage. Empty positions are `None`.
pub type Chunk<T> = Box<[Option<T>]>;

/// Size in bytes of a chunk holding `len` elements of `T`.
#[inline]
#[must_use]
pub fn chunk_bytes<T>(len: usize) -> usize {
    len.saturating_mul(size_of::<Option<T>>())
}

/// Source of chunk memory for [`ChunkPool`](super::ChunkPool).
///
/// Implementations must hand back chunks of exactly `len` empty positions.
/// Allocation failure is reported as [`PoolError::AllocationFailed`], never
/// papered over.
pub trait ChunkAllocator: Clone + 'static {
    /// Allocates a chunk of `len` empty positions.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AllocationFailed`] if memory cannot be reserved.
    fn allocate_chunk<T>(&self, len: usize, tag: MemoryTag) -> PoolResult<Chunk<T>>;

    /// Takes back a chunk. Any values still inside are dropped.
    fn release_chunk<T>(&self, chunk: Chunk<T>, tag: MemoryTag);
}

/// Reserves `len` positions on the heap without aborting on failure.
fn try_new_chunk<T>(len: usize) -> PoolResult<Chunk<T>> {
    let mut positions = Vec::new();
    positions
        .try_reserve_exact(len)
        .map_err(|_| PoolError::AllocationFailed {
            bytes: chunk_bytes::<T>(len),
        })?;
    positions.resize_with(len, || None);
    Ok(positions.into_boxed_slice())
}

/// Plain heap allocator. The default for every container.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl ChunkAllocator for SystemAllocator {
    #[inline]
    fn allocate_chunk<T>(&self, len: usize, _tag: MemoryTag) -> PoolResult<Chunk<T>> {
        try_new_chunk(len)
    }

    #[inline]
    fn release_chunk<T>(&self, chunk: Chunk<T>, _tag: MemoryTag) {
        drop(chunk);
    }
}

/// Heap allocator that reports every chunk to a shared [`MemoryTracker`].
///
/// # Example
///
/// ```rust,ignore
/// let tracker = Arc::new(MemoryTracker::new());
/// let mut map = ChunkSlotMap::with_allocator(64, TrackingAllocator::new(tracker.clone()))?;
/// map.insert(1u32);
/// assert!(tracker.stats(MemoryTag::DenseValues).live_bytes > 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TrackingAllocator {
    tracker: Arc<MemoryTracker>,
}

impl TrackingAllocator {
    /// Creates an allocator reporting into `tracker`.
    #[must_use]
    pub fn new(tracker: Arc<MemoryTracker>) -> Self {
        Self { tracker }
    }

    /// The tracker this allocator reports into.
    #[must_use]
    pub fn tracker(&self) -> &Arc<MemoryTracker> {
        &self.tracker
    }
}

impl ChunkAllocator for TrackingAllocator {
    fn allocate_chunk<T>(&self, len: usize, tag: MemoryTag) -> PoolResult<Chunk<T>> {
        let chunk = try_new_chunk(len)?;
        self.tracker.record_allocation(tag, chunk_bytes::<T>(len));
        Ok(chunk)
    }

    fn release_chunk<T>(&self, chunk: Chunk<T>, tag: MemoryTag) {
        self.tracker.record_release(tag, chunk_bytes::<T>(chunk.len()));
        drop(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_chunk_is_empty() {
        let chunk: Chunk<u64> = SystemAllocator
            .allocate_chunk(16, MemoryTag::Block)
            .unwrap();
        assert_eq!(chunk.len(), 16);
        assert!(chunk.iter().all(Option::is_none));
    }

    #[test]
    fn test_tracking_allocator_balances() {
        let tracker = Arc::new(MemoryTracker::new());
        let alloc = TrackingAllocator::new(Arc::clone(&tracker));

        let chunk: Chunk<u32> = alloc.allocate_chunk(8, MemoryTag::Block).unwrap();
        let stats = tracker.stats(MemoryTag::Block);
        assert_eq!(stats.live_bytes, chunk_bytes::<u32>(8));
        assert_eq!(stats.allocations, 1);

        alloc.release_chunk(chunk, MemoryTag::Block);
        let stats = tracker.stats(MemoryTag::Block);
        assert_eq!(stats.live_bytes, 0);
        assert_eq!(stats.releases, 1);
    }

    #[test]
    fn test_huge_chunk_reports_failure() {
        let result: PoolResult<Chunk<u64>> =
            SystemAllocator.allocate_chunk(usize::MAX / 2, MemoryTag::Block);
        assert!(matches!(result, Err(PoolError::AllocationFailed { .. })));
    }
}
