//! # Chunked Pool
//!
//! Segmented storage that grows by appending fixed-size chunks.
//!
//! ```text
//! chunks: Vec<Chunk<T>>          (the Vec may reallocate...)
//!   [0] ──► [ e0  e1  e2  e3 ]   (...but the chunks it points to never move)
//!   [1] ──► [ e4  e5  e6  e7 ]
//!   [2] ──► [ e8  e9  --  -- ]
//!
//! index 9  =>  chunk 9 >> 2 = 2, offset 9 & 3 = 1
//! ```
//!
//! The pool stores values but has no opinion on their lifetime: `set` hands
//! any previous occupant back to the caller, and `take` moves a value out.
//! Containers built on top decide when values die.

use bytemuck::Zeroable;

use super::allocator::{chunk_bytes, Chunk, ChunkAllocator, SystemAllocator};
use super::tracker::MemoryTag;
use crate::error::{PoolError, PoolResult};

/// Segmented array with stable element addresses.
///
/// Growth appends whole chunks of `elements_per_chunk` positions. Elements
/// already stored are never moved or copied by growth, so a reference taken
/// before a `resize` points at the same element afterwards.
///
/// # Thread Safety
///
/// No internal synchronization. Serialize access externally.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: ChunkPool<u32> = ChunkPool::new(4)?;
/// pool.resize(1)?;
/// pool.set(3, 1);
/// assert_eq!(pool.len(), 4);
/// assert_eq!(*pool.at(3), 1);
/// ```
pub struct ChunkPool<T, A: ChunkAllocator = SystemAllocator> {
    /// Owned chunks, each exactly `mask + 1` positions long.
    chunks: Vec<Chunk<T>>,
    /// log2 of the chunk size.
    shift: u32,
    /// Chunk size minus one.
    mask: usize,
    /// High-water mark: one past the highest position ever `set`.
    len: usize,
    /// Tag reported to the allocator.
    tag: MemoryTag,
    alloc: A,
}

impl<T> ChunkPool<T> {
    /// Creates an empty pool on the system allocator.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ChunkSizeNotPowerOfTwo`] if `elements_per_chunk`
    /// is zero or not a power of two.
    pub fn new(elements_per_chunk: usize) -> PoolResult<Self> {
        Self::with_allocator(elements_per_chunk, MemoryTag::Block, SystemAllocator)
    }
}

impl<T, A: ChunkAllocator> ChunkPool<T, A> {
    /// Creates an empty pool that takes chunks from `alloc`, tagged `tag`.
    ///
    /// No memory is allocated until the first `resize`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ChunkSizeNotPowerOfTwo`] if `elements_per_chunk`
    /// is zero or not a power of two.
    pub fn with_allocator(
        elements_per_chunk: usize,
        tag: MemoryTag,
        alloc: A,
    ) -> PoolResult<Self> {
        if !elements_per_chunk.is_power_of_two() {
            return Err(PoolError::ChunkSizeNotPowerOfTwo(elements_per_chunk));
        }
        Ok(Self::with_shift(elements_per_chunk.trailing_zeros(), tag, alloc))
    }

    /// Infallible constructor for callers that already hold a valid shift.
    pub(crate) fn with_shift(shift: u32, tag: MemoryTag, alloc: A) -> Self {
        Self {
            chunks: Vec::new(),
            shift,
            mask: (1_usize << shift) - 1,
            len: 0,
            tag,
            alloc,
        }
    }

    /// Positions per chunk.
    #[inline]
    #[must_use]
    pub const fn elements_per_chunk(&self) -> usize {
        self.mask + 1
    }

    /// Number of allocated chunks.
    #[inline]
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total addressable positions.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.len() << self.shift
    }

    /// One past the highest position ever written with `set`.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing has been written since creation or `clear`.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Memory tag used for this pool's chunks.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> MemoryTag {
        self.tag
    }

    /// The allocator chunks are taken from.
    #[inline]
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Splits a flat index into (chunk, offset).
    #[inline]
    const fn locate(&self, index: usize) -> (usize, usize) {
        (index >> self.shift, index & self.mask)
    }

    /// Returns the element at `index`, or `None` if the position is empty or
    /// beyond capacity.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let (chunk, offset) = self.locate(index);
        self.chunks.get(chunk)?[offset].as_ref()
    }

    /// Mutable form of [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (chunk, offset) = self.locate(index);
        self.chunks.get_mut(chunk)?[offset].as_mut()
    }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()` or the position is empty.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn at(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => vacant(index, self.capacity()),
        }
    }

    /// Mutable form of [`at`](Self::at).
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()` or the position is empty.
    #[inline]
    #[track_caller]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        let capacity = self.capacity();
        match self.get_mut(index) {
            Some(value) => value,
            None => vacant(index, capacity),
        }
    }

    /// Writes `value` at `index` and raises `len` to at least `index + 1`.
    ///
    /// The previous occupant, if any, is returned rather than dropped.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()`. Call `resize` first.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        assert!(
            index < self.capacity(),
            "chunk pool set at {index} beyond capacity {}",
            self.capacity()
        );
        let (chunk, offset) = self.locate(index);
        self.len = self.len.max(index + 1);
        self.chunks[chunk][offset].replace(value)
    }

    /// Iterates over occupied positions in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.iter())
            .filter_map(Option::as_ref)
    }

    /// Iterates mutably over occupied positions in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.chunks
            .iter_mut()
            .flat_map(|chunk| chunk.iter_mut())
            .filter_map(Option::as_mut)
    }

    /// Moves the value at `index` out, leaving the position empty.
    ///
    /// `len` is unaffected. Returns `None` for empty or out-of-range positions.
    #[inline]
    pub fn take(&mut self, index: usize) -> Option<T> {
        let (chunk, offset) = self.locate(index);
        self.chunks.get_mut(chunk)?[offset].take()
    }

    /// Ensures at least `chunks` chunks are allocated.
    ///
    /// Existing chunks are untouched. New positions start empty.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CapacityOverflow`] if the element count does not
    /// fit in `usize`, or [`PoolError::AllocationFailed`] if the allocator
    /// refuses a chunk. Chunks added before the failure are kept.
    pub fn resize(&mut self, chunks: usize) -> PoolResult<()> {
        self.grow(chunks, |_| {})
    }

    /// Releases every chunk. Capacity and `len` return to zero.
    pub fn clear(&mut self) {
        let released = self.chunks.len();
        for chunk in self.chunks.drain(..) {
            self.alloc.release_chunk(chunk, self.tag);
        }
        self.len = 0;
        if released > 0 {
            tracing::debug!(
                "chunk pool ({:?}) released {} chunks",
                self.tag,
                released
            );
        }
    }

    fn grow(&mut self, chunks: usize, mut fill: impl FnMut(&mut Chunk<T>)) -> PoolResult<()> {
        let current = self.chunks.len();
        if chunks <= current {
            return Ok(());
        }

        let per_chunk = self.elements_per_chunk();
        if chunks.checked_mul(per_chunk).is_none() {
            return Err(PoolError::CapacityOverflow {
                requested: chunks.saturating_mul(per_chunk),
            });
        }

        self.chunks
            .try_reserve(chunks - current)
            .map_err(|_| PoolError::AllocationFailed {
                bytes: (chunks - current).saturating_mul(std::mem::size_of::<Chunk<T>>()),
            })?;

        while self.chunks.len() < chunks {
            let mut chunk = self.alloc.allocate_chunk(per_chunk, self.tag)?;
            fill(&mut chunk);
            self.chunks.push(chunk);
        }

        tracing::debug!(
            "chunk pool ({:?}) grew {} -> {} chunks ({} bytes each)",
            self.tag,
            current,
            chunks,
            chunk_bytes::<T>(per_chunk)
        );
        Ok(())
    }
}

impl<T: Zeroable, A: ChunkAllocator> ChunkPool<T, A> {
    /// Like [`resize`](Self::resize), but every new position holds
    /// `T::zeroed()` instead of being empty.
    ///
    /// Zeroed positions are readable but are not counted in `len`.
    ///
    /// # Errors
    ///
    /// Same as [`resize`](Self::resize).
    pub fn cleared_resize(&mut self, chunks: usize) -> PoolResult<()> {
        self.grow(chunks, |chunk| {
            for position in chunk.iter_mut() {
                *position = Some(T::zeroed());
            }
        })
    }
}

impl<T, A: ChunkAllocator> Drop for ChunkPool<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: ChunkAllocator + Default> Default for ChunkPool<T, A> {
    fn default() -> Self {
        Self::with_shift(
            DEFAULT_ELEMENTS_PER_CHUNK.trailing_zeros(),
            MemoryTag::Block,
            A::default(),
        )
    }
}

#[cold]
#[track_caller]
fn vacant(index: usize, capacity: usize) -> ! {
    panic!("chunk pool position {index} is empty or beyond capacity {capacity}")
}

/// Chunk size used by `Default` pools and maps.
pub const DEFAULT_ELEMENTS_PER_CHUNK: usize = 4096;

impl<T: Clone, A: ChunkAllocator> Clone for ChunkPool<T, A> {
    /// Deep copy: new chunks are allocated and every stored value cloned.
    ///
    /// # Panics
    ///
    /// Panics if the allocator cannot provide the chunks (fatal exhaustion).
    fn clone(&self) -> Self {
        let mut copy = Self {
            chunks: Vec::with_capacity(self.chunks.len()),
            shift: self.shift,
            mask: self.mask,
            len: self.len,
            tag: self.tag,
            alloc: self.alloc.clone(),
        };

        for source in &self.chunks {
            let mut chunk = match copy.alloc.allocate_chunk(source.len(), copy.tag) {
                Ok(chunk) => chunk,
                Err(err) => panic!("chunk pool clone failed: {err}"),
            };
            chunk.clone_from_slice(source);
            copy.chunks.push(chunk);
        }
        copy
    }
}
