//! # Chunked Slot Map
//!
//! Same contract as [`SlotMap`](super::SlotMap), but slot metadata, dense
//! values and the erase array each live in their own [`ChunkPool`].
//!
//! ```text
//! slots   ChunkPool<Slot>  [chunk 0][chunk 1]...   (zeroed, then linked)
//! values  ChunkPool<T>     [chunk 0][chunk 1]...   (dense prefix occupied)
//! erase   ChunkPool<u32>   [chunk 0][chunk 1]...   (dense pos → slot)
//! ```
//!
//! Growth adds exactly one chunk to each pool, so a value never moves
//! because of an insert. Only erase moves a value (the last one, into the
//! hole).

use std::fmt;

use super::key::SlotKey;
use super::meta::{Slot, END, MAX_SLOTS};
use crate::error::{PoolResult, SlotMapError, SlotMapResult};
use crate::memory::{
    ChunkAllocator, ChunkPool, MemoryTag, SystemAllocator, DEFAULT_ELEMENTS_PER_CHUNK,
};

/// Generational slot map whose values never move on growth.
///
/// # Thread Safety
///
/// No internal synchronization. Serialize access externally.
///
/// # Example
///
/// ```rust,ignore
/// let mut map: ChunkSlotMap<u32> = ChunkSlotMap::new(64)?;
/// let key = map.insert(7);
/// let before: *const u32 = map.try_get(key).unwrap();
/// for i in 0..1000 {
///     map.insert(i);
/// }
/// assert_eq!(before, map.try_get(key).unwrap() as *const u32);
/// ```
#[derive(Clone)]
pub struct ChunkSlotMap<T, A: ChunkAllocator = SystemAllocator> {
    slots: ChunkPool<Slot, A>,
    values: ChunkPool<T, A>,
    erase: ChunkPool<u32, A>,
    /// Head of the intrusive free list, `END` if empty.
    free_head: u32,
    /// Live value count; values occupy dense positions `[0, len)`.
    len: usize,
}

impl<T> ChunkSlotMap<T> {
    /// Creates an empty map on the system allocator.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ChunkSizeNotPowerOfTwo`](crate::PoolError) if
    /// `elements_per_chunk` is zero or not a power of two.
    pub fn new(elements_per_chunk: usize) -> PoolResult<Self> {
        Self::with_allocator(elements_per_chunk, SystemAllocator)
    }
}

impl<T, A: ChunkAllocator> ChunkSlotMap<T, A> {
    /// Creates an empty map drawing chunks from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ChunkSizeNotPowerOfTwo`](crate::PoolError) if
    /// `elements_per_chunk` is zero or not a power of two.
    pub fn with_allocator(elements_per_chunk: usize, alloc: A) -> PoolResult<Self> {
        Self::with_value_tag(elements_per_chunk, alloc, MemoryTag::DenseValues)
    }

    /// Like [`with_allocator`](Self::with_allocator), reporting value chunks
    /// under `value_tag`.
    ///
    /// # Errors
    ///
    /// Same as [`with_allocator`](Self::with_allocator).
    pub fn with_value_tag(
        elements_per_chunk: usize,
        alloc: A,
        value_tag: MemoryTag,
    ) -> PoolResult<Self> {
        Ok(Self {
            slots: ChunkPool::with_allocator(
                elements_per_chunk,
                MemoryTag::SlotTable,
                alloc.clone(),
            )?,
            values: ChunkPool::with_allocator(elements_per_chunk, value_tag, alloc.clone())?,
            erase: ChunkPool::with_allocator(elements_per_chunk, MemoryTag::EraseTable, alloc)?,
            free_head: END,
            len: 0,
        })
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no values are live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the slot table (live + free slots).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Slots added per growth step.
    #[inline]
    #[must_use]
    pub const fn elements_per_chunk(&self) -> usize {
        self.slots.elements_per_chunk()
    }

    /// Number of chunks in the slot table.
    #[inline]
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.slots.chunk_count()
    }

    /// Ensures at least `additional` more values fit without growing.
    ///
    /// Adds whole chunks, so capacity may overshoot.
    ///
    /// # Errors
    ///
    /// Returns [`SlotMapError::Exhausted`] past the 32-bit index space and
    /// [`SlotMapError::Pool`] if a chunk cannot be allocated.
    pub fn reserve(&mut self, additional: usize) -> SlotMapResult<()> {
        let wanted = self.len.saturating_add(additional);
        if wanted > MAX_SLOTS {
            return Err(SlotMapError::Exhausted(self.capacity()));
        }
        while self.capacity() < wanted {
            self.grow()?;
        }
        Ok(())
    }

    /// Adds one chunk to every pool and pushes its slots, ascending, onto
    /// the front of the free list.
    fn grow(&mut self) -> SlotMapResult<()> {
        let chunks = self.slots.chunk_count();
        let per_chunk = self.elements_per_chunk();
        let start = chunks * per_chunk;
        let end = start + per_chunk;
        if end > MAX_SLOTS {
            return Err(SlotMapError::Exhausted(start));
        }

        // Values and erase first: a failure there leaves the slot table,
        // which defines capacity, untouched.
        self.values.resize(chunks + 1)?;
        self.erase.resize(chunks + 1)?;
        self.slots.cleared_resize(chunks + 1)?;

        let previous_head = self.free_head;
        for index in start..end {
            let next = if index + 1 < end {
                index as u32 + 1
            } else {
                previous_head
            };
            self.slots.at_mut(index).link = next;
        }
        self.free_head = start as u32;

        tracing::debug!(
            "chunk slot map grew to {} chunks ({} slots)",
            chunks + 1,
            end
        );
        Ok(())
    }

    /// Inserts a value, returning its key.
    ///
    /// # Panics
    ///
    /// Panics if the map cannot grow (32-bit index space exhausted or the
    /// allocator failed). Use [`try_insert`](Self::try_insert) to handle that.
    #[inline]
    #[track_caller]
    pub fn insert(&mut self, value: T) -> SlotKey {
        match self.try_insert(value) {
            Ok(key) => key,
            Err(err) => panic!("chunk slot map insert failed: {err}"),
        }
    }

    /// Inserts a value, reporting growth failure instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`SlotMapError::Exhausted`] or [`SlotMapError::Pool`]; the
    /// value is dropped in that case.
    pub fn try_insert(&mut self, value: T) -> SlotMapResult<SlotKey> {
        if self.free_head == END {
            self.grow()?;
        }

        let index = self.free_head;
        let dense = self.len;
        let slot = self.slots.at_mut(index as usize);
        self.free_head = slot.link;
        let generation = slot.occupy(dense as u32);

        let displaced = self.values.set(dense, value);
        debug_assert!(displaced.is_none(), "dense position {dense} was occupied");
        self.erase.set(dense, index);
        self.len += 1;

        Ok(SlotKey::new(index, generation))
    }

    /// Dense position for a live key.
    #[inline]
    fn locate(&self, key: SlotKey) -> Option<usize> {
        let slot = self.slots.get(key.index() as usize)?;
        slot.matches(key).then_some(slot.link as usize)
    }

    /// Dense position for a live key, or the reason it does not resolve.
    fn resolve(&self, key: SlotKey) -> SlotMapResult<usize> {
        let index = key.index();
        let Some(slot) = self.slots.get(index as usize) else {
            return Err(SlotMapError::OutOfRange {
                index,
                len: self.capacity(),
            });
        };
        if !slot.occupied {
            return Err(SlotMapError::Vacant { index });
        }
        if slot.generation != key.generation() {
            return Err(SlotMapError::StaleKey {
                index,
                expected: slot.generation,
                found: key.generation(),
            });
        }
        Ok(slot.link as usize)
    }

    /// Returns `true` if `key` resolves to a live value.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: SlotKey) -> bool {
        self.locate(key).is_some()
    }

    /// Trusting accessor: the caller expects `key` to be live.
    ///
    /// # Errors
    ///
    /// Returns [`SlotMapError::OutOfRange`], [`SlotMapError::Vacant`] or
    /// [`SlotMapError::StaleKey`] when it is not.
    #[inline]
    pub fn get(&self, key: SlotKey) -> SlotMapResult<&T> {
        let dense = self.resolve(key)?;
        Ok(self.values.at(dense))
    }

    /// Mutable form of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, key: SlotKey) -> SlotMapResult<&mut T> {
        let dense = self.resolve(key)?;
        Ok(self.values.at_mut(dense))
    }

    /// Defensive accessor: `None` for any key that does not resolve.
    #[inline]
    #[must_use]
    pub fn try_get(&self, key: SlotKey) -> Option<&T> {
        self.values.get(self.locate(key)?)
    }

    /// Mutable form of [`try_get`](Self::try_get).
    #[inline]
    pub fn try_get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        let dense = self.locate(key)?;
        self.values.get_mut(dense)
    }

    /// Removes the value behind `key` and returns it.
    ///
    /// Stale, vacant and out-of-range keys return `None` and change nothing.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let dense = self.locate(key)?;
        let last = self.len - 1;

        let value = self.values.take(dense)?;
        if dense != last {
            if let Some(moved) = self.values.take(last) {
                self.values.set(dense, moved);
            }
            let owner = *self.erase.at(last);
            self.erase.set(dense, owner);
            self.slots.at_mut(owner as usize).link = dense as u32;
        }

        let index = key.index();
        let free_head = self.free_head;
        self.slots.at_mut(index as usize).vacate(free_head);
        self.free_head = index;
        self.len -= 1;

        Some(value)
    }

    /// Drops the value behind `key`. Returns `false` if the key was not live.
    #[inline]
    pub fn erase(&mut self, key: SlotKey) -> bool {
        self.remove(key).is_some()
    }

    /// Drops every value and invalidates every outstanding key.
    ///
    /// Chunks are kept; the whole slot table is relinked into one ascending
    /// free list.
    pub fn clear(&mut self) {
        let dropped = self.len;
        self.drop_values();

        let capacity = self.capacity();
        for index in 0..capacity {
            let next = if index + 1 < capacity { index as u32 + 1 } else { END };
            self.slots.at_mut(index).link = next;
        }
        self.free_head = if capacity > 0 { 0 } else { END };

        if dropped > 0 {
            tracing::debug!("chunk slot map cleared {} values", dropped);
        }
    }

    /// Moves out and drops every live value, vacating its slot.
    fn drop_values(&mut self) {
        for dense in 0..self.len {
            drop(self.values.take(dense));
            let owner = *self.erase.at(dense);
            self.slots.at_mut(owner as usize).vacate(END);
        }
        self.len = 0;
    }

    /// Iterates over live values in dense order. The order changes on erase.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter().take(self.len)
    }

    /// Iterates mutably over live values in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        let len = self.len;
        self.values.iter_mut().take(len)
    }

    /// Keys of live values, in the same order as [`iter`](Self::iter).
    pub fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        (0..self.len).map(move |dense| {
            let owner = *self.erase.at(dense);
            SlotKey::new(owner, self.slots.at(owner as usize).generation)
        })
    }

    /// Live `(key, value)` pairs in dense order.
    pub fn iter_with_keys(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.keys().zip(self.iter())
    }
}

impl<T, A: ChunkAllocator> Drop for ChunkSlotMap<T, A> {
    fn drop(&mut self) {
        // Values die before their chunks are handed back to the allocator.
        self.drop_values();
    }
}

impl<T, A: ChunkAllocator> ChunkSlotMap<T, A> {
    /// Infallible constructor for callers that already hold a valid shift.
    pub(crate) fn with_shift(shift: u32, alloc: A, value_tag: MemoryTag) -> Self {
        Self {
            slots: ChunkPool::with_shift(shift, MemoryTag::SlotTable, alloc.clone()),
            values: ChunkPool::with_shift(shift, value_tag, alloc.clone()),
            erase: ChunkPool::with_shift(shift, MemoryTag::EraseTable, alloc),
            free_head: END,
            len: 0,
        }
    }
}

impl<T, A: ChunkAllocator + Default> Default for ChunkSlotMap<T, A> {
    fn default() -> Self {
        Self::with_shift(
            DEFAULT_ELEMENTS_PER_CHUNK.trailing_zeros(),
            A::default(),
            MemoryTag::DenseValues,
        )
    }
}

impl<T: fmt::Debug, A: ChunkAllocator> fmt::Debug for ChunkSlotMap<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter_with_keys()).finish()
    }
}
