//! # Slot Map
//!
//! Generational handle → value mapping over contiguous storage.
//!
//! ```text
//! slots:   [ g0:→1 ][ g2:@0 ][ g0:→3 ][ g1:@1 ]...   (→ free link, @ dense pos)
//! values:  [  B  ][  D  ]                            (dense, no gaps)
//! erase:   [  1  ][  3  ]                            (dense pos → slot)
//! free_head = 0
//! ```
//!
//! Erase swaps the last dense value into the hole and patches its slot via
//! the erase array, so every operation is O(1).

use std::fmt;
use std::ops::{Index, IndexMut};

use super::key::SlotKey;
use super::meta::{Slot, END, MAX_SLOTS};
use crate::error::{PoolError, SlotMapError, SlotMapResult};

/// Smallest block of slots added by one growth step.
const MIN_GROWTH: usize = 8;

/// Generational slot map backed by three contiguous arrays.
///
/// Growth doubles the slot table (minimum 8) and may move values; use
/// [`ChunkSlotMap`](super::ChunkSlotMap) when addresses must survive inserts.
///
/// # Thread Safety
///
/// No internal synchronization. Serialize access externally.
///
/// # Example
///
/// ```rust,ignore
/// let mut map = SlotMap::new();
/// let key = map.insert(10);
/// assert_eq!(map.try_get(key), Some(&10));
/// assert!(map.erase(key));
/// assert!(!map.contains(key));
/// ```
#[derive(Clone)]
pub struct SlotMap<T> {
    /// Slot table, one entry per index ever handed out.
    slots: Vec<Slot>,
    /// Live values, packed.
    values: Vec<T>,
    /// `erase[i]` is the slot owning `values[i]`.
    erase: Vec<u32>,
    /// Head of the intrusive free list, `END` if empty.
    free_head: u32,
}

impl<T> SlotMap<T> {
    /// Creates an empty map. Nothing is allocated until the first insert.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            values: Vec::new(),
            erase: Vec::new(),
            free_head: END,
        }
    }

    /// Creates a map with room for `capacity` values before growing.
    ///
    /// # Panics
    ///
    /// Panics if the memory cannot be reserved or `capacity` exceeds the
    /// 32-bit index space.
    #[must_use]
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut map = Self::new();
        if let Err(err) = map.reserve(capacity) {
            panic!("slot map reservation failed: {err}");
        }
        map
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Size of the slot table (live + free slots).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Ensures at least `additional` more values fit without growing.
    ///
    /// New slots are appended to the tail of the free list.
    ///
    /// # Errors
    ///
    /// Returns [`SlotMapError::Exhausted`] past the 32-bit index space and
    /// [`SlotMapError::Pool`] if memory cannot be reserved.
    pub fn reserve(&mut self, additional: usize) -> SlotMapResult<()> {
        let wanted = self.len().saturating_add(additional);
        if wanted <= self.capacity() {
            return Ok(());
        }
        if wanted > MAX_SLOTS {
            return Err(SlotMapError::Exhausted(self.capacity()));
        }
        self.extend_slots(wanted)
    }

    /// Grows the slot table by one block. Only called with an empty free list.
    fn grow(&mut self) -> SlotMapResult<()> {
        let current = self.capacity();
        let target = current.saturating_mul(2).max(MIN_GROWTH).min(MAX_SLOTS);
        if target <= current {
            return Err(SlotMapError::Exhausted(current));
        }
        self.extend_slots(target)
    }

    /// Appends vacant slots up to `target` and links them ascending after
    /// the current free list tail.
    fn extend_slots(&mut self, target: usize) -> SlotMapResult<()> {
        let start = self.capacity();
        let added = target - start;

        let failed = |bytes: usize| PoolError::AllocationFailed { bytes };
        self.slots
            .try_reserve_exact(added)
            .map_err(|_| failed(added.saturating_mul(std::mem::size_of::<Slot>())))?;
        self.values
            .try_reserve_exact(target - self.values.len())
            .map_err(|_| failed(added.saturating_mul(std::mem::size_of::<T>())))?;
        self.erase
            .try_reserve_exact(target - self.erase.len())
            .map_err(|_| failed(added.saturating_mul(std::mem::size_of::<u32>())))?;

        for index in start..target {
            let next = if index + 1 < target { index as u32 + 1 } else { END };
            self.slots.push(Slot::vacant(next));
        }

        match self.free_tail() {
            Some(tail) => self.slots[tail as usize].link = start as u32,
            None => self.free_head = start as u32,
        }

        tracing::debug!("slot map grew {} -> {} slots", start, target);
        Ok(())
    }

    /// Last slot of the free list, walking from the head.
    fn free_tail(&self) -> Option<u32> {
        let mut cursor = self.free_head;
        if cursor == END {
            return None;
        }
        loop {
            let next = self.slots[cursor as usize].link;
            if next == END {
                return Some(cursor);
            }
            cursor = next;
        }
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
            Err(err) => panic!("slot map insert failed: {err}"),
        }
    }

    /// Inserts a value, reporting growth failure instead of panicking.
    ///
    /// The free list head is reused first (LIFO). If the list is empty the
    /// slot table grows by one block.
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
        let dense = self.values.len() as u32;
        let slot = &mut self.slots[index as usize];
        self.free_head = slot.link;
        let generation = slot.occupy(dense);

        self.values.push(value);
        self.erase.push(index);

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
                len: self.slots.len(),
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
        Ok(&self.values[dense])
    }

    /// Mutable form of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, key: SlotKey) -> SlotMapResult<&mut T> {
        let dense = self.resolve(key)?;
        Ok(&mut self.values[dense])
    }

    /// Defensive accessor: `None` for any key that does not resolve.
    #[inline]
    #[must_use]
    pub fn try_get(&self, key: SlotKey) -> Option<&T> {
        self.locate(key).map(|dense| &self.values[dense])
    }

    /// Mutable form of [`try_get`](Self::try_get).
    #[inline]
    pub fn try_get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        let dense = self.locate(key)?;
        Some(&mut self.values[dense])
    }

    /// Removes the value behind `key` and returns it.
    ///
    /// Stale, vacant and out-of-range keys return `None` and change nothing.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let dense = self.locate(key)?;
        let index = key.index();

        let value = self.values.swap_remove(dense);
        self.erase.swap_remove(dense);
        if let Some(&moved) = self.erase.get(dense) {
            self.slots[moved as usize].link = dense as u32;
        }

        self.slots[index as usize].vacate(self.free_head);
        self.free_head = index;

        Some(value)
    }

    /// Drops the value behind `key`. Returns `false` if the key was not live.
    #[inline]
    pub fn erase(&mut self, key: SlotKey) -> bool {
        self.remove(key).is_some()
    }

    /// Drops every value and invalidates every outstanding key.
    ///
    /// The slot table is kept and relinked into one ascending free list.
    pub fn clear(&mut self) {
        let dropped = self.values.len();
        self.values.clear();
        for &index in &self.erase {
            self.slots[index as usize].vacate(END);
        }
        self.erase.clear();

        let count = self.slots.len();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.link = if index + 1 < count { index as u32 + 1 } else { END };
        }
        self.free_head = if count > 0 { 0 } else { END };

        if dropped > 0 {
            tracing::debug!("slot map cleared {} values", dropped);
        }
    }

    /// Live values in dense order. The order changes on erase.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterates over live values in dense order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Iterates mutably over live values in dense order.
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.values.iter_mut()
    }

    /// Keys of live values, in the same order as [`iter`](Self::iter).
    pub fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.erase
            .iter()
            .map(|&index| SlotKey::new(index, self.slots[index as usize].generation))
    }
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<SlotKey> for SlotMap<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, key: SlotKey) -> &T {
        match self.get(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> IndexMut<SlotKey> for SlotMap<T> {
    #[track_caller]
    fn index_mut(&mut self, key: SlotKey) -> &mut T {
        match self.get_mut(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<'a, T> IntoIterator for &'a SlotMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SlotMap<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.keys().zip(self.iter())).finish()
    }
}
