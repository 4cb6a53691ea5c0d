//! # Memory Tags
//!
//! Per-purpose accounting for chunk allocations.
//!
//! Every chunk request carries a [`MemoryTag`]. A [`MemoryTracker`] keeps
//! running totals per tag so a host can see where container memory goes
//! (slot tables vs dense values vs component maps) without a global
//! allocator hook.

use parking_lot::Mutex;

/// What a chunk of memory is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemoryTag {
    /// Generic fixed-size blocks.
    Block = 0,
    /// Slot metadata (generation + link).
    SlotTable = 1,
    /// Dense value storage.
    DenseValues = 2,
    /// Dense-to-slot back references.
    EraseTable = 3,
    /// Entity records owned by an entity manager.
    EcsEntities = 4,
    /// Component values owned by an entity manager.
    EcsComponentMap = 5,
}

impl MemoryTag {
    /// Number of distinct tags.
    pub const COUNT: usize = 6;

    /// All tags in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Block,
        Self::SlotTable,
        Self::DenseValues,
        Self::EraseTable,
        Self::EcsEntities,
        Self::EcsComponentMap,
    ];

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

/// Running totals for one tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagStats {
    /// Bytes currently held.
    pub live_bytes: usize,
    /// Highest `live_bytes` ever observed.
    pub peak_bytes: usize,
    /// Number of chunk allocations.
    pub allocations: u64,
    /// Number of chunk releases.
    pub releases: u64,
}

/// Shared per-tag allocation counters.
///
/// Usually wrapped in an `Arc` and handed to a
/// [`TrackingAllocator`](super::TrackingAllocator). The lock is only taken on
/// chunk allocation and release, never on element access.
#[derive(Debug, Default)]
pub struct MemoryTracker {
    stats: Mutex<[TagStats; MemoryTag::COUNT]>,
}

impl MemoryTracker {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an allocation of `bytes` under `tag`.
    pub fn record_allocation(&self, tag: MemoryTag, bytes: usize) {
        let mut stats = self.stats.lock();
        let entry = &mut stats[tag.slot()];
        entry.live_bytes += bytes;
        entry.peak_bytes = entry.peak_bytes.max(entry.live_bytes);
        entry.allocations += 1;
    }

    /// Records a release of `bytes` under `tag`.
    pub fn record_release(&self, tag: MemoryTag, bytes: usize) {
        let mut stats = self.stats.lock();
        let entry = &mut stats[tag.slot()];
        entry.live_bytes = entry.live_bytes.saturating_sub(bytes);
        entry.releases += 1;
    }

    /// Snapshot of one tag's counters.
    #[must_use]
    pub fn stats(&self, tag: MemoryTag) -> TagStats {
        self.stats.lock()[tag.slot()]
    }

    /// Sum of live bytes across every tag.
    #[must_use]
    pub fn total_live_bytes(&self) -> usize {
        self.stats.lock().iter().map(|s| s.live_bytes).sum()
    }

    /// Resets every counter to zero.
    pub fn reset(&self) {
        *self.stats.lock() = [TagStats::default(); MemoryTag::COUNT];
    }
}
