//! Slot metadata shared by both slot map flavours.

use bytemuck::Zeroable;

use super::key::SlotKey;

/// Free list terminator.
pub(crate) const END: u32 = u32::MAX;

/// Largest slot table a map may hold. `END` is never a valid index.
pub(crate) const MAX_SLOTS: usize = END as usize;

/// One slot table entry.
///
/// `link` is the dense position while occupied and the next free slot while
/// vacant. An all-zero slot is vacant with generation 0, which is the state
/// fresh chunks start in before they are linked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable)]
#[repr(C)]
pub(crate) struct Slot {
    pub generation: u32,
    pub link: u32,
    pub occupied: bool,
}

impl Slot {
    /// A vacant slot pointing at `next`.
    #[inline]
    pub const fn vacant(next: u32) -> Self {
        Self {
            generation: 0,
            link: next,
            occupied: false,
        }
    }

    /// Whether `key` resolves through this slot.
    #[inline]
    pub const fn matches(&self, key: SlotKey) -> bool {
        self.occupied && self.generation == key.generation()
    }

    /// Marks the slot live at dense position `dense`. Returns the generation
    /// the issued key must carry.
    #[inline]
    pub fn occupy(&mut self, dense: u32) -> u32 {
        debug_assert!(!self.occupied, "occupying a live slot");
        self.occupied = true;
        self.link = dense;
        self.generation
    }

    /// Frees the slot, invalidating every key issued from it.
    #[inline]
    pub fn vacate(&mut self, next: u32) {
        self.occupied = false;
        self.generation = self.generation.wrapping_add(1);
        self.link = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_slot_is_vacant() {
        let slot = Slot::zeroed();
        assert!(!slot.occupied);
        assert_eq!(slot.generation, 0);
        assert!(!slot.matches(SlotKey::new(0, 0)));
    }

    #[test]
    fn test_vacate_bumps_generation() {
        let mut slot = Slot::vacant(END);
        let generation = slot.occupy(7);
        assert!(slot.matches(SlotKey::new(0, generation)));

        slot.vacate(3);
        assert!(!slot.matches(SlotKey::new(0, generation)));
        assert_eq!(slot.generation, generation + 1);
        assert_eq!(slot.link, 3);
    }

    #[test]
    fn test_generation_wraps() {
        let mut slot = Slot {
            generation: u32::MAX,
            link: 0,
            occupied: true,
        };
        slot.vacate(END);
        assert_eq!(slot.generation, 0);
    }
}
