//! Behavioural properties shared by `SlotMap` and `ChunkSlotMap`.
//!
//! Each property is written once against a small adapter trait and run on
//! both flavours. The churn test drives random insert/erase sequences from a
//! fixed seed and checks the map against a `BTreeMap` model after every step.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tessera_core::{ChunkSlotMap, SlotKey, SlotMap, SlotMapError};

trait Map {
    fn fresh() -> Self;
    fn insert(&mut self, value: u64) -> SlotKey;
    fn try_get(&self, key: SlotKey) -> Option<u64>;
    fn get(&self, key: SlotKey) -> Result<u64, SlotMapError>;
    fn contains(&self, key: SlotKey) -> bool;
    fn erase(&mut self, key: SlotKey) -> bool;
    fn len(&self) -> usize;
    fn values(&self) -> Vec<u64>;
    fn keys(&self) -> Vec<SlotKey>;
}

impl Map for SlotMap<u64> {
    fn fresh() -> Self {
        SlotMap::new()
    }
    fn insert(&mut self, value: u64) -> SlotKey {
        SlotMap::insert(self, value)
    }
    fn try_get(&self, key: SlotKey) -> Option<u64> {
        SlotMap::try_get(self, key).copied()
    }
    fn get(&self, key: SlotKey) -> Result<u64, SlotMapError> {
        SlotMap::get(self, key).copied()
    }
    fn contains(&self, key: SlotKey) -> bool {
        SlotMap::contains(self, key)
    }
    fn erase(&mut self, key: SlotKey) -> bool {
        SlotMap::erase(self, key)
    }
    fn len(&self) -> usize {
        SlotMap::len(self)
    }
    fn values(&self) -> Vec<u64> {
        self.iter().copied().collect()
    }
    fn keys(&self) -> Vec<SlotKey> {
        SlotMap::keys(self).collect()
    }
}

impl Map for ChunkSlotMap<u64> {
    fn fresh() -> Self {
        // Small chunks so the tests cross chunk boundaries.
        ChunkSlotMap::new(4).unwrap()
    }
    fn insert(&mut self, value: u64) -> SlotKey {
        ChunkSlotMap::insert(self, value)
    }
    fn try_get(&self, key: SlotKey) -> Option<u64> {
        ChunkSlotMap::try_get(self, key).copied()
    }
    fn get(&self, key: SlotKey) -> Result<u64, SlotMapError> {
        ChunkSlotMap::get(self, key).copied()
    }
    fn contains(&self, key: SlotKey) -> bool {
        ChunkSlotMap::contains(self, key)
    }
    fn erase(&mut self, key: SlotKey) -> bool {
        ChunkSlotMap::erase(self, key)
    }
    fn len(&self) -> usize {
        ChunkSlotMap::len(self)
    }
    fn values(&self) -> Vec<u64> {
        self.iter().copied().collect()
    }
    fn keys(&self) -> Vec<SlotKey> {
        ChunkSlotMap::keys(self).collect()
    }
}

fn round_trip<M: Map>() {
    let mut map = M::fresh();
    let keys: Vec<_> = (0..50).map(|i| map.insert(i * 3)).collect();
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(map.try_get(*key), Some(i as u64 * 3));
        assert_eq!(map.get(*key), Ok(i as u64 * 3));
    }
}

fn generation_invalidation<M: Map>() {
    let mut map = M::fresh();
    let old = map.insert(1);
    assert!(map.erase(old));

    let new = map.insert(2);
    assert_eq!(old.index(), new.index());
    assert!(!map.contains(old));
    assert_eq!(map.try_get(old), None);
    assert!(matches!(map.get(old), Err(SlotMapError::StaleKey { .. })));
    assert_eq!(map.try_get(new), Some(2));
}

fn compaction<M: Map>() {
    let mut map = M::fresh();
    let keys: Vec<_> = (0..20).map(|i| map.insert(i)).collect();
    for key in keys.iter().step_by(3) {
        assert!(map.erase(*key));
    }

    let values = map.values();
    assert_eq!(values.len(), map.len());
    assert_eq!(map.keys().len(), map.len());
    for (key, value) in map.keys().into_iter().zip(values) {
        assert_eq!(map.try_get(key), Some(value));
    }
    for (i, key) in keys.iter().enumerate() {
        let expected = (i % 3 != 0).then_some(i as u64);
        assert_eq!(map.try_get(*key), expected);
    }
}

fn lifo_reuse<M: Map>() {
    let mut map = M::fresh();
    let a = map.insert(0);
    let b = map.insert(1);
    let c = map.insert(2);
    map.erase(a);
    map.erase(c);
    map.erase(b);

    assert_eq!(map.insert(10).index(), b.index());
    assert_eq!(map.insert(11).index(), c.index());
    assert_eq!(map.insert(12).index(), a.index());
}

fn idempotent_erase<M: Map>() {
    let mut map = M::fresh();
    let key = map.insert(5);
    let other = map.insert(6);
    assert!(map.erase(key));
    assert!(!map.erase(key));
    assert!(!map.erase(SlotKey::new(1_000, 0)));
    assert!(!map.erase(SlotKey::NULL));
    assert_eq!(map.len(), 1);
    assert_eq!(map.try_get(other), Some(6));
}

fn scenario<M: Map>() {
    let mut map = M::fresh();
    let k10 = map.insert(10);
    let k20 = map.insert(20);
    let k30 = map.insert(30);
    assert!(map.erase(k20));
    let k40 = map.insert(40);

    assert_eq!(map.len(), 3);
    assert_eq!(k40.index(), k20.index());
    assert!(!map.contains(k20));
    assert_eq!(map.try_get(k10), Some(10));
    assert_eq!(map.try_get(k30), Some(30));
    assert_eq!(map.try_get(k40), Some(40));

    let mut values = map.values();
    values.sort_unstable();
    assert_eq!(values, vec![10, 30, 40]);
}

fn churn<M: Map>(seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut map = M::fresh();
    let mut model: BTreeMap<SlotKey, u64> = BTreeMap::new();
    let mut dead: Vec<SlotKey> = Vec::new();

    for step in 0..5_000_u64 {
        if model.is_empty() || rng.gen_bool(0.6) {
            let key = map.insert(step);
            assert!(model.insert(key, step).is_none(), "key {key:?} issued twice");
        } else {
            let live: Vec<SlotKey> = model.keys().copied().collect();
            let key = live[rng.gen_range(0..live.len())];
            assert!(map.erase(key));
            model.remove(&key);
            dead.push(key);
        }

        assert_eq!(map.len(), model.len());
    }

    for (key, value) in &model {
        assert_eq!(map.try_get(*key), Some(*value));
    }
    for key in &dead {
        assert!(!map.contains(*key));
    }
    let mut values = map.values();
    let mut expected: Vec<u64> = model.values().copied().collect();
    values.sort_unstable();
    expected.sort_unstable();
    assert_eq!(values, expected);
}

macro_rules! property_tests {
    ($module:ident, $map:ty) => {
        mod $module {
            use super::*;

            #[test]
            fn test_round_trip() {
                round_trip::<$map>();
            }

            #[test]
            fn test_generation_invalidation() {
                generation_invalidation::<$map>();
            }

            #[test]
            fn test_compaction() {
                compaction::<$map>();
            }

            #[test]
            fn test_lifo_reuse() {
                lifo_reuse::<$map>();
            }

            #[test]
            fn test_idempotent_erase() {
                idempotent_erase::<$map>();
            }

            #[test]
            fn test_insert_erase_insert_scenario() {
                scenario::<$map>();
            }

            #[test]
            fn test_seeded_churn() {
                churn::<$map>(0x7e55_e7a);
                churn::<$map>(42);
            }
        }
    };
}

property_tests!(flat, SlotMap<u64>);
property_tests!(chunked, ChunkSlotMap<u64>);

#[test]
fn test_chunked_addresses_survive_growth() {
    let mut map: ChunkSlotMap<u64> = ChunkSlotMap::new(8).unwrap();
    let keys: Vec<_> = (0..8).map(|i| map.insert(i)).collect();
    let before: Vec<*const u64> = keys
        .iter()
        .map(|key| map.try_get(*key).unwrap() as *const u64)
        .collect();

    for i in 0..1_000 {
        map.insert(i);
    }
    assert!(map.chunk_count() > 1);

    for (key, address) in keys.iter().zip(before) {
        assert_eq!(map.try_get(*key).unwrap() as *const u64, address);
    }
}

#[test]
fn test_flat_clear_then_reuse() {
    let mut map = SlotMap::new();
    let keys: Vec<_> = (0..10_u64).map(|i| map.insert(i)).collect();
    map.clear();
    assert!(map.is_empty());
    assert!(keys.iter().all(|key| !map.contains(*key)));

    let key = map.insert(99);
    assert_eq!(map[key], 99);
}
