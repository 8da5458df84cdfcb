//! Interning table.
//!
//! Maps content hashes to canonical strings. Entries are weak: the table is
//! not a root, and dead entries are dropped after each collection.

use super::heap::RawHeap;
use super::text::{HASH_UNKNOWN, Units, string_object};
use ahash::RandomState;
use lode_core::{FastHashMap, ObjectId, fast_map_with_capacity};
use smallvec::SmallVec;
use std::hash::{BuildHasher, Hasher};

/// Content hash over code units. Narrow and wide strings with the same units
/// hash the same.
pub struct StringHasher {
    state: RandomState,
}

impl StringHasher {
    /// `None` lets ahash pick random per-instance keys.
    pub fn new(seed: Option<u64>) -> Self {
        let state = match seed {
            Some(seed) => RandomState::with_seeds(
                seed,
                seed.rotate_left(17) ^ 0x243f_6a88_85a3_08d3,
                seed.rotate_left(31) ^ 0x1319_8a2e_0370_7344,
                seed.rotate_left(47) ^ 0xa409_3822_299f_31d0,
            ),
            None => RandomState::new(),
        };
        Self { state }
    }

    pub fn hash_units(&self, units: Units<'_>) -> u64 {
        let mut h = self.state.build_hasher();
        h.write_usize(units.len());
        match units {
            Units::Narrow(bytes) => bytes.iter().for_each(|&u| h.write_u16(u as u16)),
            Units::Wide(wide) => wide.iter().for_each(|&u| h.write_u16(u)),
        }
        match h.finish() {
            HASH_UNKNOWN => 1,
            hash => hash,
        }
    }
}

pub struct StringTable {
    hasher: StringHasher,
    buckets: FastHashMap<u64, SmallVec<[ObjectId; 1]>>,
    len: usize,
    hits: u64,
    misses: u64,
}

impl StringTable {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            hasher: StringHasher::new(seed),
            buckets: fast_map_with_capacity(1024),
            len: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn hash_units(&self, units: Units<'_>) -> u64 {
        self.hasher.hash_units(units)
    }

    /// Hash of a string that owns its units, cached on the string.
    pub fn hash_of<H: RawHeap + ?Sized>(&self, heap: &H, id: ObjectId) -> u64 {
        let s = string_object(heap, id);
        let cached = s.cached_hash();
        if cached != HASH_UNKNOWN {
            return cached;
        }
        let units = s
            .direct_units()
            .unwrap_or_else(|| panic!("hashing a string without its own buffer: {id:?}"));
        let hash = self.hasher.hash_units(units);
        s.cache_hash(hash);
        hash
    }

    /// Finds the canonical string with `units`. Counts a hit or a miss.
    pub fn lookup<H: RawHeap + ?Sized>(
        &mut self,
        heap: &H,
        hash: u64,
        units: Units<'_>,
    ) -> Option<ObjectId> {
        let found = self.find(heap, hash, units);
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Same as `lookup` without touching the counters.
    pub fn find<H: RawHeap + ?Sized>(
        &self,
        heap: &H,
        hash: u64,
        units: Units<'_>,
    ) -> Option<ObjectId> {
        let bucket = self.buckets.get(&hash)?;
        bucket.iter().copied().find(|&id| {
            heap.is_live(id)
                && string_object(heap, id)
                    .direct_units()
                    .is_some_and(|candidate| candidate.content_eq(&units))
        })
    }

    pub fn insert(&mut self, hash: u64, id: ObjectId) {
        self.buckets.entry(hash).or_default().push(id);
        self.len += 1;
    }

    /// Drops entries whose strings did not survive.
    pub fn retain_live(&mut self, mut is_live: impl FnMut(ObjectId) -> bool) -> usize {
        let before = self.len;
        self.buckets.retain(|_, bucket| {
            bucket.retain(|id| is_live(*id));
            !bucket.is_empty()
        });
        self.len = self.buckets.values().map(|b| b.len()).sum();
        before - self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
