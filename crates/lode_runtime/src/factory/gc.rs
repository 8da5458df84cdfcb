//! Collection entry points for the factory.
//!
//! This module contains:
//! - collect_gc_roots: scopes, persistent handles, canonical objects
//! - clear_caches_for_gc: caches that must not keep objects alive
//! - cleanup_intern_cache: weak interning entries after the sweep

use super::Factory;
use crate::core::{CollectionStats, RawHeap};
use lode_core::{ObjectId, Space};

impl<H: RawHeap> Factory<H> {
    /// Collect all GC roots from the factory state
    fn collect_gc_roots(&self, extra_roots: &[ObjectId]) -> Vec<ObjectId> {
        let estimated = extra_roots.len() + self.scope_roots.len() + self.persistent.len() + 256;
        let mut roots = Vec::with_capacity(estimated);
        roots.extend_from_slice(extra_roots);
        roots.extend_from_slice(&self.scope_roots);
        roots.extend(self.persistent.keys().copied());
        roots.extend(self.single_chars.iter().flatten().copied());
        roots.extend(self.roots.iter());
        roots
    }

    fn clear_caches_for_gc(&mut self) {
        self.number_strings.clear();
    }

    fn cleanup_intern_cache(&mut self) {
        let heap = &self.heap;
        let dropped = self.string_table.retain_live(|id| heap.is_live(id));
        if dropped > 0 {
            tracing::debug!(target: "lode::intern", dropped, "dropped dead interned strings");
        }
    }

    pub(crate) fn collect(&mut self, space: Space, extra_roots: &[ObjectId]) -> CollectionStats {
        self.clear_caches_for_gc();
        let roots = self.collect_gc_roots(extra_roots);
        let stats = self.heap.run_collection(space, &roots);
        self.cleanup_intern_cache();
        self.collections += 1;
        stats
    }

    /// Forces a collection of `space`: a scavenge for `New`, a full
    /// collection for `Old`.
    pub fn collect_garbage(&mut self, space: Space) -> CollectionStats {
        self.collect(space, &[])
    }
}
