//! Interning front-end: content in, canonical string out.

use super::Factory;
use super::strings::narrow_if_possible;
use crate::core::text::string_object;
use crate::core::{Encoding, HeapObject, RawHeap, Units};
use lode_core::{ObjectId, Space};

impl<H: RawHeap> Factory<H> {
    pub fn internalize_utf8(&mut self, s: &str) -> ObjectId {
        if s.chars().all(|c| (c as u32) <= 0xff) {
            let bytes: Vec<u8> = s.chars().map(|c| c as u8).collect();
            self.internalize_units(Units::Narrow(&bytes))
        } else {
            let wide: Vec<u16> = s.encode_utf16().collect();
            self.internalize_units(Units::Wide(&wide))
        }
    }

    pub fn internalize_one_byte(&mut self, bytes: &[u8]) -> ObjectId {
        self.internalize_units(Units::Narrow(bytes))
    }

    pub fn internalize_two_byte(&mut self, units: &[u16]) -> ObjectId {
        self.internalize_units(Units::Wide(units))
    }

    /// Canonical string equal to `id`. A flat long-lived string becomes the
    /// canonical entry itself; anything else is copied.
    pub fn internalize_string(&mut self, id: ObjectId) -> ObjectId {
        if self.is_internalized(id) {
            return id;
        }
        let id = self.flatten(id);
        let in_place = self.heap.space_of(id) == Space::Old
            && string_object(&self.heap, id).direct_units().is_some();
        if !in_place {
            let len = self.string_len(id);
            let encoding = self.string_encoding(id);
            let owned = self.copy_units(id, 0, len, encoding);
            return self.internalize_units(owned.as_units());
        }

        let hash = self.string_table.hash_of(&self.heap, id);
        let existing = match string_object(&self.heap, id).direct_units() {
            Some(units) => self.string_table.lookup(&self.heap, hash, units),
            None => None,
        };
        if let Some(existing) = existing {
            tracing::trace!(target: "lode::intern", cache_hit = true, ?existing);
            return self.track(existing);
        }
        tracing::trace!(target: "lode::intern", cache_hit = false, ?id, in_place = true);
        if let HeapObject::String(s) = self.heap.get_mut(id) {
            s.set_internalized();
        }
        self.string_table.insert(hash, id);
        id
    }

    /// Canonical string for units `[from, from + len)` of `id`.
    pub fn internalize_sub_string(&mut self, id: ObjectId, from: usize, len: usize) -> ObjectId {
        let encoding = self.string_encoding(id);
        let owned = self.copy_units(id, from, from + len, encoding);
        self.internalize_units(owned.as_units())
    }

    /// The canonical string equal to `id`, if one is registered.
    pub fn lookup_string_if_exists(&mut self, id: ObjectId) -> Option<ObjectId> {
        if self.is_internalized(id) {
            return Some(id);
        }
        let len = self.string_len(id);
        let owned = self.copy_units(id, 0, len, Encoding::Wide);
        self.lookup_units_if_exists(owned.as_units())
    }

    pub(crate) fn lookup_units_if_exists(&mut self, units: Units<'_>) -> Option<ObjectId> {
        let hash = self.string_table.hash_units(units);
        let found = self.string_table.lookup(&self.heap, hash, units);
        tracing::trace!(target: "lode::intern", cache_hit = found.is_some(), len = units.len());
        found
    }

    /// Looks `units` up and registers a long-lived copy on a miss.
    fn internalize_units(&mut self, units: Units<'_>) -> ObjectId {
        let hash = self.string_table.hash_units(units);
        if let Some(found) = self.string_table.lookup(&self.heap, hash, units) {
            tracing::trace!(target: "lode::intern", cache_hit = true, ?found);
            return self.track(found);
        }

        let id = self.allocate_flat(narrow_if_possible(units), Space::Old);
        // A collection during the allocation cannot register strings, but a
        // nested internalization could have; the earlier entry wins.
        if let Some(found) = self.string_table.find(&self.heap, hash, units) {
            return self.track(found);
        }
        let s = match self.heap.get_mut(id) {
            HeapObject::String(s) => s,
            _ => unreachable!(),
        };
        s.set_internalized();
        s.cache_hash(hash);
        self.string_table.insert(hash, id);
        tracing::trace!(target: "lode::intern", cache_hit = false, ?id, len = units.len());
        id
    }
}
