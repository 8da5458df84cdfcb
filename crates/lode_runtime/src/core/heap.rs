//! Raw heap seam and the reference two-space collector.

use super::object::{HeapObject, ObjectKind};
use crate::errors::messages::DEAD_OBJECT;
use lode_core::{ObjectId, Space};

/// One allocation, described before the object is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    pub kind: ObjectKind,
    pub size: usize,
    pub space: Space,
}

impl AllocationRequest {
    pub fn new(object: &HeapObject, space: Space) -> Self {
        Self {
            kind: object.kind(),
            size: object.size(),
            space,
        }
    }
}

/// Transient allocation failure. Hands the object back so it can be retried.
pub struct NeedsCollection(pub HeapObject);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub space: Space,
    pub marked: usize,
    pub freed_objects: usize,
    pub freed_bytes: usize,
    pub promoted: usize,
}

/// What the factory needs from a collector.
pub trait RawHeap {
    /// Places a fully built object, or reports that a collection is needed.
    fn try_allocate(
        &mut self,
        request: AllocationRequest,
        object: HeapObject,
    ) -> Result<ObjectId, NeedsCollection>;

    /// Runs one collection for `space`. Everything reachable from `roots`
    /// survives, possibly relocated; ids stay valid.
    fn run_collection(&mut self, space: Space, roots: &[ObjectId]) -> CollectionStats;

    fn get(&self, id: ObjectId) -> &HeapObject;

    fn get_mut(&mut self, id: ObjectId) -> &mut HeapObject;

    fn is_live(&self, id: ObjectId) -> bool;

    fn space_of(&self, id: ObjectId) -> Space;

    /// Rebinds `into` to the object of `from`, dropping what `into` held, and
    /// releases `from`. `into` keeps its identity; the moved object stays in
    /// the space and accounting of `from`.
    fn transplant(&mut self, from: ObjectId, into: ObjectId);

    /// Recomputes the accounted size of `id` after it grew or shrank in place.
    fn reaccount(&mut self, id: ObjectId);
}

// ============================================================================
// SpaceHeap
// ============================================================================

struct Resident {
    owner: ObjectId,
    size: usize,
    object: HeapObject,
}

struct Arena {
    slots: Vec<Option<Resident>>,
    free: Vec<usize>,
    used_bytes: usize,
    limit_bytes: usize,
}

impl Arena {
    fn new(limit_bytes: usize) -> Self {
        Self {
            slots: Vec::with_capacity(1024),
            free: Vec::new(),
            used_bytes: 0,
            limit_bytes,
        }
    }

    fn has_room(&self, size: usize) -> bool {
        self.used_bytes.saturating_add(size) <= self.limit_bytes
    }

    fn insert(&mut self, resident: Resident) -> u32 {
        self.used_bytes += resident.size;
        if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(resident);
            slot as u32
        } else {
            self.slots.push(Some(resident));
            (self.slots.len() - 1) as u32
        }
    }

    fn take(&mut self, slot: u32) -> Resident {
        let resident = self.slots[slot as usize].take().expect(DEAD_OBJECT);
        self.used_bytes -= resident.size;
        self.free.push(slot as usize);
        resident
    }

    fn object_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Drops trailing empty slots and rebuilds the free list.
    fn compact_tail(&mut self) {
        while self.slots.last().is_some_and(|s| s.is_none()) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|&i| i < len);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Location {
    space: Space,
    slot: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub new_objects: usize,
    pub new_bytes: usize,
    pub old_objects: usize,
    pub old_bytes: usize,
    pub scavenges: usize,
    pub full_collections: usize,
}

/// Two-space slot heap.
///
/// Ids index a handle table whose entries hold the current location of each
/// object. A scavenge frees dead short-lived objects and promotes the
/// survivors into the old space, rewriting their handles. A full collection
/// also sweeps the old space.
pub struct SpaceHeap {
    handles: Vec<Option<Location>>,
    free_handles: Vec<u32>,
    new_space: Arena,
    old_space: Arena,
    marks: Vec<u64>,
    scavenges: usize,
    full_collections: usize,
}

impl SpaceHeap {
    pub fn new(new_space_bytes: usize, old_space_bytes: usize) -> Self {
        Self {
            handles: Vec::with_capacity(1024),
            free_handles: Vec::new(),
            new_space: Arena::new(new_space_bytes),
            old_space: Arena::new(old_space_bytes),
            marks: Vec::new(),
            scavenges: 0,
            full_collections: 0,
        }
    }

    fn arena(&self, space: Space) -> &Arena {
        match space {
            Space::New => &self.new_space,
            Space::Old => &self.old_space,
        }
    }

    fn arena_mut(&mut self, space: Space) -> &mut Arena {
        match space {
            Space::New => &mut self.new_space,
            Space::Old => &mut self.old_space,
        }
    }

    fn location(&self, id: ObjectId) -> Location {
        self.handles
            .get(id.index())
            .copied()
            .flatten()
            .expect(DEAD_OBJECT)
    }

    fn new_handle(&mut self) -> ObjectId {
        if let Some(h) = self.free_handles.pop() {
            ObjectId(h)
        } else {
            self.handles.push(None);
            ObjectId((self.handles.len() - 1) as u32)
        }
    }

    fn release_handle(&mut self, id: ObjectId) {
        self.handles[id.index()] = None;
        self.free_handles.push(id.0);
    }

    pub fn is_marked(&self, id: ObjectId) -> bool {
        let word = id.index() >> 6;
        let bit = id.index() & 63;
        self.marks.get(word).is_some_and(|w| (w & (1 << bit)) != 0)
    }

    fn set_mark(&mut self, id: ObjectId) -> bool {
        let word = id.index() >> 6;
        let bit = id.index() & 63;
        if word >= self.marks.len() {
            self.marks.resize(word + 1, 0);
        }
        let w = &mut self.marks[word];
        let mask = 1 << bit;
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        true
    }

    /// Marks everything reachable from `roots`. Ids that no longer name a live
    /// object are skipped.
    fn mark_all(&mut self, roots: &[ObjectId]) -> usize {
        self.marks.clear();
        let mut marked = 0;
        let mut pending: Vec<ObjectId> = roots.to_vec();
        while let Some(id) = pending.pop() {
            if !self.is_live(id) || !self.set_mark(id) {
                continue;
            }
            marked += 1;
            self.get(id).trace(|child| pending.push(child));
        }
        marked
    }

    /// Frees unmarked objects of `space`. Returns (objects, bytes).
    fn sweep(&mut self, space: Space) -> (usize, usize) {
        let mut freed = 0;
        let mut freed_bytes = 0;
        let len = self.arena(space).slots.len();
        for slot in 0..len {
            let owner = match &self.arena(space).slots[slot] {
                Some(r) => r.owner,
                None => continue,
            };
            if self.is_marked(owner) {
                continue;
            }
            let resident = self.arena_mut(space).take(slot as u32);
            freed += 1;
            freed_bytes += resident.size;
            self.release_handle(owner);
        }
        self.arena_mut(space).compact_tail();
        (freed, freed_bytes)
    }

    /// Moves every remaining short-lived object into the old space.
    fn promote_survivors(&mut self) -> usize {
        let mut promoted = 0;
        for slot in 0..self.new_space.slots.len() {
            if self.new_space.slots[slot].is_none() {
                continue;
            }
            let resident = self.new_space.take(slot as u32);
            let owner = resident.owner;
            let new_slot = self.old_space.insert(resident);
            self.handles[owner.index()] = Some(Location {
                space: Space::Old,
                slot: new_slot,
            });
            promoted += 1;
        }
        self.new_space.slots.clear();
        self.new_space.free.clear();
        promoted
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            new_objects: self.new_space.object_count(),
            new_bytes: self.new_space.used_bytes,
            old_objects: self.old_space.object_count(),
            old_bytes: self.old_space.used_bytes,
            scavenges: self.scavenges,
            full_collections: self.full_collections,
        }
    }

    /// Get memory statistics by object kind.
    pub fn memory_stats(&self) -> String {
        let mut rows: Vec<(ObjectKind, usize, usize)> = Vec::new();
        let residents = self
            .new_space
            .slots
            .iter()
            .chain(self.old_space.slots.iter())
            .flatten();
        for r in residents {
            let kind = r.object.kind();
            match rows.iter_mut().find(|(k, _, _)| *k == kind) {
                Some(row) => {
                    row.1 += 1;
                    row.2 += r.size;
                }
                None => rows.push((kind, 1, r.size)),
            }
        }
        rows.sort_by(|a, b| b.2.cmp(&a.2));

        let stats = self.stats();
        let mut out = format!(
            "Heap: new {} objects / {} bytes (limit {}), old {} objects / {} bytes (limit {}), {} scavenges, {} full collections\n",
            stats.new_objects,
            stats.new_bytes,
            self.new_space.limit_bytes,
            stats.old_objects,
            stats.old_bytes,
            self.old_space.limit_bytes,
            stats.scavenges,
            stats.full_collections,
        );
        for (kind, count, bytes) in rows {
            out.push_str(&format!("  {}: {} objects, {} bytes\n", kind.name(), count, bytes));
        }
        out
    }
}

impl RawHeap for SpaceHeap {
    fn try_allocate(
        &mut self,
        request: AllocationRequest,
        object: HeapObject,
    ) -> Result<ObjectId, NeedsCollection> {
        if !self.arena(request.space).has_room(request.size) {
            return Err(NeedsCollection(object));
        }
        let id = self.new_handle();
        let slot = self.arena_mut(request.space).insert(Resident {
            owner: id,
            size: request.size,
            object,
        });
        self.handles[id.index()] = Some(Location {
            space: request.space,
            slot,
        });
        Ok(id)
    }

    fn run_collection(&mut self, space: Space, roots: &[ObjectId]) -> CollectionStats {
        let marked = self.mark_all(roots);
        let (mut freed_objects, mut freed_bytes) = self.sweep(Space::New);
        if space == Space::Old {
            let (objects, bytes) = self.sweep(Space::Old);
            freed_objects += objects;
            freed_bytes += bytes;
            self.full_collections += 1;
        } else {
            self.scavenges += 1;
        }
        let promoted = self.promote_survivors();
        self.marks.clear();

        tracing::debug!(
            target: "lode::heap",
            space = space.name(),
            marked,
            freed_objects,
            freed_bytes,
            promoted,
            "collection finished"
        );
        CollectionStats {
            space,
            marked,
            freed_objects,
            freed_bytes,
            promoted,
        }
    }

    fn get(&self, id: ObjectId) -> &HeapObject {
        let loc = self.location(id);
        &self.arena(loc.space).slots[loc.slot as usize]
            .as_ref()
            .expect(DEAD_OBJECT)
            .object
    }

    fn get_mut(&mut self, id: ObjectId) -> &mut HeapObject {
        let loc = self.location(id);
        &mut self.arena_mut(loc.space).slots[loc.slot as usize]
            .as_mut()
            .expect(DEAD_OBJECT)
            .object
    }

    fn is_live(&self, id: ObjectId) -> bool {
        self.handles.get(id.index()).is_some_and(|h| h.is_some())
    }

    fn space_of(&self, id: ObjectId) -> Space {
        self.location(id).space
    }

    fn transplant(&mut self, from: ObjectId, into: ObjectId) {
        let dst = self.location(into);
        drop(self.arena_mut(dst.space).take(dst.slot));

        let src = self.location(from);
        self.arena_mut(src.space).slots[src.slot as usize]
            .as_mut()
            .expect(DEAD_OBJECT)
            .owner = into;
        self.handles[into.index()] = Some(src);
        self.release_handle(from);
    }

    fn reaccount(&mut self, id: ObjectId) {
        let loc = self.location(id);
        let arena = self.arena_mut(loc.space);
        let resident = arena.slots[loc.slot as usize].as_mut().expect(DEAD_OBJECT);
        let size = resident.object.size();
        let old_size = std::mem::replace(&mut resident.size, size);
        arena.used_bytes = arena.used_bytes - old_size + size;
    }
}
