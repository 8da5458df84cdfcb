//! Allocation protocol and handle scopes.

use super::Factory;
use crate::core::{AllocationRequest, HeapObject, NeedsCollection, RawHeap};
use crate::errors::messages::{ALLOCATION_DISALLOWED, OUT_OF_MEMORY};
use lode_core::{ObjectId, Space};
use smallvec::SmallVec;

/// Position in the scope root stack, returned by [`Factory::open_scope`].
#[derive(Debug)]
#[must_use]
pub struct ScopeMark(usize);

impl<H: RawHeap> Factory<H> {
    /// Places a fully built object on the heap.
    ///
    /// On a transient failure runs one collection for `space` and retries
    /// once. A second failure is fatal. The returned id is rooted in the
    /// current handle scope.
    pub fn allocate(&mut self, object: HeapObject, space: Space) -> ObjectId {
        debug_assert!(self.gate.is_allowed(), "{ALLOCATION_DISALLOWED}");
        let request = AllocationRequest::new(&object, space);
        let object = match self.heap.try_allocate(request, object) {
            Ok(id) => return self.track(id),
            Err(NeedsCollection(object)) => object,
        };

        tracing::debug!(
            target: "lode::alloc",
            kind = request.kind.name(),
            size = request.size,
            space = space.name(),
            "allocation failed, collecting before retry"
        );
        // The pending object is not on the heap yet; keep what it points at.
        let mut pending: SmallVec<[ObjectId; 8]> = SmallVec::new();
        object.trace(|id| pending.push(id));
        self.collect(space, &pending);

        match self.heap.try_allocate(request, object) {
            Ok(id) => self.track(id),
            Err(_) => self.fatal_out_of_memory(request),
        }
    }

    fn fatal_out_of_memory(&self, request: AllocationRequest) -> ! {
        tracing::error!(
            target: "lode::alloc",
            kind = request.kind.name(),
            size = request.size,
            space = request.space.name(),
            "allocation failed after collection"
        );
        panic!(
            "{OUT_OF_MEMORY}: {} bytes for {} in {} space",
            request.size,
            request.kind.name(),
            request.space.name()
        );
    }

    #[inline]
    pub(crate) fn track(&mut self, id: ObjectId) -> ObjectId {
        self.scope_roots.push(id);
        id
    }

    pub fn open_scope(&self) -> ScopeMark {
        ScopeMark(self.scope_roots.len())
    }

    /// Drops every root recorded since `mark`.
    pub fn close_scope(&mut self, mark: ScopeMark) {
        self.scope_roots.truncate(mark.0);
    }

    /// Runs `f` in a fresh scope. Ids created inside are unrooted afterwards.
    pub fn handle_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mark = self.open_scope();
        let result = f(self);
        self.close_scope(mark);
        result
    }

    /// Runs `f` in a fresh scope and keeps its result rooted in the outer one.
    pub fn escapable_scope(&mut self, f: impl FnOnce(&mut Self) -> ObjectId) -> ObjectId {
        let mark = self.open_scope();
        let result = f(self);
        self.close_scope(mark);
        self.track(result)
    }

    /// Number of ids rooted by open scopes.
    pub fn scope_depth(&self) -> usize {
        self.scope_roots.len()
    }

    /// Roots `id` until a matching [`Factory::unpersist`].
    pub fn persist(&mut self, id: ObjectId) {
        *self.persistent.entry(id).or_insert(0) += 1;
    }

    pub fn unpersist(&mut self, id: ObjectId) {
        if let Some(count) = self.persistent.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.persistent.remove(&id);
            }
        }
    }
}
