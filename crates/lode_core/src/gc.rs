//! Garbage collection infrastructure - base types.

use std::fmt;

/// Handle to a heap-allocated object.
///
/// The id indexes the heap's handle table, not memory. The collector rewrites
/// the table entry when it relocates the object, so an id stays valid across
/// any number of allocations for as long as the object is reachable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Space hint for an allocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// Short-lived objects. Collected by a scavenge that promotes survivors.
    New,
    /// Long-lived (pretenured) objects. Collected by a full collection.
    Old,
}

impl Space {
    pub fn name(self) -> &'static str {
        match self {
            Space::New => "new",
            Space::Old => "old",
        }
    }
}

impl Default for Space {
    fn default() -> Self {
        Space::New
    }
}
