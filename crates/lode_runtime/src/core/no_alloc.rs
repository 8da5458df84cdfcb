//! No-allocation regions.
//!
//! Raw code-unit slices borrowed from the heap are only valid while nothing
//! can allocate. A `DisallowAllocation` guard marks such a region; the
//! allocator asserts no guard is alive.

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct AllocationGate {
    depth: Cell<u32>,
}

impl AllocationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disallow(&self) -> DisallowAllocation<'_> {
        self.depth.set(self.depth.get() + 1);
        DisallowAllocation { gate: self }
    }

    #[inline]
    pub fn is_allowed(&self) -> bool {
        self.depth.get() == 0
    }
}

#[must_use]
pub struct DisallowAllocation<'a> {
    gate: &'a AllocationGate,
}

impl Drop for DisallowAllocation<'_> {
    fn drop(&mut self) {
        self.gate.depth.set(self.gate.depth.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_nest() {
        let gate = AllocationGate::new();
        assert!(gate.is_allowed());
        {
            let _outer = gate.disallow();
            {
                let _inner = gate.disallow();
                assert!(!gate.is_allowed());
            }
            assert!(!gate.is_allowed());
        }
        assert!(gate.is_allowed());
    }
}
