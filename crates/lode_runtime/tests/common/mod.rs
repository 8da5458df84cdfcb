#![allow(dead_code)]

use lode_runtime::core::{
    AllocationRequest, CollectionStats, ExternalStringResource, HeapObject, NeedsCollection,
    RawHeap, SpaceHeap, Units,
};
use lode_runtime::{Factory, FactoryConfig, ObjectId, Space};

pub const TEST_SEED: u64 = 0x5eed_1234;

pub fn test_config() -> FactoryConfig {
    FactoryConfig {
        hash_seed: Some(TEST_SEED),
        ..FactoryConfig::default()
    }
}

pub fn factory() -> Factory {
    Factory::new(test_config()).unwrap()
}

pub fn factory_with(config: FactoryConfig) -> Factory {
    Factory::new(FactoryConfig {
        hash_seed: Some(TEST_SEED),
        ..config
    })
    .unwrap()
}

/// Heap that reports `NeedsCollection` for the next `failures` allocations
/// and records every collection it is asked to run.
pub struct FlakyHeap {
    inner: SpaceHeap,
    failures: usize,
    pub collections: Vec<Space>,
    pub failed: Vec<AllocationRequest>,
}

impl FlakyHeap {
    pub fn new() -> Self {
        Self {
            inner: SpaceHeap::new(1 << 24, 1 << 26),
            failures: 0,
            collections: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn fail_next(&mut self, failures: usize) {
        self.failures = failures;
    }
}

impl RawHeap for FlakyHeap {
    fn try_allocate(
        &mut self,
        request: AllocationRequest,
        object: HeapObject,
    ) -> Result<ObjectId, NeedsCollection> {
        if self.failures > 0 {
            self.failures -= 1;
            self.failed.push(request);
            return Err(NeedsCollection(object));
        }
        self.inner.try_allocate(request, object)
    }

    fn run_collection(&mut self, space: Space, roots: &[ObjectId]) -> CollectionStats {
        self.collections.push(space);
        self.inner.run_collection(space, roots)
    }

    fn get(&self, id: ObjectId) -> &HeapObject {
        self.inner.get(id)
    }

    fn get_mut(&mut self, id: ObjectId) -> &mut HeapObject {
        self.inner.get_mut(id)
    }

    fn is_live(&self, id: ObjectId) -> bool {
        self.inner.is_live(id)
    }

    fn space_of(&self, id: ObjectId) -> Space {
        self.inner.space_of(id)
    }

    fn transplant(&mut self, from: ObjectId, into: ObjectId) {
        self.inner.transplant(from, into)
    }

    fn reaccount(&mut self, id: ObjectId) {
        self.inner.reaccount(id)
    }
}

pub fn flaky_factory() -> Factory<FlakyHeap> {
    Factory::with_heap(FlakyHeap::new(), test_config()).unwrap()
}

/// Host buffer of wide units, used to get wide strings with any content.
pub struct WideResource(pub Vec<u16>);

impl ExternalStringResource for WideResource {
    fn units(&self) -> Units<'_> {
        Units::Wide(&self.0)
    }
}

pub fn string<H: RawHeap>(f: &mut Factory<H>, s: &str) -> ObjectId {
    f.new_string_from_utf8(s, Space::New).unwrap()
}

pub fn wide_external<H: RawHeap>(f: &mut Factory<H>, s: &str) -> ObjectId {
    f.new_external_string(Box::new(WideResource(s.encode_utf16().collect())))
        .unwrap()
}

pub fn units_of<H: RawHeap>(f: &Factory<H>, id: ObjectId) -> Vec<u16> {
    (0..f.string_len(id)).map(|i| f.char_at(id, i)).collect()
}

pub fn object_count(f: &Factory) -> usize {
    let stats = f.heap().stats();
    stats.new_objects + stats.old_objects
}
