//! The object factory.
//!
//! Every heap object is built through [`Factory::allocate`]. Constructors are
//! split by concern:
//! - `alloc`: allocation protocol and handle scopes
//! - `gc`: root collection and cache maintenance around collections
//! - `strings`: concatenation, slicing, flattening, raw string construction
//! - `intern`: the interning table front-end
//! - `error_builder`: error objects and the degraded fallback
//! - `shape_cache`: object literal shapes cached per context
//! - `constructors`: numbers, arrays, dictionaries, contexts, closures, records

mod alloc;
mod constructors;
mod error_builder;
mod gc;
mod intern;
mod shape_cache;
mod strings;

pub use alloc::ScopeMark;
pub use error_builder::{Completion, ErrorInvocation};

use crate::builtins_registry::{BuiltinNamespace, BuiltinProvider};
use crate::config::FactoryConfig;
use crate::core::{AllocationGate, Context, HeapObject, RawHeap, SpaceHeap, StringTable};
use crate::errors::FactoryError;
use crate::errors::messages::NOT_A_CONTEXT;
use lode_core::{FastHashMap, ObjectId, Space, fast_map_new};

/// Canonical objects owned by the factory. Always rooted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roots {
    pub empty_string: ObjectId,
    pub empty_fixed_array: ObjectId,
    pub nan_value: ObjectId,
    pub infinity_value: ObjectId,
    pub undefined_string: ObjectId,
    pub nan_string: ObjectId,
    pub infinity_string: ObjectId,
    pub constructor_string: ObjectId,
}

impl Roots {
    const UNSET: Roots = Roots {
        empty_string: ObjectId(u32::MAX),
        empty_fixed_array: ObjectId(u32::MAX),
        nan_value: ObjectId(u32::MAX),
        infinity_value: ObjectId(u32::MAX),
        undefined_string: ObjectId(u32::MAX),
        nan_string: ObjectId(u32::MAX),
        infinity_string: ObjectId(u32::MAX),
        constructor_string: ObjectId(u32::MAX),
    };

    fn iter(&self) -> impl Iterator<Item = ObjectId> {
        [
            self.empty_string,
            self.empty_fixed_array,
            self.nan_value,
            self.infinity_value,
            self.undefined_string,
            self.nan_string,
            self.infinity_string,
            self.constructor_string,
        ]
        .into_iter()
    }
}

/// Entries kept by the number-to-string cache before it is reset.
const NUMBER_STRING_CACHE_SIZE: usize = 256;

pub struct Factory<H: RawHeap = SpaceHeap> {
    heap: H,
    config: FactoryConfig,
    gate: AllocationGate,
    scope_roots: Vec<ObjectId>,
    persistent: FastHashMap<ObjectId, u32>,
    string_table: StringTable,
    single_chars: Box<[Option<ObjectId>]>,
    number_strings: FastHashMap<u64, ObjectId>,
    builtins: BuiltinNamespace<H>,
    roots: Roots,
    last_script_id: i32,
    collections: usize,
    shape_cache_hits: u64,
    shape_cache_misses: u64,
}

impl Factory<SpaceHeap> {
    /// Creates a factory over the reference two-space heap.
    pub fn new(config: FactoryConfig) -> Result<Self, FactoryError> {
        config.validate()?;
        let heap = SpaceHeap::new(config.new_space_bytes, config.old_space_bytes);
        Self::with_heap(heap, config)
    }
}

impl<H: RawHeap> Factory<H> {
    pub fn with_heap(heap: H, config: FactoryConfig) -> Result<Self, FactoryError> {
        config.validate()?;
        let mut factory = Self {
            heap,
            config,
            gate: AllocationGate::new(),
            scope_roots: Vec::with_capacity(256),
            persistent: fast_map_new(),
            string_table: StringTable::new(config.hash_seed),
            single_chars: vec![None; 256].into_boxed_slice(),
            number_strings: fast_map_new(),
            builtins: BuiltinNamespace::new(),
            roots: Roots::UNSET,
            last_script_id: 0,
            collections: 0,
            shape_cache_hits: 0,
            shape_cache_misses: 0,
        };
        factory.setup_roots();
        Ok(factory)
    }

    fn setup_roots(&mut self) {
        let mark = self.open_scope();
        self.roots.empty_string = self.internalize_one_byte(b"");
        self.roots.empty_fixed_array = self.allocate(
            HeapObject::FixedArray(Box::default()),
            Space::Old,
        );
        self.roots.nan_value = self.new_heap_number(f64::NAN, Space::Old);
        self.roots.infinity_value = self.new_heap_number(f64::INFINITY, Space::Old);
        self.roots.undefined_string = self.internalize_utf8("undefined");
        self.roots.nan_string = self.internalize_utf8("NaN");
        self.roots.infinity_string = self.internalize_utf8("Infinity");
        self.roots.constructor_string = self.internalize_utf8("constructor");
        self.close_scope(mark);
    }

    /// Registers builtins. Entries with an existing name are replaced.
    pub fn install_builtins(&mut self, provider: &dyn BuiltinProvider<H>) {
        provider.install(&mut self.builtins);
    }

    pub fn builtins(&self) -> &BuiltinNamespace<H> {
        &self.builtins
    }

    pub fn builtins_mut(&mut self) -> &mut BuiltinNamespace<H> {
        &mut self.builtins
    }

    pub fn heap(&self) -> &H {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut H {
        &mut self.heap
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn string_table(&self) -> &StringTable {
        &self.string_table
    }

    pub fn gate(&self) -> &AllocationGate {
        &self.gate
    }

    /// Number of collections run on behalf of this factory.
    pub fn collections(&self) -> usize {
        self.collections
    }

    /// Shape cache (hits, misses) across all contexts.
    pub fn shape_cache_stats(&self) -> (u64, u64) {
        (self.shape_cache_hits, self.shape_cache_misses)
    }

    pub fn get(&self, id: ObjectId) -> &HeapObject {
        self.heap.get(id)
    }

    pub fn context(&self, id: ObjectId) -> &Context {
        match self.heap.get(id) {
            HeapObject::Context(c) => c,
            _ => panic!("{NOT_A_CONTEXT}: {id:?}"),
        }
    }

    pub(crate) fn context_mut(&mut self, id: ObjectId) -> &mut Context {
        match self.heap.get_mut(id) {
            HeapObject::Context(c) => c,
            _ => panic!("{NOT_A_CONTEXT}: {id:?}"),
        }
    }

    /// The native context `id` belongs to.
    pub fn native_context_of(&self, id: ObjectId) -> ObjectId {
        let ctx = self.context(id);
        ctx.native.unwrap_or(id)
    }
}
