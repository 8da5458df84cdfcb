pub mod heap;
pub mod no_alloc;
pub mod object;
pub mod string_table;
pub mod text;

pub use heap::{AllocationRequest, CollectionStats, HeapStats, NeedsCollection, RawHeap, SpaceHeap};
pub use no_alloc::{AllocationGate, DisallowAllocation};
pub use object::{
    Closure, Context, ContextKind, DictKey, Dictionary, DictionaryKind, ErrorKind, ErrorRecord,
    HeapObject, JsObject, MIN_CONTEXT_SLOTS, NATIVE_CONTEXT_SLOTS, ObjectKind,
    SHAPE_CACHE_CAPACITY, Script, ScriptKind, Shape, ShapeCacheTable, ShapeKey, StructKind,
    StructRecord,
};
pub use string_table::{StringHasher, StringTable};
pub use text::{
    CompositeString, Encoding, ExternalString, ExternalStringResource, FlatBuilder, FlatString,
    FlatUnits, StringObject, StringShape, Units, ViewString,
};
