//! Heap object layouts.

use super::text::StringObject;
use ahash::RandomState;
use indexmap::{IndexMap, IndexSet};
use lode_core::{FastHashMap, ObjectId, Value, fast_hasher};
use smallvec::SmallVec;
use std::mem::size_of;

/// Fixed header of every context: closure, previous, extension, native.
pub const MIN_CONTEXT_SLOTS: usize = 4;
pub const NATIVE_CONTEXT_SLOTS: usize = 16;
/// Initial capacity of a context's shape cache table.
pub const SHAPE_CACHE_CAPACITY: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    HeapNumber,
    String,
    FixedArray,
    FixedDoubleArray,
    ByteArray,
    Dictionary,
    Context,
    Closure,
    Struct,
    Script,
    Shape,
    ShapeCache,
    JsObject,
    Error,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::HeapNumber => "heap_number",
            ObjectKind::String => "string",
            ObjectKind::FixedArray => "fixed_array",
            ObjectKind::FixedDoubleArray => "fixed_double_array",
            ObjectKind::ByteArray => "byte_array",
            ObjectKind::Dictionary => "dictionary",
            ObjectKind::Context => "context",
            ObjectKind::Closure => "closure",
            ObjectKind::Struct => "struct",
            ObjectKind::Script => "script",
            ObjectKind::Shape => "shape",
            ObjectKind::ShapeCache => "shape_cache",
            ObjectKind::JsObject => "object",
            ObjectKind::Error => "error",
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    /// Keyed by internalized string.
    Name,
    /// Keyed by array index.
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictKey {
    Name(ObjectId),
    Index(u32),
}

pub struct Dictionary {
    pub kind: DictionaryKind,
    pub entries: IndexMap<DictKey, Value, RandomState>,
}

impl Dictionary {
    pub fn new(kind: DictionaryKind, capacity: usize) -> Self {
        Self {
            kind,
            entries: IndexMap::with_capacity_and_hasher(capacity, fast_hasher()),
        }
    }

    pub fn get(&self, key: DictKey) -> Option<Value> {
        self.entries.get(&key).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Native,
    Global,
    Module,
    Function,
    Catch,
    With,
    Block,
}

pub struct Context {
    pub kind: ContextKind,
    pub closure: Value,
    pub previous: Option<ObjectId>,
    pub extension: Value,
    pub native: Option<ObjectId>,
    /// Slots after the fixed header.
    pub slots: Box<[Value]>,
    pub shape_cache: Option<ObjectId>,
    /// Base layout for object literals. Only set on native contexts.
    pub object_template: Option<ObjectId>,
}

impl Context {
    /// Total slot count, fixed header included.
    pub fn len(&self) -> usize {
        MIN_CONTEXT_SLOTS + self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

pub struct Closure {
    pub name: ObjectId,
    pub context: ObjectId,
    pub formal_parameter_count: u16,
    pub prototype: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Box,
    AccessorPair,
    AliasedArgumentsEntry,
    TypeFeedbackInfo,
}

impl StructKind {
    pub fn field_count(self) -> usize {
        match self {
            StructKind::Box => 1,
            StructKind::AccessorPair => 2,
            StructKind::AliasedArgumentsEntry => 1,
            StructKind::TypeFeedbackInfo => 3,
        }
    }
}

pub struct StructRecord {
    pub kind: StructKind,
    pub fields: Box<[Value]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Normal,
    Native,
    Extension,
}

pub struct Script {
    pub id: i32,
    pub source: ObjectId,
    pub name: Value,
    pub line_offset: i32,
    pub column_offset: i32,
    pub context_data: Value,
    pub kind: ScriptKind,
    pub line_ends: Value,
}

/// Synthesized object layout: an ordered set of property names.
pub struct Shape {
    pub base: Option<ObjectId>,
    pub properties: IndexSet<ObjectId, RandomState>,
}

impl Shape {
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn slot_of(&self, name: ObjectId) -> Option<usize> {
        self.properties.get_index_of(&name)
    }
}

pub type ShapeKey = SmallVec<[ObjectId; 8]>;

pub struct ShapeCacheTable {
    pub entries: FastHashMap<ShapeKey, ObjectId>,
}

pub struct JsObject {
    pub shape: ObjectId,
    pub properties: Box<[Value]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    Type,
    Range,
    Syntax,
    Reference,
    Eval,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::Error,
        ErrorKind::Type,
        ErrorKind::Range,
        ErrorKind::Syntax,
        ErrorKind::Reference,
        ErrorKind::Eval,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::Type => "TypeError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Eval => "EvalError",
        }
    }

    /// Builtin that formats a templated message with arguments.
    pub fn maker_name(self) -> &'static str {
        match self {
            ErrorKind::Error => "MakeError",
            ErrorKind::Type => "MakeTypeError",
            ErrorKind::Range => "MakeRangeError",
            ErrorKind::Syntax => "MakeSyntaxError",
            ErrorKind::Reference => "MakeReferenceError",
            ErrorKind::Eval => "MakeEvalError",
        }
    }

    /// Builtin constructor that takes a plain message.
    pub fn constructor_name(self) -> &'static str {
        match self {
            ErrorKind::Error => "$Error",
            ErrorKind::Type => "$TypeError",
            ErrorKind::Range => "$RangeError",
            ErrorKind::Syntax => "$SyntaxError",
            ErrorKind::Reference => "$ReferenceError",
            ErrorKind::Eval => "$EvalError",
        }
    }
}

pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: ObjectId,
    pub arguments: Option<ObjectId>,
    /// Built without the builtin namespace.
    pub degraded: bool,
}

// ============================================================================
// HeapObject
// ============================================================================

pub enum HeapObject {
    HeapNumber(f64),
    String(StringObject),
    FixedArray(Box<[Value]>),
    FixedDoubleArray(Box<[f64]>),
    ByteArray(Box<[u8]>),
    Dictionary(Box<Dictionary>),
    Context(Box<Context>),
    Closure(Box<Closure>),
    Struct(Box<StructRecord>),
    Script(Box<Script>),
    Shape(Box<Shape>),
    ShapeCache(Box<ShapeCacheTable>),
    JsObject(Box<JsObject>),
    Error(Box<ErrorRecord>),
}

impl HeapObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            HeapObject::HeapNumber(_) => ObjectKind::HeapNumber,
            HeapObject::String(_) => ObjectKind::String,
            HeapObject::FixedArray(_) => ObjectKind::FixedArray,
            HeapObject::FixedDoubleArray(_) => ObjectKind::FixedDoubleArray,
            HeapObject::ByteArray(_) => ObjectKind::ByteArray,
            HeapObject::Dictionary(_) => ObjectKind::Dictionary,
            HeapObject::Context(_) => ObjectKind::Context,
            HeapObject::Closure(_) => ObjectKind::Closure,
            HeapObject::Struct(_) => ObjectKind::Struct,
            HeapObject::Script(_) => ObjectKind::Script,
            HeapObject::Shape(_) => ObjectKind::Shape,
            HeapObject::ShapeCache(_) => ObjectKind::ShapeCache,
            HeapObject::JsObject(_) => ObjectKind::JsObject,
            HeapObject::Error(_) => ObjectKind::Error,
        }
    }

    /// Estimated footprint in bytes, used for space accounting.
    pub fn size(&self) -> usize {
        let base = size_of::<HeapObject>();
        match self {
            HeapObject::HeapNumber(_) => base,
            HeapObject::String(s) => base + s.byte_size(),
            HeapObject::FixedArray(a) => base + a.len() * size_of::<Value>(),
            HeapObject::FixedDoubleArray(a) => base + a.len() * size_of::<f64>(),
            HeapObject::ByteArray(b) => base + b.len(),
            HeapObject::Dictionary(d) => {
                base + size_of::<Dictionary>()
                    + d.entries.capacity() * (size_of::<DictKey>() + size_of::<Value>())
            }
            HeapObject::Context(c) => {
                base + size_of::<Context>() + c.slots.len() * size_of::<Value>()
            }
            HeapObject::Closure(_) => base + size_of::<Closure>(),
            HeapObject::Struct(s) => {
                base + size_of::<StructRecord>() + s.fields.len() * size_of::<Value>()
            }
            HeapObject::Script(_) => base + size_of::<Script>(),
            HeapObject::Shape(s) => {
                base + size_of::<Shape>() + s.properties.capacity() * size_of::<ObjectId>()
            }
            HeapObject::ShapeCache(c) => {
                base + size_of::<ShapeCacheTable>()
                    + c.entries.capacity() * (size_of::<ShapeKey>() + size_of::<ObjectId>())
            }
            HeapObject::JsObject(o) => {
                base + size_of::<JsObject>() + o.properties.len() * size_of::<Value>()
            }
            HeapObject::Error(_) => base + size_of::<ErrorRecord>(),
        }
    }

    /// Visits every outgoing reference.
    pub fn trace<F: FnMut(ObjectId)>(&self, mut visit: F) {
        fn value<F: FnMut(ObjectId)>(v: &Value, visit: &mut F) {
            if let Some(id) = v.as_object() {
                visit(id);
            }
        }
        match self {
            HeapObject::HeapNumber(_)
            | HeapObject::FixedDoubleArray(_)
            | HeapObject::ByteArray(_) => {}
            HeapObject::String(s) => match s {
                StringObject::Composite(c) => {
                    visit(c.left);
                    visit(c.right);
                }
                StringObject::View(v) => visit(v.parent),
                StringObject::Flat(_) | StringObject::External(_) => {}
            },
            HeapObject::FixedArray(items) => {
                for v in items.iter() {
                    value(v, &mut visit);
                }
            }
            HeapObject::Dictionary(d) => {
                for (k, v) in &d.entries {
                    if let DictKey::Name(name) = k {
                        visit(*name);
                    }
                    value(v, &mut visit);
                }
            }
            HeapObject::Context(c) => {
                value(&c.closure, &mut visit);
                value(&c.extension, &mut visit);
                for id in [c.previous, c.native, c.shape_cache, c.object_template]
                    .into_iter()
                    .flatten()
                {
                    visit(id);
                }
                for v in c.slots.iter() {
                    value(v, &mut visit);
                }
            }
            HeapObject::Closure(c) => {
                visit(c.name);
                visit(c.context);
                value(&c.prototype, &mut visit);
            }
            HeapObject::Struct(s) => {
                for v in s.fields.iter() {
                    value(v, &mut visit);
                }
            }
            HeapObject::Script(s) => {
                visit(s.source);
                value(&s.name, &mut visit);
                value(&s.context_data, &mut visit);
                value(&s.line_ends, &mut visit);
            }
            HeapObject::Shape(s) => {
                if let Some(base) = s.base {
                    visit(base);
                }
                for name in &s.properties {
                    visit(*name);
                }
            }
            HeapObject::ShapeCache(c) => {
                for (key, shape) in &c.entries {
                    for name in key {
                        visit(*name);
                    }
                    visit(*shape);
                }
            }
            HeapObject::JsObject(o) => {
                visit(o.shape);
                for v in o.properties.iter() {
                    value(v, &mut visit);
                }
            }
            HeapObject::Error(e) => {
                visit(e.message);
                if let Some(args) = e.arguments {
                    visit(args);
                }
            }
        }
    }
}
