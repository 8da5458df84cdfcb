//! Tagged value representation.
//!
//! A `Value` is one 64-bit word. The top 16 bits carry the tag and the low 48
//! bits the payload: a small integer, a boolean, or an `ObjectId`. Numbers that
//! do not fit a small integer live on the heap as heap numbers.

use crate::gc::ObjectId;
use ahash::RandomState;
use hashbrown::HashMap;
use std::fmt;
use std::hash::Hash;

// ============================================================================
// HashMap helpers
// ============================================================================

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

pub fn fast_map_with_capacity<K: Eq + Hash, V>(cap: usize) -> FastHashMap<K, V> {
    HashMap::with_capacity_and_hasher(cap, fast_hasher())
}

// ============================================================================
// Tag layout
// ============================================================================

pub const TAG_SHIFT: u64 = 48;
pub const PAYLOAD_MASK: u64 = 0x0000_ffff_ffff_ffff;

pub const TAG_SMI: u64 = 0x0001;
pub const TAG_UNDEFINED: u64 = 0x0002;
pub const TAG_NULL: u64 = 0x0003;
pub const TAG_BOOL: u64 = 0x0004;
pub const TAG_HOLE: u64 = 0x0005;
pub const TAG_OBJECT: u64 = 0x0006;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Value(u64);

impl Default for Value {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl Value {
    pub const UNDEFINED: Value = Value(TAG_UNDEFINED << TAG_SHIFT);
    pub const NULL: Value = Value(TAG_NULL << TAG_SHIFT);
    pub const HOLE: Value = Value(TAG_HOLE << TAG_SHIFT);
    pub const TRUE: Value = Value((TAG_BOOL << TAG_SHIFT) | 1);
    pub const FALSE: Value = Value(TAG_BOOL << TAG_SHIFT);

    #[inline(always)]
    pub fn from_smi(i: i32) -> Self {
        Self((TAG_SMI << TAG_SHIFT) | (i as u32 as u64))
    }

    #[inline(always)]
    pub fn from_bool(b: bool) -> Self {
        if b { Self::TRUE } else { Self::FALSE }
    }

    #[inline(always)]
    pub fn object(id: ObjectId) -> Self {
        Self((TAG_OBJECT << TAG_SHIFT) | id.0 as u64)
    }

    #[inline(always)]
    pub fn tag(&self) -> u64 {
        self.0 >> TAG_SHIFT
    }

    #[inline(always)]
    pub fn is_smi(&self) -> bool {
        self.tag() == TAG_SMI
    }
    #[inline(always)]
    pub fn is_undefined(&self) -> bool {
        self.tag() == TAG_UNDEFINED
    }
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.tag() == TAG_NULL
    }
    #[inline(always)]
    pub fn is_bool(&self) -> bool {
        self.tag() == TAG_BOOL
    }
    #[inline(always)]
    pub fn is_hole(&self) -> bool {
        self.tag() == TAG_HOLE
    }
    #[inline(always)]
    pub fn is_object(&self) -> bool {
        self.tag() == TAG_OBJECT
    }

    #[inline(always)]
    pub fn as_smi(&self) -> i32 {
        (self.0 & PAYLOAD_MASK) as u32 as i32
    }

    #[inline(always)]
    pub fn as_bool(&self) -> bool {
        (self.0 & 1) != 0
    }

    #[inline(always)]
    pub fn as_obj_id(&self) -> ObjectId {
        ObjectId((self.0 & PAYLOAD_MASK) as u32)
    }

    /// The referenced object, if this value is a reference.
    #[inline]
    pub fn as_object(&self) -> Option<ObjectId> {
        if self.is_object() { Some(self.as_obj_id()) } else { None }
    }

    pub fn type_name(&self) -> &'static str {
        match self.tag() {
            TAG_SMI => "smi",
            TAG_UNDEFINED => "undefined",
            TAG_NULL => "null",
            TAG_BOOL => "bool",
            TAG_HOLE => "hole",
            TAG_OBJECT => "object",
            _ => "unknown",
        }
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::object(id)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            TAG_SMI => write!(f, "Smi({})", self.as_smi()),
            TAG_UNDEFINED => write!(f, "Undefined"),
            TAG_NULL => write!(f, "Null"),
            TAG_BOOL => write!(f, "Bool({})", self.as_bool()),
            TAG_HOLE => write!(f, "Hole"),
            TAG_OBJECT => write!(f, "Object({:?})", self.as_obj_id()),
            tag => write!(f, "Unknown(tag={})", tag),
        }
    }
}
