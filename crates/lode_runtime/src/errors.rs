//! Factory errors and the message constants used by invariant checks.

use thiserror::Error;

/// Recoverable failures reported by factory constructors.
///
/// Transient allocation failure never shows up here: it is handled inside the
/// allocation protocol, and a second failure is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("Invalid string length: {length} exceeds the maximum of {max}")]
    InvalidStringLength { length: usize, max: usize },
    #[error("Invalid factory configuration: {0}")]
    InvalidConfig(&'static str),
}

pub mod messages {
    pub const OUT_OF_MEMORY: &str = "fatal: out of memory";
    pub const NOT_A_STRING: &str = "Not a string";
    pub const NOT_A_FIXED_ARRAY: &str = "Not a fixed array";
    pub const NOT_A_DICTIONARY: &str = "Not a dictionary";
    pub const NOT_A_CONTEXT: &str = "Not a context";
    pub const NOT_A_CLOSURE: &str = "Not a closure";
    pub const NOT_A_SHAPE: &str = "Not a shape";
    pub const NOT_A_SHAPE_CACHE: &str = "Not a shape cache";
    pub const NOT_INTERNALIZED: &str = "Property name is not an internalized string";
    pub const WRONG_DICTIONARY_KIND: &str = "Dictionary key kind does not match the dictionary";
    pub const SLICE_OUT_OF_BOUNDS: &str = "Slice bounds out of range";
    pub const INDEX_OUT_OF_BOUNDS: &str = "Index out of bounds";
    pub const CONTEXT_TOO_SMALL: &str = "Function context is smaller than the fixed header";
    pub const PROPERTY_COUNT_MISMATCH: &str = "Property value count does not match the shape";
    pub const ALLOCATION_DISALLOWED: &str = "Allocation inside a no-allocation region";
    pub const DEAD_OBJECT: &str = "Object was garbage collected";
}
