//! Core types for the lode managed heap.
//!
//! This crate contains the fundamental types that are independent of the factory:
//! - `ObjectId` - Indirect handle to a heap-allocated object
//! - `Space` - Allocation space hint (short-lived vs long-lived)
//! - `Value` - Tagged word holding an immediate or an object reference
//! - `FastHashMap` - Hash map with the ahash hasher used across the workspace

pub mod gc;
pub mod value;

pub use gc::{ObjectId, Space};
pub use value::{FastHashMap, Value, fast_hasher, fast_map_new, fast_map_with_capacity};
