//! Managed-heap object factory and string engine.
//!
//! Every heap object is built through one allocation front-end that stays
//! correct when the collector reclaims or moves memory at any allocation.

#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]

pub mod builtins_registry;
pub mod config;
pub mod core;
pub mod errors;
pub mod factory;

pub use builtins_registry::{BuiltinNamespace, BuiltinProvider, ErrorMaker, StdBuiltinProvider};
pub use config::FactoryConfig;
pub use self::core::{
    AllocationRequest, CollectionStats, Encoding, ErrorKind, ExternalStringResource, HeapObject,
    NeedsCollection, ObjectKind, RawHeap, SpaceHeap, StringShape, Units,
};
pub use errors::FactoryError;
pub use factory::{Completion, ErrorInvocation, Factory, Roots, ScopeMark};
pub use lode_core::{ObjectId, Space, Value};
