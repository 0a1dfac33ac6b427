// ============================================================================
// recordmap Library
// ============================================================================

extern crate self as recordmap;

pub mod core;
pub mod engine;
pub mod exclusion;
pub mod model;
pub mod prelude;
pub mod resolver;
pub mod temporal;

// Re-export main types for convenience
pub use crate::core::{
    ErrorKind, FieldDescriptor, MapError, Record, Result, ScalarKind, SemanticType,
    TypeDescriptor, TypeRef, Value,
};
pub use crate::engine::{
    ArrayMergePolicy, Mapper, MapperConfig, MappedExt, deserialize, merge, serialize,
};
pub use exclusion::{ExclusionSet, ExclusionTable, Operation, exclusions};
pub use model::{
    Dynamic, FieldMut, FieldRef, FieldValue, MapField, Mapped, MappedType, Opaque, Prepare,
    PrepareError, ProduceValue, ValueEnum,
};
pub use resolver::{describe, resolve, resolve_field, resolve_type};
pub use temporal::{CanonicalCodec, Temporal, TemporalCodec, TemporalKind};

// Re-export derive macros
pub use recordmap_derive::{Mapped, ValueEnum};
