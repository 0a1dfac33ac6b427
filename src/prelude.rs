//! Recommended imports grouped by role.
//!
//! `dx` covers declaring mapped types and running the mapper.
//! `advanced` adds the hooks for hand-written field types and codecs.

pub mod dx {
    //! Everyday surface: derives, the mapper and the raw record shape.
    pub use crate::{
        Dynamic, MapError, Mapped, MappedExt, Mapper, MapperConfig, Record, Result, Temporal,
        Value, ValueEnum, deserialize, merge, record, serialize,
    };
}

pub mod advanced {
    //! Extension points for leaf value types, temporal policies and descriptors.
    pub use crate::impl_map_field;
    pub use crate::model::{
        DynPrepare, FieldMut, FieldRef, FieldValue, MapField, MappedType, Prepare, PrepareError,
        ProduceValue, SetterOutput, convert_field, prepare_value_enum,
    };
    pub use crate::temporal::{CanonicalCodec, TemporalCodec, TemporalKind};
    pub use crate::{ExclusionTable, FieldDescriptor, Operation, SemanticType, TypeDescriptor, TypeRef};
}

pub use dx::*;
