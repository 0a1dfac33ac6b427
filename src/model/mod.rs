//! Capabilities a type opts into to take part in mapping.
//!
//! Mapped structs normally get their impls from `#[derive(Mapped)]`; leaf
//! value types implement [`MapField`] (directly or through
//! [`impl_map_field!`](crate::impl_map_field)) together with [`Prepare`] and
//! [`ProduceValue`] as needed.

pub mod dynamic;
pub mod field;
mod field_impls;

pub use dynamic::{Dynamic, Opaque};
pub use field::{FieldMut, FieldRef, FieldValue};

use crate::core::{MapError, Result, SemanticType, TypeDescriptor, Value};
use crate::temporal::TemporalCodec;
use std::any::Any;
use thiserror::Error;

/// An object whose fields participate in record mapping.
///
/// The engine reaches fields only through this dispatch table, keyed by the
/// field names listed in [`Mapped::descriptor`].
pub trait Mapped: Any {
    /// Static descriptor table of the concrete type.
    fn descriptor(&self) -> &'static TypeDescriptor;
    /// Borrowed view of a field for reading.
    fn field_ref(&self, field: &str) -> Option<FieldRef<'_>>;
    /// Mutable view of a field, exposing what it currently holds.
    fn field_mut(&mut self, field: &str) -> Option<FieldMut<'_>>;
    /// Writes a new value, through the field's setter when it has one.
    fn assign_field(&mut self, field: &str, value: FieldValue) -> Result<()>;
    /// Per-type temporal parse/format override.
    fn temporal_codec(&self) -> Option<&'static dyn TemporalCodec> {
        None
    }
    /// Moves a held nested object out of `field` so it can be written back.
    fn take_object(&mut self, field: &str) -> Option<Box<dyn Mapped>>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn type_name(&self) -> &'static str {
        self.descriptor().type_name()
    }
}

/// Static side of [`Mapped`]: the descriptor and the zero-argument factory.
pub trait MappedType: Mapped + Default + Sized {
    fn type_descriptor() -> &'static TypeDescriptor;
    fn type_name_static() -> &'static str;

    /// Zero-argument factory; `#[mapped(factory = path)]` replaces it.
    fn create() -> Result<Self> {
        Ok(Self::default())
    }

    fn create_boxed() -> Result<Box<dyn Mapped>> {
        Self::create().map(|value| Box::new(value) as Box<dyn Mapped>)
    }
}

/// A type that can be declared as a field of a mapped struct.
pub trait MapField: Sized + 'static {
    /// Semantic type decided from the declaration alone.
    fn semantic_type() -> SemanticType;

    fn nullable() -> bool {
        false
    }

    fn field_ref(&self) -> FieldRef<'_>;

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Plain
    }

    fn take_object(&mut self) -> Option<Box<dyn Mapped>> {
        None
    }

    /// Takes ownership of a merged value; `None` when the shape does not fit.
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

/// Converts a merged value into the declared Rust type of `field`.
pub fn convert_field<T: MapField>(field: &str, value: FieldValue) -> Result<T> {
    let found = value.kind_name();
    T::from_field_value(value).ok_or_else(|| MapError::Assign {
        field: field.to_string(),
        type_name: std::any::type_name::<T>(),
        found,
    })
}

/// Return types accepted from setter methods.
pub trait SetterOutput {
    fn into_result(self) -> Result<()>;
}

impl SetterOutput for () {
    fn into_result(self) -> Result<()> {
        Ok(())
    }
}

impl SetterOutput for Result<()> {
    fn into_result(self) -> Result<()> {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PrepareError(pub String);

impl PrepareError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Builds a replacement value from raw input.
///
/// Invoked on the value the field currently holds, which acts as the
/// factory for its successor.
pub trait Prepare: Sized + 'static {
    fn prepare(&self, raw: &Value) -> std::result::Result<Self, PrepareError>;
}

/// Object-safe face of [`Prepare`] used by the engine.
pub trait DynPrepare {
    fn prepared_type_name(&self) -> &'static str;
    fn prepare_dyn(&self, raw: &Value) -> std::result::Result<Box<dyn Any>, PrepareError>;
}

impl<T: Prepare> DynPrepare for T {
    fn prepared_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn prepare_dyn(&self, raw: &Value) -> std::result::Result<Box<dyn Any>, PrepareError> {
        self.prepare(raw).map(|value| Box::new(value) as Box<dyn Any>)
    }
}

/// Serialize-side capability: the value stands for a single raw value.
pub trait ProduceValue {
    fn produce(&self) -> Value;
}

/// Enumerated value backed by a string or integer.
pub trait ValueEnum: Sized + 'static {
    fn backing(&self) -> Value;
    fn from_backing(raw: &Value) -> Option<Self>;
}

/// Resolves a [`ValueEnum`] variant from raw input.
///
/// Text that parses as an integer also matches integer-backed variants.
pub fn prepare_value_enum<E: ValueEnum>(raw: &Value) -> std::result::Result<E, PrepareError> {
    match raw {
        Value::Text(text) => E::from_backing(raw)
            .or_else(|| text.trim().parse::<i64>().ok().and_then(|i| E::from_backing(&Value::Integer(i))))
            .ok_or_else(|| PrepareError::new(format!("'{}' is not a valid backing value", text))),
        Value::Integer(i) => E::from_backing(raw)
            .ok_or_else(|| PrepareError::new(format!("{} is not a valid backing value", i))),
        other => Err(PrepareError::new(format!(
            "expected string or int, got {}",
            other.type_name()
        ))),
    }
}

/// Implements [`MapField`] for a leaf value type.
///
/// * `prepare T` – built through [`Prepare`] from the held value; not serializable.
/// * `produce T` – serialized through [`ProduceValue`]; never merged.
/// * `prepare + produce T` – both.
#[macro_export]
macro_rules! impl_map_field {
    (prepare $ty:ty) => {
        impl $crate::model::MapField for $ty {
            fn semantic_type() -> $crate::core::SemanticType {
                $crate::core::SemanticType::Preparer(::std::any::type_name::<$ty>())
            }

            fn field_ref(&self) -> $crate::model::FieldRef<'_> {
                $crate::model::FieldRef::Unsupported(::std::any::type_name::<$ty>())
            }

            fn field_mut(&mut self) -> $crate::model::FieldMut<'_> {
                $crate::model::FieldMut::Prototype(self)
            }

            fn from_field_value(value: $crate::model::FieldValue) -> ::std::option::Option<Self> {
                $crate::impl_map_field!(@prepared value $ty)
            }
        }
    };
    (produce $ty:ty) => {
        impl $crate::model::MapField for $ty {
            fn semantic_type() -> $crate::core::SemanticType {
                $crate::core::SemanticType::Opaque(::std::any::type_name::<$ty>())
            }

            fn field_ref(&self) -> $crate::model::FieldRef<'_> {
                $crate::model::FieldRef::Producer(self)
            }

            fn from_field_value(_value: $crate::model::FieldValue) -> ::std::option::Option<Self> {
                ::std::option::Option::None
            }
        }
    };
    (prepare + produce $ty:ty) => {
        impl $crate::model::MapField for $ty {
            fn semantic_type() -> $crate::core::SemanticType {
                $crate::core::SemanticType::Preparer(::std::any::type_name::<$ty>())
            }

            fn field_ref(&self) -> $crate::model::FieldRef<'_> {
                $crate::model::FieldRef::Producer(self)
            }

            fn field_mut(&mut self) -> $crate::model::FieldMut<'_> {
                $crate::model::FieldMut::Prototype(self)
            }

            fn from_field_value(value: $crate::model::FieldValue) -> ::std::option::Option<Self> {
                $crate::impl_map_field!(@prepared value $ty)
            }
        }
    };
    (@prepared $value:ident $ty:ty) => {
        match $value {
            $crate::model::FieldValue::Prepared(prepared) => {
                prepared.downcast::<$ty>().ok().map(|boxed| *boxed)
            }
            _ => ::std::option::Option::None,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl ValueEnum for Level {
        fn backing(&self) -> Value {
            match self {
                Self::Low => Value::Integer(1),
                Self::High => Value::Integer(2),
            }
        }

        fn from_backing(raw: &Value) -> Option<Self> {
            match raw {
                Value::Integer(1) => Some(Self::Low),
                Value::Integer(2) => Some(Self::High),
                _ => None,
            }
        }
    }

    #[test]
    fn test_value_enum_accepts_int_and_numeric_text() {
        assert_eq!(prepare_value_enum::<Level>(&Value::Integer(2)), Ok(Level::High));
        assert_eq!(prepare_value_enum::<Level>(&Value::from("1")), Ok(Level::Low));
    }

    #[test]
    fn test_value_enum_rejects_other_shapes() {
        assert!(prepare_value_enum::<Level>(&Value::Integer(9)).is_err());
        assert!(prepare_value_enum::<Level>(&Value::Boolean(true)).is_err());
        assert!(prepare_value_enum::<Level>(&Value::Null).is_err());
    }

    #[test]
    fn test_convert_field_reports_found_kind() {
        let err = convert_field::<i32>("age", FieldValue::Text("x".into())).unwrap_err();
        assert_eq!(
            err,
            MapError::Assign {
                field: "age".into(),
                type_name: "i32",
                found: "string",
            }
        );
    }
}
