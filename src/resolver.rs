//! Field lookup against descriptor tables.

use crate::core::{FieldDescriptor, Result, TypeDescriptor};
use crate::model::{Mapped, MappedType};

/// Looks up `field` on a descriptor table.
pub fn resolve(descriptor: &TypeDescriptor, field: &str) -> Result<FieldDescriptor> {
    descriptor
        .get_field(field)
        .copied()
        .ok_or_else(|| descriptor.field_not_found(field))
}

pub fn resolve_field(target: &dyn Mapped, field: &str) -> Result<FieldDescriptor> {
    resolve(target.descriptor(), field)
}

pub fn resolve_type<T: MappedType>(field: &str) -> Result<FieldDescriptor> {
    resolve(T::type_descriptor(), field)
}

/// Every field of `target` in declaration order.
pub fn describe(target: &dyn Mapped) -> &'static [FieldDescriptor] {
    target.descriptor().fields()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MapError, ScalarKind, SemanticType};

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "Sample",
            vec![
                FieldDescriptor::new("name", SemanticType::Scalar(ScalarKind::String), false),
                FieldDescriptor::new("tags", SemanticType::RawArray, true),
            ],
        )
    }

    #[test]
    fn test_resolve_known_field() {
        let field = resolve(&descriptor(), "tags").unwrap();
        assert_eq!(field.semantic, SemanticType::RawArray);
        assert!(field.nullable);
    }

    #[test]
    fn test_resolve_missing_field() {
        let err = resolve(&descriptor(), "nope").unwrap_err();
        assert_eq!(
            err,
            MapError::FieldNotFound {
                type_name: "Sample",
                field: "nope".into(),
            }
        );
    }
}
