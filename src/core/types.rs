use super::{MapError, Result};
use crate::exclusion::ExclusionTable;
use crate::model::{Mapped, MappedType};
use crate::temporal::TemporalKind;
use std::fmt;

/// Fixed scalar kinds a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Bool,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Factory = fn() -> Result<Box<dyn Mapped>>;

/// Reference to a mapped type: its name, zero-argument factory and descriptor table.
#[derive(Clone, Copy)]
pub struct TypeRef {
    name: &'static str,
    create: Factory,
    descriptor: fn() -> &'static TypeDescriptor,
}

impl TypeRef {
    pub fn new(
        name: &'static str,
        create: Factory,
        descriptor: fn() -> &'static TypeDescriptor,
    ) -> Self {
        Self {
            name,
            create,
            descriptor,
        }
    }

    pub fn of<T: MappedType>() -> Self {
        Self::new(T::type_name_static(), T::create_boxed, T::type_descriptor)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptor(&self) -> &'static TypeDescriptor {
        (self.descriptor)()
    }

    pub fn instantiate(&self) -> Result<Box<dyn Mapped>> {
        (self.create)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name).finish()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeRef {}

/// Closed set of semantic field types, decided once when the descriptor table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Scalar(ScalarKind),
    RawArray,
    Temporal(TemporalKind),
    Nested(TypeRef),
    Preparer(&'static str),
    /// No static type; dispatch follows the value held at merge time.
    Unresolved,
    /// A declared type with no merge semantics (serialize-only producers, handles).
    Opaque(&'static str),
}

impl SemanticType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::RawArray => "array",
            Self::Temporal(kind) => kind.name(),
            Self::Nested(type_ref) => type_ref.name(),
            Self::Preparer(name) | Self::Opaque(name) => name,
            Self::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub semantic: SemanticType,
    pub nullable: bool,
    /// Element type from the nested-type annotation, for collections of mapped values.
    pub element_type: Option<TypeRef>,
    pub has_setter: bool,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, semantic: SemanticType, nullable: bool) -> Self {
        Self {
            name,
            semantic,
            nullable,
            element_type: None,
            has_setter: false,
        }
    }

    pub fn of<T: crate::model::MapField>(name: &'static str) -> Self {
        Self::new(name, T::semantic_type(), T::nullable())
    }

    pub fn with_element_type(mut self, element_type: TypeRef) -> Self {
        self.element_type = Some(element_type);
        self
    }

    pub fn with_setter(mut self, has_setter: bool) -> Self {
        self.has_setter = has_setter;
        self
    }

    pub fn is_collection(&self) -> bool {
        self.element_type.is_some()
    }
}

/// Per-type descriptor table: ordered fields plus exclusion metadata.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    exclusions: ExclusionTable,
}

impl TypeDescriptor {
    pub fn new(type_name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            type_name,
            fields,
            exclusions: ExclusionTable::default(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionTable) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    pub fn find_field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.find_field_index(name).map(|idx| &self.fields[idx])
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn exclusions(&self) -> &ExclusionTable {
        &self.exclusions
    }

    pub(crate) fn field_not_found(&self, field: &str) -> MapError {
        MapError::FieldNotFound {
            type_name: self.type_name,
            field: field.to_string(),
        }
    }
}
