use super::{DynPrepare, Dynamic, Mapped, ProduceValue};
use crate::core::{Record, Value};
use crate::temporal::Temporal;
use std::any::Any;
use std::fmt;

/// Borrowed view of a field, read by the serializer and by array overlay.
pub enum FieldRef<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(&'a str),
    Record(&'a Record),
    List(&'a [Value]),
    Temporal(Temporal),
    Object(&'a dyn Mapped),
    Objects(Vec<&'a dyn Mapped>),
    Producer(&'a dyn ProduceValue),
    Dynamic(&'a Dynamic),
    /// Value the mapper cannot represent; carries the Rust type name.
    Unsupported(&'static str),
}

/// Mutable view of a field, used by merge to find what the field currently holds.
pub enum FieldMut<'a> {
    /// A mapped instance to merge into.
    Object(&'a mut dyn Mapped),
    /// An existing value able to prepare its replacement.
    Prototype(&'a dyn DynPrepare),
    Dynamic(&'a mut Dynamic),
    /// Optional field currently holding nothing.
    Vacant,
    /// Scalars, arrays, temporals and collections; nothing to delegate to.
    Plain,
}

/// Owned value produced by merge and handed to the generated write-back.
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Record(Record),
    List(Vec<Value>),
    Temporal(Temporal),
    Object(Box<dyn Mapped>),
    Objects(Vec<Box<dyn Mapped>>),
    Prepared(Box<dyn Any>),
    /// Verbatim raw input, assigned to unresolved fields.
    Raw(Value),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Temporal(_) => "temporal",
            Self::Object(_) => "object",
            Self::Objects(_) => "object collection",
            Self::Prepared(_) => "prepared value",
            Self::Raw(_) => "raw value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Boolean(value) => f.debug_tuple("Boolean").field(value).finish(),
            Self::Integer(value) => f.debug_tuple("Integer").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Self::Record(value) => f.debug_tuple("Record").field(value).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Temporal(value) => f.debug_tuple("Temporal").field(value).finish(),
            Self::Object(_) => write!(f, "Object(..)"),
            Self::Objects(items) => write!(f, "Objects(<{} items>)", items.len()),
            Self::Prepared(_) => write!(f, "Prepared(..)"),
            Self::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
        }
    }
}

impl FieldRef<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Temporal(_) => "temporal",
            Self::Object(_) => "object",
            Self::Objects(_) => "object collection",
            Self::Producer(_) => "value producer",
            Self::Dynamic(_) => "dynamic",
            Self::Unsupported(name) => name,
        }
    }

    /// Plain raw value for scalar, array and null views.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::Boolean(b) => Some(Value::Boolean(*b)),
            Self::Integer(i) => Some(Value::Integer(*i)),
            Self::Float(f) => Some(Value::Float(*f)),
            Self::Text(s) => Some(Value::Text((*s).to_string())),
            Self::Record(record) => Some(Value::Record((*record).clone())),
            Self::List(items) => Some(Value::List(items.to_vec())),
            Self::Dynamic(Dynamic::Value(value)) => Some(value.clone()),
            _ => None,
        }
    }
}
