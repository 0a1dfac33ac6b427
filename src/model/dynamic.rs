use super::{FieldMut, FieldRef, FieldValue, MapField, Mapped, ProduceValue};
use crate::core::{SemanticType, Value};
use crate::temporal::Temporal;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Holder for a field with no declared type.
///
/// Merge recurses into a held [`Dynamic::Object`] and otherwise replaces the
/// whole holder with the raw input. Serialize walks lists and maps
/// element by element, so an [`Opaque`] value anywhere inside is reported
/// with its dotted path.
#[derive(Default)]
pub enum Dynamic {
    #[default]
    Null,
    Value(Value),
    Temporal(Temporal),
    Object(Box<dyn Mapped>),
    Producer(Box<dyn ProduceValue>),
    List(Vec<Dynamic>),
    Map(BTreeMap<String, Dynamic>),
    Opaque(Opaque),
}

impl Dynamic {
    pub fn object<T: Mapped>(value: T) -> Self {
        Self::Object(Box::new(value))
    }

    pub fn producer<T: ProduceValue + 'static>(value: T) -> Self {
        Self::Producer(Box::new(value))
    }

    pub fn opaque<T: Any>(value: T) -> Self {
        Self::Opaque(Opaque::new(value))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&dyn Mapped> {
        match self {
            Self::Object(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    pub fn downcast_object<T: Mapped>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Value(value) => value.type_name(),
            Self::Temporal(_) => "temporal",
            Self::Object(_) => "object",
            Self::Producer(_) => "value producer",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Opaque(opaque) => opaque.type_name(),
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Temporal(value) => f.debug_tuple("Temporal").field(value).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(&object.type_name()).finish(),
            Self::Producer(producer) => f.debug_tuple("Producer").field(&producer.produce()).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Opaque(opaque) => f.debug_tuple("Opaque").field(&opaque.type_name()).finish(),
        }
    }
}

impl From<Value> for Dynamic {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Value(other),
        }
    }
}

impl From<Temporal> for Dynamic {
    fn from(value: Temporal) -> Self {
        Self::Temporal(value)
    }
}

impl From<Vec<Dynamic>> for Dynamic {
    fn from(items: Vec<Dynamic>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Dynamic>> for Dynamic {
    fn from(entries: BTreeMap<String, Dynamic>) -> Self {
        Self::Map(entries)
    }
}

/// A value the mapper can hold but never represent, such as an open handle.
pub struct Opaque {
    type_name: &'static str,
    inner: Box<dyn Any>,
}

impl Opaque {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Box::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

impl MapField for Dynamic {
    fn semantic_type() -> SemanticType {
        SemanticType::Unresolved
    }

    fn nullable() -> bool {
        true
    }

    fn field_ref(&self) -> FieldRef<'_> {
        match self {
            Self::Null => FieldRef::Null,
            other => FieldRef::Dynamic(other),
        }
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Dynamic(self)
    }

    fn take_object(&mut self) -> Option<Box<dyn Mapped>> {
        match std::mem::take(self) {
            Self::Object(object) => Some(object),
            other => {
                *self = other;
                None
            }
        }
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        Some(match value {
            FieldValue::Null => Self::Null,
            FieldValue::Raw(raw) => Self::from(raw),
            FieldValue::Boolean(b) => Self::Value(Value::Boolean(b)),
            FieldValue::Integer(i) => Self::Value(Value::Integer(i)),
            FieldValue::Float(f) => Self::Value(Value::Float(f)),
            FieldValue::Text(s) => Self::Value(Value::Text(s)),
            FieldValue::Record(record) => Self::Value(Value::Record(record)),
            FieldValue::List(items) => Self::Value(Value::List(items)),
            FieldValue::Temporal(t) => Self::Temporal(t),
            FieldValue::Object(object) => Self::Object(object),
            FieldValue::Objects(objects) => {
                Self::List(objects.into_iter().map(Self::Object).collect())
            }
            FieldValue::Prepared(_) => return None,
        })
    }
}
