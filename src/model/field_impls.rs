use super::{FieldMut, FieldRef, FieldValue, MapField, Mapped, MappedType, Prepare, PrepareError, ProduceValue};
use crate::core::{Record, ScalarKind, SemanticType, Value};
use crate::temporal::{Temporal, TemporalKind};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

macro_rules! impl_int_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapField for $ty {
                fn semantic_type() -> SemanticType {
                    SemanticType::Scalar(ScalarKind::Int)
                }

                fn field_ref(&self) -> FieldRef<'_> {
                    FieldRef::Integer(i64::from(*self))
                }

                fn from_field_value(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::Integer(i) => <$ty>::try_from(i).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_int_field!(i8, i16, i32, i64, u8, u16, u32);

impl MapField for f64 {
    fn semantic_type() -> SemanticType {
        SemanticType::Scalar(ScalarKind::Float)
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Float(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl MapField for f32 {
    fn semantic_type() -> SemanticType {
        SemanticType::Scalar(ScalarKind::Float)
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Float(f64::from(*self))
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(f) => Some(f as f32),
            _ => None,
        }
    }
}

impl MapField for bool {
    fn semantic_type() -> SemanticType {
        SemanticType::Scalar(ScalarKind::Bool)
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Boolean(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl MapField for String {
    fn semantic_type() -> SemanticType {
        SemanticType::Scalar(ScalarKind::String)
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Text(self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl MapField for Record {
    fn semantic_type() -> SemanticType {
        SemanticType::RawArray
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Record(self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Record(record) => Some(record),
            FieldValue::List(items) => Some(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| (idx.to_string(), item))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl MapField for Vec<Value> {
    fn semantic_type() -> SemanticType {
        SemanticType::RawArray
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::List(self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::List(items) => Some(items),
            FieldValue::Record(record) => Some(record.into_values_ordered()),
            _ => None,
        }
    }
}

/// Collection of mapped elements; merged element-wise only with a nested-type annotation.
impl<T: MappedType> MapField for Vec<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::RawArray
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Objects(self.iter().map(|item| item as &dyn Mapped).collect())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Objects(items) => items
                .into_iter()
                .map(|item| item.into_any().downcast::<T>().ok().map(|boxed| *boxed))
                .collect(),
            FieldValue::List(items) if items.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }
}

impl<T: MapField> MapField for Option<T> {
    fn semantic_type() -> SemanticType {
        T::semantic_type()
    }

    fn nullable() -> bool {
        true
    }

    fn field_ref(&self) -> FieldRef<'_> {
        match self {
            Some(value) => value.field_ref(),
            None => FieldRef::Null,
        }
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        match self {
            Some(value) => value.field_mut(),
            None => FieldMut::Vacant,
        }
    }

    fn take_object(&mut self) -> Option<Box<dyn Mapped>> {
        self.as_mut().and_then(T::take_object)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

macro_rules! impl_temporal_field {
    ($ty:ty, $kind:ident) => {
        impl MapField for $ty {
            fn semantic_type() -> SemanticType {
                SemanticType::Temporal(TemporalKind::$kind)
            }

            fn field_ref(&self) -> FieldRef<'_> {
                FieldRef::Temporal(Temporal::$kind(*self))
            }

            fn from_field_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::Temporal(Temporal::$kind(v)) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_temporal_field!(DateTime<FixedOffset>, Zoned);
impl_temporal_field!(DateTime<Utc>, Utc);
impl_temporal_field!(NaiveDateTime, Local);
impl_temporal_field!(NaiveDate, Date);

impl MapField for Temporal {
    fn semantic_type() -> SemanticType {
        SemanticType::Temporal(TemporalKind::Any)
    }

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Temporal(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Temporal(t) => Some(t),
            _ => None,
        }
    }
}

impl Prepare for Uuid {
    fn prepare(&self, raw: &Value) -> Result<Self, PrepareError> {
        match raw {
            Value::Text(text) => Uuid::parse_str(text.trim())
                .map_err(|err| PrepareError::new(format!("invalid uuid '{}': {}", text, err))),
            other => Err(PrepareError::new(format!(
                "expected uuid string, got {}",
                other.type_name()
            ))),
        }
    }
}

impl ProduceValue for Uuid {
    fn produce(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

crate::impl_map_field!(prepare + produce Uuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_fields_reject_overflow() {
        assert_eq!(u8::from_field_value(FieldValue::Integer(200)), Some(200));
        assert_eq!(u8::from_field_value(FieldValue::Integer(300)), None);
        assert_eq!(i32::from_field_value(FieldValue::Float(1.0)), None);
    }

    #[test]
    fn test_option_maps_null_and_vacancy() {
        assert_eq!(Option::<String>::from_field_value(FieldValue::Null), Some(None));
        assert!(<Option<String> as MapField>::nullable());

        let mut vacant: Option<Uuid> = None;
        assert!(matches!(vacant.field_mut(), FieldMut::Vacant));
        let mut held = Some(Uuid::nil());
        assert!(matches!(held.field_mut(), FieldMut::Prototype(_)));
    }

    #[test]
    fn test_raw_arrays_accept_both_shapes() {
        let list = vec![Value::from(1), Value::from("a")];
        let record = Record::from_field_value(FieldValue::List(list.clone())).unwrap();
        assert_eq!(record.get("1"), Some(&Value::from("a")));

        let back = Vec::<Value>::from_field_value(FieldValue::Record(record)).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_temporal_kind_must_match_declaration() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 22).unwrap();
        assert_eq!(
            NaiveDate::from_field_value(FieldValue::Temporal(Temporal::Date(date))),
            Some(date)
        );
        let local = date.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            NaiveDate::from_field_value(FieldValue::Temporal(Temporal::Local(local))),
            None
        );
    }

    #[test]
    fn test_uuid_prepares_from_text() {
        let raw = Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8");
        let prepared = Uuid::nil().prepare(&raw).unwrap();
        assert_eq!(prepared.produce(), raw);
        assert!(Uuid::nil().prepare(&Value::Integer(4)).is_err());
    }
}
