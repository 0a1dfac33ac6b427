use super::coerce::{array_field_value, coerce_array, coerce_scalar, merge_array};
use super::config::MapperConfig;
use crate::core::{FieldDescriptor, MapError, Record, Result, SemanticType, TypeRef, Value};
use crate::exclusion::{Operation, exclusions};
use crate::model::{Dynamic, FieldMut, FieldValue, Mapped};
use crate::temporal::{CanonicalCodec, Temporal, TemporalCodec, TemporalKind};
use tracing::{Level, debug_span, event};

/// Applies one record onto one object graph.
pub(crate) struct MergeRun<'c> {
    config: &'c MapperConfig,
    operation: Operation,
    canonical: CanonicalCodec,
}

impl<'c> MergeRun<'c> {
    pub(crate) fn new(config: &'c MapperConfig, operation: Operation) -> Self {
        Self {
            config,
            operation,
            canonical: CanonicalCodec::with_offset_seconds(config.default_offset_seconds),
        }
    }

    /// Merges every eligible field of `target` present in `record`, in declaration order.
    pub(crate) fn merge(&self, target: &mut dyn Mapped, record: &Record) -> Result<()> {
        let descriptor = target.descriptor();
        let span = debug_span!(
            "recordmap.merge.object",
            type_name = %descriptor.type_name(),
            operation = %self.operation
        );
        let _enter = span.enter();

        let excluded = exclusions(target, self.operation);
        for field in descriptor.fields() {
            if excluded.contains(field.name) {
                event!(Level::TRACE, field = field.name, "field excluded");
                continue;
            }
            let Some(raw) = record.get(field.name) else {
                continue;
            };

            event!(
                Level::TRACE,
                field = field.name,
                semantic = field.semantic.type_name(),
                input = raw.type_name(),
                "merging field"
            );
            self.merge_field(target, field, raw)?;
        }

        Ok(())
    }

    fn merge_field(&self, target: &mut dyn Mapped, field: &FieldDescriptor, raw: &Value) -> Result<()> {
        if raw.is_null() && field.nullable {
            return target.assign_field(field.name, FieldValue::Null);
        }

        match field.semantic {
            SemanticType::Scalar(kind) => {
                let value = coerce_scalar(field.name, kind, raw, self.config.strict_scalars)?;
                target.assign_field(field.name, value)
            }
            SemanticType::RawArray => match field.element_type {
                Some(element) => self.merge_collection(target, field, element, raw),
                None => self.merge_raw_array(target, field, raw),
            },
            SemanticType::Temporal(kind) => self.merge_temporal(target, field, kind, raw),
            SemanticType::Preparer(type_name) => self.merge_prepared(target, field, type_name, raw),
            SemanticType::Nested(type_ref) => self.merge_nested(target, field, type_ref, raw),
            SemanticType::Unresolved => self.merge_unresolved(target, field, raw),
            SemanticType::Opaque(type_name) => Err(MapError::UnsupportedMergeType {
                field: field.name.to_string(),
                type_name,
            }),
        }
    }

    fn merge_raw_array(&self, target: &mut dyn Mapped, field: &FieldDescriptor, raw: &Value) -> Result<()> {
        let current = target
            .field_ref(field.name)
            .and_then(|view| view.to_value());
        let merged = merge_array(self.config.array_merge, current, coerce_array(raw));
        target.assign_field(field.name, array_field_value(merged))
    }

    /// Replaces the collection with one fresh element per input item.
    fn merge_collection(
        &self,
        target: &mut dyn Mapped,
        field: &FieldDescriptor,
        element: TypeRef,
        raw: &Value,
    ) -> Result<()> {
        let items = match raw {
            Value::Null => Vec::new(),
            Value::List(items) => items.clone(),
            Value::Record(record) => record.clone().into_values_ordered(),
            other => return Err(not_a_record(field.name, other)),
        };

        event!(
            Level::DEBUG,
            field = field.name,
            element = element.name(),
            count = items.len(),
            "rebuilding collection"
        );

        let mut built = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let path = format!("{}.{}", field.name, idx);
            let mut instance = instantiate(element, &path)?;
            match item {
                Value::Null => {}
                Value::Record(record) => self.merge_within(instance.as_mut(), record, &path)?,
                Value::List(list) => {
                    self.merge_within(instance.as_mut(), &list_as_record(list), &path)?
                }
                other => return Err(not_a_record(&path, other)),
            }
            built.push(instance);
        }

        target.assign_field(field.name, FieldValue::Objects(built))
    }

    fn merge_temporal(
        &self,
        target: &mut dyn Mapped,
        field: &FieldDescriptor,
        kind: TemporalKind,
        raw: &Value,
    ) -> Result<()> {
        let Value::Text(text) = raw else {
            return Err(MapError::TemporalParse {
                field: field.name.to_string(),
                input: raw.to_string(),
                reason: format!("expected string, got {}", raw.type_name()),
            });
        };

        let parsed = self.parse_temporal(target.temporal_codec(), field.name, text, kind)?;
        target.assign_field(field.name, FieldValue::Temporal(parsed))
    }

    fn parse_temporal(
        &self,
        codec: Option<&'static dyn TemporalCodec>,
        field: &str,
        text: &str,
        kind: TemporalKind,
    ) -> Result<Temporal> {
        match codec {
            Some(codec) => codec.parse(&self.canonical, field, text, kind),
            None => self.canonical.parse(field, text, kind),
        }
    }

    /// Asks the held value to build its successor.
    fn merge_prepared(
        &self,
        target: &mut dyn Mapped,
        field: &FieldDescriptor,
        type_name: &'static str,
        raw: &Value,
    ) -> Result<()> {
        let prepared = match field_mut(target, field.name)? {
            FieldMut::Prototype(prototype) => {
                prototype
                    .prepare_dyn(raw)
                    .map_err(|err| MapError::Prepare {
                        field: field.name.to_string(),
                        type_name,
                        reason: err.to_string(),
                    })?
            }
            _ => {
                return Err(MapError::MissingPrototype {
                    field: field.name.to_string(),
                    type_name,
                });
            }
        };

        target.assign_field(field.name, FieldValue::Prepared(prepared))
    }

    fn merge_nested(
        &self,
        target: &mut dyn Mapped,
        field: &FieldDescriptor,
        type_ref: TypeRef,
        raw: &Value,
    ) -> Result<()> {
        let converted;
        let record = match raw {
            Value::Null => {
                event!(Level::DEBUG, field = field.name, "null input for non-nullable object ignored");
                return Ok(());
            }
            Value::Record(record) => record,
            Value::List(items) => {
                converted = list_as_record(items);
                &converted
            }
            other => return Err(not_a_record(field.name, other)),
        };

        if let FieldMut::Object(object) = field_mut(target, field.name)? {
            self.merge_within(object, record, field.name)?;
            return self.write_back(target, field);
        }

        event!(Level::DEBUG, field = field.name, type_name = type_ref.name(), "instantiating nested object");
        let mut instance = instantiate(type_ref, field.name)?;
        self.merge_within(instance.as_mut(), record, field.name)?;
        target.assign_field(field.name, FieldValue::Object(instance))
    }

    /// No declared type: recurse into a held object, otherwise store the input as is.
    fn merge_unresolved(&self, target: &mut dyn Mapped, field: &FieldDescriptor, raw: &Value) -> Result<()> {
        let held: Option<&mut dyn Mapped> = match field_mut(target, field.name)? {
            FieldMut::Object(object) => Some(object),
            FieldMut::Dynamic(Dynamic::Object(object)) => Some(object.as_mut()),
            _ => None,
        };

        if let Some(object) = held {
            match raw {
                Value::Record(record) => self.merge_within(object, record, field.name)?,
                Value::List(items) => self.merge_within(object, &list_as_record(items), field.name)?,
                other => return Err(not_a_record(field.name, other)),
            }
            return self.write_back(target, field);
        }

        target.assign_field(field.name, FieldValue::Raw(raw.clone()))
    }
}

impl MergeRun<'_> {
    /// Merges a nested object, qualifying its errors with the path it was reached through.
    fn merge_within(&self, object: &mut dyn Mapped, record: &Record, path: &str) -> Result<()> {
        self.merge(object, record).map_err(|err| err.within(path))
    }

    /// Hands an object merged in place to the field's setter.
    fn write_back(&self, target: &mut dyn Mapped, field: &FieldDescriptor) -> Result<()> {
        if !field.has_setter {
            return Ok(());
        }
        match target.take_object(field.name) {
            Some(object) => {
                event!(Level::TRACE, field = field.name, "writing merged object back through setter");
                target.assign_field(field.name, FieldValue::Object(object))
            }
            None => Ok(()),
        }
    }
}

fn field_mut<'t>(target: &'t mut dyn Mapped, field: &str) -> Result<FieldMut<'t>> {
    let descriptor = target.descriptor();
    target
        .field_mut(field)
        .ok_or_else(|| descriptor.field_not_found(field))
}

fn instantiate(type_ref: TypeRef, field: &str) -> Result<Box<dyn Mapped>> {
    type_ref.instantiate().map_err(|err| MapError::Instantiate {
        field: field.to_string(),
        type_name: type_ref.name(),
        reason: err.to_string(),
    })
}

fn not_a_record(field: &str, found: &Value) -> MapError {
    MapError::NotARecord {
        field: field.to_string(),
        found: found.type_name(),
    }
}

fn list_as_record(items: &[Value]) -> Record {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| (idx.to_string(), item.clone()))
        .collect()
}
