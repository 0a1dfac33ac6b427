use super::config::MapperConfig;
use crate::core::{MapError, Record, Result, Value};
use crate::exclusion::{Operation, exclusions};
use crate::model::{Dynamic, FieldRef, Mapped};
use crate::temporal::{CanonicalCodec, Temporal, TemporalCodec};
use tracing::{Level, debug_span, event};

/// Where a value sits: the full dotted path for errors, the path inside
/// its owning object for the owner's temporal codec.
struct Site<'p> {
    path: &'p str,
    local: &'p str,
    codec: Option<&'static dyn TemporalCodec>,
}

impl Site<'_> {
    fn child(&self, key: &str) -> (String, String) {
        (join_path(self.path, key), join_path(self.local, key))
    }

    fn nested<'q>(&self, path: &'q str, local: &'q str) -> Site<'q> {
        Site {
            path,
            local,
            codec: self.codec,
        }
    }
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Produces one record from one object graph.
pub(crate) struct SerializeRun {
    canonical: CanonicalCodec,
}

impl SerializeRun {
    pub(crate) fn new(config: &MapperConfig) -> Self {
        Self {
            canonical: CanonicalCodec::with_offset_seconds(config.default_offset_seconds),
        }
    }

    pub(crate) fn serialize(&self, source: &dyn Mapped, prefix: &str) -> Result<Record> {
        let descriptor = source.descriptor();
        let span = debug_span!(
            "recordmap.serialize.object",
            type_name = %descriptor.type_name(),
            path = %prefix
        );
        let _enter = span.enter();

        let excluded = exclusions(source, Operation::Serialize);
        let codec = source.temporal_codec();
        let mut record = Record::new();

        for field in descriptor.fields() {
            if excluded.contains(field.name) {
                event!(Level::TRACE, field = field.name, "field excluded");
                continue;
            }

            let view = source
                .field_ref(field.name)
                .ok_or_else(|| descriptor.field_not_found(field.name))?;
            let path = join_path(prefix, field.name);
            let site = Site {
                path: &path,
                local: field.name,
                codec,
            };

            event!(Level::TRACE, field = field.name, view = view.kind_name(), "serializing field");
            record.insert(field.name, self.serialize_view(view, &site)?);
        }

        Ok(record)
    }

    fn serialize_view(&self, view: FieldRef<'_>, site: &Site<'_>) -> Result<Value> {
        Ok(match view {
            FieldRef::Null => Value::Null,
            FieldRef::Boolean(b) => Value::Boolean(b),
            FieldRef::Integer(i) => Value::Integer(i),
            FieldRef::Float(f) => Value::Float(f),
            FieldRef::Text(text) => Value::Text(text.to_string()),
            FieldRef::Record(record) => Value::Record(record.clone()),
            FieldRef::List(items) => Value::List(items.to_vec()),
            FieldRef::Temporal(value) => Value::Text(self.format_temporal(site, &value)),
            FieldRef::Object(object) => Value::Record(self.serialize(object, site.path)?),
            FieldRef::Objects(objects) => Value::List(
                objects
                    .into_iter()
                    .enumerate()
                    .map(|(idx, object)| {
                        self.serialize(object, &join_path(site.path, &idx.to_string()))
                            .map(Value::Record)
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            FieldRef::Producer(producer) => producer.produce(),
            FieldRef::Dynamic(dynamic) => self.serialize_dynamic(dynamic, site)?,
            FieldRef::Unsupported(type_name) => return Err(unsupported(site.path, type_name)),
        })
    }

    fn serialize_dynamic(&self, dynamic: &Dynamic, site: &Site<'_>) -> Result<Value> {
        Ok(match dynamic {
            Dynamic::Null => Value::Null,
            Dynamic::Value(value) => value.clone(),
            Dynamic::Temporal(value) => Value::Text(self.format_temporal(site, value)),
            Dynamic::Object(object) => Value::Record(self.serialize(object.as_ref(), site.path)?),
            Dynamic::Producer(producer) => producer.produce(),
            Dynamic::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let (path, local) = site.child(&idx.to_string());
                    values.push(self.serialize_dynamic(item, &site.nested(&path, &local))?);
                }
                Value::List(values)
            }
            Dynamic::Map(entries) => {
                let mut record = Record::new();
                for (key, item) in entries {
                    let (path, local) = site.child(key);
                    record.insert(key.clone(), self.serialize_dynamic(item, &site.nested(&path, &local))?);
                }
                Value::Record(record)
            }
            Dynamic::Opaque(opaque) => return Err(unsupported(site.path, opaque.type_name())),
        })
    }

    fn format_temporal(&self, site: &Site<'_>, value: &Temporal) -> String {
        match site.codec {
            Some(codec) => codec.format(&self.canonical, site.local, value),
            None => self.canonical.format(value),
        }
    }
}

fn unsupported(path: &str, type_name: &str) -> MapError {
    event!(Level::DEBUG, path = %path, type_name = %type_name, "unsupported value");
    MapError::UnsupportedSerializeType {
        path: path.to_string(),
        type_name: type_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_has_no_leading_dot() {
        assert_eq!(join_path("", "date"), "date");
        assert_eq!(join_path("child", "date"), "child.date");
        assert_eq!(join_path("items.0", "tags"), "items.0.tags");
    }
}
