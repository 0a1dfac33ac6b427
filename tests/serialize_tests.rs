use chrono::{DateTime, FixedOffset, TimeZone};
use recordmap::prelude::advanced::{CanonicalCodec, Prepare, PrepareError, ProduceValue, TemporalCodec};
use recordmap::{
    Dynamic, ErrorKind, MapError, Mapped, MappedExt, Mapper, MapperConfig, Record, Temporal, Value,
    impl_map_field, record,
};
use std::collections::BTreeMap;
use uuid::Uuid;

fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, mi, s)
        .unwrap()
}

/// Formats the `date` field as a bare date and leaves every other field canonical.
struct DateOnlyCodec;

impl TemporalCodec for DateOnlyCodec {
    fn format(&self, canonical: &CanonicalCodec, path: &str, value: &Temporal) -> String {
        if path == "date" {
            value
                .to_zoned(canonical.default_offset())
                .format("%Y-%m-%d")
                .to_string()
        } else {
            canonical.format(value)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Label(&'static str);

impl ProduceValue for Label {
    fn produce(&self) -> Value {
        Value::from(self.0)
    }
}

impl_map_field!(produce Label);

#[derive(Debug, Clone, Default)]
struct Secret;

impl Prepare for Secret {
    fn prepare(&self, _raw: &Value) -> Result<Self, PrepareError> {
        Ok(Secret)
    }
}

impl_map_field!(prepare Secret);

#[derive(Debug, Mapped)]
#[mapped(temporal_codec = DateOnlyCodec)]
struct Report {
    foo: i64,
    bar: String,
    null_date: Option<Temporal>,
    date: DateTime<FixedOffset>,
    immutable_date: DateTime<FixedOffset>,
    label: Label,
    baz: Record,
    list: Vec<Value>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            foo: 1,
            bar: "bar".into(),
            null_date: None,
            date: utc(2022, 1, 22, 22, 22, 22),
            immutable_date: utc(2022, 1, 22, 22, 22, 22),
            label: Label("toArrayValue"),
            baz: record! { "hello" => "world", "0" => 4, "1" => Value::Null },
            list: vec![Value::from(1), Value::from("two"), Value::from(3.5)],
        }
    }
}

#[test]
fn serialize_uses_codec_producers_and_raw_arrays() -> anyhow::Result<()> {
    let record = Report::default().to_record()?;

    assert_eq!(
        record,
        record! {
            "foo" => 1,
            "bar" => "bar",
            "null_date" => Value::Null,
            "date" => "2022-01-22",
            "immutable_date" => "2022-01-22T22:22:22+00:00",
            "label" => "toArrayValue",
            "baz" => record! { "hello" => "world", "0" => 4, "1" => Value::Null },
            "list" => vec![Value::from(1), Value::from("two"), Value::from(3.5)],
        }
    );
    Ok(())
}

#[derive(Debug, Default, Mapped)]
struct Wrapper {
    date: Option<DateTime<FixedOffset>>,
    report: Report,
}

#[test]
fn codec_belongs_to_the_owning_type() -> anyhow::Result<()> {
    let wrapper = Wrapper {
        date: Some(utc(2020, 5, 6, 7, 8, 9)),
        report: Report::default(),
    };

    let record = wrapper.to_record()?;
    assert_eq!(record.get("date"), Some(&Value::from("2020-05-06T07:08:09+00:00")));

    let report = record
        .get("report")
        .and_then(Value::as_record)
        .expect("nested record");
    assert_eq!(report.get("date"), Some(&Value::from("2022-01-22")));
    assert_eq!(
        report.get("immutable_date"),
        Some(&Value::from("2022-01-22T22:22:22+00:00"))
    );
    Ok(())
}

#[test]
fn naive_and_zoned_values_keep_their_form() -> anyhow::Result<()> {
    #[derive(Debug, Default, Mapped)]
    struct Stamp {
        at: Option<chrono::NaiveDateTime>,
        on: Option<Temporal>,
    }

    let stamp = Stamp {
        at: Some(utc(2021, 6, 1, 10, 30, 0).naive_utc()),
        on: Some(Temporal::Zoned(utc(2021, 6, 1, 10, 30, 0))),
    };

    let record = Mapper::new(MapperConfig::new().default_offset_seconds(7200)).serialize(&stamp)?;
    assert_eq!(record.get("at"), Some(&Value::from("2021-06-01T10:30:00")));
    assert_eq!(record.get("on"), Some(&Value::from("2021-06-01T10:30:00+00:00")));
    Ok(())
}

#[derive(Debug, Default, Mapped)]
struct Attachment {
    name: String,
    handle: Dynamic,
}

#[derive(Debug, Default, Mapped)]
struct Envelope {
    subject: String,
    inner: Attachment,
    extras: Dynamic,
}

#[test]
fn opaque_values_fail_with_their_path() -> anyhow::Result<()> {
    let attachment = Attachment {
        name: "log".into(),
        handle: Dynamic::opaque(tempfile::tempfile()?),
    };
    let err = attachment.to_record().unwrap_err();
    assert_eq!(
        err,
        MapError::UnsupportedSerializeType {
            path: "handle".into(),
            type_name: std::any::type_name::<std::fs::File>().into(),
        }
    );
    assert_eq!(err.kind(), ErrorKind::Serialize);

    let envelope = Envelope {
        subject: "hi".into(),
        inner: Attachment {
            name: "log".into(),
            handle: Dynamic::opaque(tempfile::tempfile()?),
        },
        extras: Dynamic::Null,
    };
    let err = envelope.to_record().unwrap_err();
    assert_eq!(err.field(), Some("inner.handle"));
    Ok(())
}

#[test]
fn opaque_values_inside_dynamic_lists_report_the_index() -> anyhow::Result<()> {
    let envelope = Envelope {
        extras: Dynamic::List(vec![
            Dynamic::from(Value::from(1)),
            Dynamic::opaque(tempfile::tempfile()?),
        ]),
        ..Envelope::default()
    };
    let err = envelope.to_record().unwrap_err();
    assert_eq!(err.field(), Some("extras.1"));
    Ok(())
}

#[test]
fn dynamic_values_serialize_structurally() -> anyhow::Result<()> {
    let mut entries = BTreeMap::new();
    entries.insert("count".to_string(), Dynamic::from(Value::from(3)));
    entries.insert("label".to_string(), Dynamic::producer(Label("x")));
    entries.insert(
        "child".to_string(),
        Dynamic::object(Attachment {
            name: "a.txt".into(),
            handle: Dynamic::Null,
        }),
    );

    let envelope = Envelope {
        subject: "s".into(),
        inner: Attachment::default(),
        extras: Dynamic::Map(entries),
    };

    assert_eq!(
        envelope.to_record()?,
        record! {
            "subject" => "s",
            "inner" => record! { "name" => "", "handle" => Value::Null },
            "extras" => record! {
                "child" => record! { "name" => "a.txt", "handle" => Value::Null },
                "count" => 3,
                "label" => "x",
            },
        }
    );
    Ok(())
}

#[test]
fn prepare_only_values_cannot_be_serialized() {
    #[derive(Debug, Default, Mapped)]
    struct Vault {
        owner: String,
        secret: Secret,
    }

    let err = Vault::default().to_record().unwrap_err();
    assert!(matches!(
        err,
        MapError::UnsupportedSerializeType { ref path, .. } if path == "secret"
    ));
}

#[derive(Debug, Default, Mapped)]
#[mapped(exclude(internal), exclude_serialize(password))]
struct Credentials {
    login: String,
    password: String,
    internal: i64,
}

#[derive(Debug, Default, Mapped)]
#[mapped(exclude(token))]
struct Session {
    id: Option<Uuid>,
    token: String,
    credentials: Credentials,
    #[mapped(nested = Credentials)]
    history: Vec<Credentials>,
}

#[test]
fn serialize_exclusions_apply_per_object() -> anyhow::Result<()> {
    let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8")?;
    let session = Session {
        id: Some(id),
        token: "t".into(),
        credentials: Credentials {
            login: "ann".into(),
            password: "hunter2".into(),
            internal: 7,
        },
        history: vec![Credentials {
            login: "old".into(),
            password: "x".into(),
            internal: 1,
        }],
    };

    assert_eq!(
        session.to_record()?,
        record! {
            "id" => "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "credentials" => record! { "login" => "ann", "internal" => 7 },
            "history" => vec![Value::from(record! { "login" => "old", "internal" => 1 })],
        }
    );
    Ok(())
}

#[test]
fn serialize_of_empty_object_is_empty_record() -> anyhow::Result<()> {
    #[derive(Debug, Default, Mapped)]
    struct Empty {}

    assert_eq!(recordmap::serialize(&Empty::default())?, Record::new());
    Ok(())
}
