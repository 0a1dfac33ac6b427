use chrono::{DateTime, NaiveDate, Utc};
use recordmap::{
    Dynamic, ErrorKind, MapError, Mapped, MappedExt, Operation, Record, ScalarKind, SemanticType,
    Temporal, TemporalKind, Value, describe, exclusions, record, resolve_field, resolve_type,
};
use uuid::Uuid;

#[derive(Debug, Default, Mapped)]
struct Tag {
    name: String,
}

#[derive(Debug, Default, Mapped)]
#[mapped(
    exclude(audit),
    exclude_merge(id),
    exclude_deserialize(created_at, audit)
)]
struct Profile {
    id: Uuid,
    r#type: String,
    age: Option<u32>,
    score: f64,
    active: bool,
    created_at: Option<DateTime<Utc>>,
    birthday: Option<NaiveDate>,
    seen: Option<Temporal>,
    settings: Record,
    #[mapped(nested = Tag)]
    tags: Vec<Tag>,
    main_tag: Option<Tag>,
    extra: Dynamic,
    audit: Vec<Value>,
}

#[test]
fn descriptor_lists_fields_in_declaration_order() {
    let names: Vec<_> = describe(&Profile::default()).iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec![
            "id", "type", "age", "score", "active", "created_at", "birthday", "seen", "settings",
            "tags", "main_tag", "extra", "audit",
        ]
    );
    assert_eq!(Profile::default().type_name(), "Profile");
}

#[test]
fn fields_resolve_to_semantic_types() -> anyhow::Result<()> {
    let age = resolve_type::<Profile>("age")?;
    assert_eq!(age.semantic, SemanticType::Scalar(ScalarKind::Int));
    assert!(age.nullable);

    let score = resolve_type::<Profile>("score")?;
    assert_eq!(score.semantic, SemanticType::Scalar(ScalarKind::Float));
    assert!(!score.nullable);

    assert_eq!(
        resolve_type::<Profile>("type")?.semantic,
        SemanticType::Scalar(ScalarKind::String)
    );
    assert_eq!(
        resolve_type::<Profile>("created_at")?.semantic,
        SemanticType::Temporal(TemporalKind::Utc)
    );
    assert_eq!(
        resolve_type::<Profile>("birthday")?.semantic,
        SemanticType::Temporal(TemporalKind::Date)
    );
    assert_eq!(
        resolve_type::<Profile>("seen")?.semantic,
        SemanticType::Temporal(TemporalKind::Any)
    );
    assert_eq!(resolve_type::<Profile>("settings")?.semantic, SemanticType::RawArray);
    assert_eq!(resolve_type::<Profile>("extra")?.semantic, SemanticType::Unresolved);
    assert!(matches!(
        resolve_type::<Profile>("id")?.semantic,
        SemanticType::Preparer(_)
    ));

    let tags = resolve_type::<Profile>("tags")?;
    assert_eq!(tags.semantic, SemanticType::RawArray);
    assert!(tags.is_collection());
    assert_eq!(tags.element_type.map(|t| t.name()), Some("Tag"));

    let main_tag = resolve_type::<Profile>("main_tag")?;
    assert!(main_tag.nullable);
    assert!(matches!(main_tag.semantic, SemanticType::Nested(t) if t.name() == "Tag"));
    Ok(())
}

#[test]
fn unknown_field_is_a_descriptor_error() {
    let err = resolve_field(&Profile::default(), "nickname").unwrap_err();
    assert_eq!(
        err,
        MapError::FieldNotFound {
            type_name: "Profile",
            field: "nickname".into(),
        }
    );
    assert_eq!(err.kind(), ErrorKind::Descriptor);
}

#[test]
fn exclusion_slots_fall_back_to_shared() {
    let profile = Profile::default();

    let merge = exclusions(&profile, Operation::Merge);
    assert!(merge.contains("id"));
    assert!(!merge.contains("audit"));
    assert_eq!(merge.len(), 1);

    let serialize = exclusions(&profile, Operation::Serialize);
    assert_eq!(serialize.iter().collect::<Vec<_>>(), vec!["audit"]);

    let deserialize = exclusions(&profile, Operation::Deserialize);
    assert!(deserialize.contains("created_at"));
    assert!(deserialize.contains("audit"));
    assert!(!deserialize.contains("id"));
}

#[test]
fn types_without_exclusions_exclude_nothing() {
    for operation in [Operation::Merge, Operation::Serialize, Operation::Deserialize] {
        assert!(exclusions(&Tag::default(), operation).is_empty());
    }
}

#[test]
fn operations_honour_their_own_slot() -> anyhow::Result<()> {
    let id = Uuid::parse_str("936da01f-9abd-4d9d-80c7-02af85c822a8")?;
    let input = record! {
        "id" => id.to_string(),
        "created_at" => "2024-03-01T12:00:00Z",
        "audit" => vec![Value::from("created")],
    };

    let mut merged = Profile::default();
    merged.merge_record(&input)?;
    assert_eq!(merged.id, Uuid::nil());
    assert!(merged.created_at.is_some());
    assert_eq!(merged.audit, vec![Value::from("created")]);

    let built: Profile = recordmap::deserialize(&input)?;
    assert_eq!(built.id, id);
    assert_eq!(built.created_at, None);
    assert!(built.audit.is_empty());

    let out = built.to_record()?;
    assert!(!out.contains_key("audit"));
    assert_eq!(out.get("id"), Some(&Value::from(id.to_string())));
    Ok(())
}

#[test]
fn raw_identifiers_map_to_plain_names() -> anyhow::Result<()> {
    let mut profile = Profile::default();
    profile.merge_record(&record! { "type" => "admin" })?;
    assert_eq!(profile.r#type, "admin");
    assert_eq!(profile.to_record()?.get("type"), Some(&Value::from("admin")));
    Ok(())
}
