use fake::faker::name::en::Name;
use fake::Fake;
use patchdoc::common::{Convertible, Value};
use patchdoc::doc;
use patchdoc::document::Document;
use patchdoc::errors::{ErrorKind, PatchError, PatchResult};
use patchdoc::update::{
    build_partial_update, build_partial_update_with, AttributeFlags, AttributeTable,
    PartialUpdateBuilder, Patchable, Update, UpdatePayload, UpdateSink,
};
use patchdoc_derive::{Convertible, Patchable};

#[ctor::ctor]
fn init() {
    colog::init();
}

/// Age whose conversion fails for negative values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Age(i32);

impl Convertible for Age {
    type Output = Age;

    fn to_value(&self) -> PatchResult<Value> {
        if self.0 < 0 {
            return Err(PatchError::new(
                &format!("Age {} is negative", self.0),
                ErrorKind::ConversionError,
            ));
        }
        Ok(Value::I32(self.0))
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        Ok(Age(i32::from_value(value)?))
    }
}

#[derive(Debug, Default, Clone, Patchable, Convertible)]
pub struct User {
    pub id: Option<String>,
    pub name: Option<String>,
    pub age: Option<Age>,
    #[patch(transient)]
    pub internal_cache: Option<String>,
}

fn user(name: Option<&str>, age: Option<i32>, internal_cache: Option<&str>) -> User {
    User {
        id: None,
        name: name.map(String::from),
        age: age.map(Age),
        internal_cache: internal_cache.map(String::from),
    }
}

fn entries(payload: &UpdatePayload) -> Vec<(String, Value)> {
    payload
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[test]
fn test_transient_attribute_is_filtered() {
    let record = user(Some("Ana"), Some(30), Some("x"));
    let payload = build_partial_update(&record, &[]).unwrap();

    assert_eq!(
        entries(&payload),
        vec![
            ("name".to_string(), Value::from("Ana")),
            ("age".to_string(), Value::I32(30)),
        ]
    );
}

#[test]
fn test_null_attribute_is_omitted() {
    let record = user(Some("Ana"), None, Some("x"));
    let payload = build_partial_update(&record, &[]).unwrap();

    assert_eq!(entries(&payload), vec![("name".to_string(), Value::from("Ana"))]);
}

#[test]
fn test_excluded_attribute_is_omitted() {
    let record = user(Some("Ana"), Some(30), None);
    let payload = build_partial_update(&record, &["age"]).unwrap();

    assert_eq!(entries(&payload), vec![("name".to_string(), Value::from("Ana"))]);
}

#[test]
fn test_all_null_gives_empty_payload() {
    let record = user(None, None, None);
    let payload = build_partial_update(&record, &[]).unwrap();

    assert!(payload.is_empty());
    assert_eq!(payload.to_string(), "{}");
}

#[test]
fn test_accessor_failure_returns_no_payload() {
    let record = user(Some("Ana"), Some(-1), None);
    let result = build_partial_update(&record, &[]);

    let err = result.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::AccessError);
    assert_eq!(err.attribute(), Some("age"));
    assert!(err.cause().is_some());
}

#[test]
fn test_failing_attribute_can_be_excluded() {
    let record = user(Some("Ana"), Some(-1), None);
    let payload = build_partial_update(&record, &["age"]).unwrap();

    assert_eq!(payload.names().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_derived_table_follows_declaration_order() {
    let table = User::attribute_table();

    assert_eq!(table.shape(), "User");
    let names: Vec<&str> = table.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["id", "name", "age", "internal_cache"]);
    assert_eq!(
        table.get("internal_cache").map(|d| d.flags()),
        Some(AttributeFlags::TRANSIENT)
    );
}

#[test]
fn test_build_is_deterministic() {
    for _ in 0..20 {
        let name: String = Name().fake();
        let age: i32 = (0..120).fake();
        let record = user(Some(&name), Some(age), Some("cache"));

        let first = build_partial_update(&record, &["id"]).unwrap();
        let second = build_partial_update(&record, &["id"]).unwrap();

        assert_eq!(entries(&first), entries(&second));
        assert_eq!(first.get("name"), Some(&Value::from(name)));
    }
}

#[test]
fn test_excluded_names_never_appear() {
    let record = User {
        id: Some("u1".to_string()),
        name: Some("Ana".to_string()),
        age: Some(Age(41)),
        internal_cache: Some("x".to_string()),
    };

    for exclude in [
        vec![],
        vec!["id"],
        vec!["name", "age"],
        vec!["id", "name", "age", "internal_cache"],
        vec!["AGE", "unknown"],
    ] {
        let payload = build_partial_update(&record, &exclude).unwrap();
        for name in &exclude {
            assert!(!payload.contains(name), "{} should be excluded", name);
        }
        assert!(!payload.contains("internal_cache"));
    }
}

#[test]
fn test_duplicate_exclusions_are_harmless() {
    let record = user(Some("Ana"), Some(30), None);
    let once = build_partial_update(&record, &["name"]).unwrap();
    let twice = build_partial_update(&record, &["name", "name"]).unwrap();

    assert_eq!(entries(&once), entries(&twice));
}

#[test]
fn test_record_is_not_modified() {
    let record = user(Some("Ana"), Some(30), Some("x"));
    let snapshot = record.clone();

    let _ = build_partial_update(&record, &["name"]).unwrap();

    assert_eq!(record.name, snapshot.name);
    assert_eq!(record.age, snapshot.age);
    assert_eq!(record.internal_cache, snapshot.internal_cache);
}

#[derive(Debug, Default, Patchable, Convertible)]
pub struct Audited {
    #[patch(rename = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    #[patch(derived)]
    pub title_length: Option<i32>,
    #[patch(class_level)]
    pub schema_version: Option<i32>,
    #[patch(transient, derived)]
    pub scratch: Option<String>,
}

#[test]
fn test_non_persistable_attributes_never_appear() {
    let record = Audited {
        id: Some("a1".to_string()),
        title: Some("Hello".to_string()),
        title_length: Some(5),
        schema_version: Some(2),
        scratch: Some("tmp".to_string()),
    };
    let payload = build_partial_update(&record, &[]).unwrap();

    assert_eq!(payload.names().collect::<Vec<_>>(), vec!["_id", "title"]);

    let flags = Audited::attribute_table().get("scratch").map(|d| d.flags());
    assert_eq!(flags, Some(AttributeFlags::TRANSIENT | AttributeFlags::DERIVED));
}

#[derive(Default)]
struct RecordingSink {
    writes: Vec<(String, Value)>,
}

impl UpdateSink for RecordingSink {
    fn set(&mut self, name: &str, value: Value) -> PatchResult<()> {
        self.writes.push((name.to_string(), value));
        Ok(())
    }
}

#[test]
fn test_sink_receives_payload_in_order() {
    let record = user(Some("Ana"), Some(30), Some("x"));
    let builder = PartialUpdateBuilder::new().exclude("id");

    let mut sink = RecordingSink::default();
    builder.build_into(&record, &mut sink).unwrap();

    assert_eq!(
        sink.writes,
        vec![
            ("name".to_string(), Value::from("Ana")),
            ("age".to_string(), Value::I32(30)),
        ]
    );
}

#[test]
fn test_failed_build_writes_nothing_to_sink() {
    let record = user(Some("Ana"), Some(-7), None);

    let mut sink = RecordingSink::default();
    let result = PartialUpdateBuilder::new().build_into(&record, &mut sink);

    assert!(result.is_err());
    assert!(sink.writes.is_empty());
}

#[test]
fn test_payload_feeds_update_document() {
    let record = user(Some("Ana"), Some(30), Some("x"));
    let payload = build_partial_update(&record, &[]).unwrap();

    let update = Update::from_payload(&payload).unwrap();
    assert_eq!(
        update.to_document(),
        doc! {
            "$set": { "name": "Ana", "age": 30 }
        }
    );

    let mut document = Document::new();
    payload.apply_to(&mut document).unwrap();
    assert_eq!(document, doc! { "name": "Ana", "age": 30 });
}

struct Point {
    x: i32,
    y: Option<i32>,
}

#[test]
fn test_hand_built_table() {
    let table: AttributeTable<Point> = AttributeTable::builder("Point")
        .attribute("x", |p: &Point| p.x.to_value())
        .attribute("y", |p: &Point| p.y.to_value())
        .derived("norm", |p: &Point| Ok(Value::I32(p.x.abs() + p.y.unwrap_or(0).abs())))
        .build()
        .unwrap();

    let payload = build_partial_update_with(&Point { x: -3, y: None }, &table, &[]).unwrap();
    assert_eq!(entries(&payload), vec![("x".to_string(), Value::I32(-3))]);

    let payload = build_partial_update_with(&Point { x: 1, y: Some(2) }, &table, &["x"]).unwrap();
    assert_eq!(entries(&payload), vec![("y".to_string(), Value::I32(2))]);
}
