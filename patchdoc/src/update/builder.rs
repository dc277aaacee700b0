use crate::errors::{PatchError, PatchResult};
use crate::update::{AttributeTable, ExclusionSet, Patchable, UpdatePayload, UpdateSink};

/// Builds the partial update payload of `record` from its derived attribute table.
///
/// An attribute is written iff it has no classification flag, its name is not
/// in `exclude`, and its current value is not null. Entries follow declaration
/// order.
///
/// # Errors
///
/// If an accessor fails, the build stops and returns an
/// [AccessError](crate::errors::ErrorKind::AccessError) naming the shape and
/// the attribute; no partial payload is produced.
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Patchable, Convertible)]
/// struct User {
///     id: String,
///     name: Option<String>,
///     age: Option<i32>,
///     #[patch(transient)]
///     internal_cache: Option<String>,
/// }
///
/// let user = User { id: "u1".into(), name: Some("Ana".into()), age: None, internal_cache: Some("x".into()) };
/// let payload = build_partial_update(&user, &[])?;
/// // {"id": "u1", "name": "Ana"}
/// ```
pub fn build_partial_update<T: Patchable>(record: &T, exclude: &[&str]) -> PatchResult<UpdatePayload> {
    build_partial_update_with(record, T::attribute_table(), exclude)
}

/// Builds the partial update payload of `record` from an explicit attribute table.
///
/// Same rules as [build_partial_update]; use it for tables built at
/// registration time with [AttributeTable::builder].
pub fn build_partial_update_with<T>(
    record: &T,
    table: &AttributeTable<T>,
    exclude: &[&str],
) -> PatchResult<UpdatePayload> {
    let exclusions = ExclusionSet::from(exclude);
    build_payload(record, table, &exclusions)
}

fn build_payload<T>(
    record: &T,
    table: &AttributeTable<T>,
    exclusions: &ExclusionSet<'_>,
) -> PatchResult<UpdatePayload> {
    let mut payload = UpdatePayload::with_capacity(table.len());

    for descriptor in table.iter() {
        if !descriptor.is_persistable() || exclusions.contains(descriptor.name()) {
            continue;
        }

        let value = descriptor.read(record).map_err(|err| {
            log::error!(
                "Could not read attribute {} of {}: {}",
                descriptor.name(),
                table.shape(),
                err
            );
            PatchError::access(table.shape(), descriptor.name(), err)
        })?;

        if value.is_null() {
            continue;
        }
        payload.insert(descriptor.name(), value);
    }

    log::trace!(
        "Partial update of {} has {} of {} attributes",
        table.shape(),
        payload.len(),
        table.len()
    );
    Ok(payload)
}

/// A reusable partial update configuration.
///
/// Holds an exclusion list that applies to every build, for callers that
/// always leave out the same attributes (an id, an audit field). Extra names
/// can still be excluded per call.
///
/// ```rust,ignore
/// let builder = PartialUpdateBuilder::new().exclude("id").exclude("created_at");
/// let payload = builder.build(&user)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PartialUpdateBuilder {
    excluded: Vec<String>,
}

impl PartialUpdateBuilder {
    pub fn new() -> Self {
        PartialUpdateBuilder {
            excluded: Vec::new(),
        }
    }

    pub fn exclude(mut self, name: &str) -> Self {
        self.excluded.push(name.to_string());
        self
    }

    pub fn exclude_all(mut self, names: &[&str]) -> Self {
        self.excluded.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn build<T: Patchable>(&self, record: &T) -> PatchResult<UpdatePayload> {
        self.build_excluding(record, T::attribute_table(), &[])
    }

    pub fn build_with<T>(&self, record: &T, table: &AttributeTable<T>) -> PatchResult<UpdatePayload> {
        self.build_excluding(record, table, &[])
    }

    /// Builds with this builder's exclusions plus `extra`.
    pub fn build_excluding<T>(
        &self,
        record: &T,
        table: &AttributeTable<T>,
        extra: &[&str],
    ) -> PatchResult<UpdatePayload> {
        let exclusions: ExclusionSet = self
            .excluded
            .iter()
            .map(|n| n.as_str())
            .chain(extra.iter().copied())
            .collect();
        build_payload(record, table, &exclusions)
    }

    /// Builds the payload of `record` and writes it into `sink`.
    ///
    /// The sink is untouched if the build fails.
    pub fn build_into<T: Patchable>(&self, record: &T, sink: &mut dyn UpdateSink) -> PatchResult<()> {
        let payload = self.build(record)?;
        payload.apply_to(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::document::Document;
    use crate::errors::ErrorKind;
    use std::sync::LazyLock;

    struct User {
        id: String,
        name: Option<String>,
        age: Option<i32>,
        internal_cache: Option<String>,
    }

    impl Patchable for User {
        fn attribute_table() -> &'static AttributeTable<Self> {
            static TABLE: LazyLock<AttributeTable<User>> = LazyLock::new(|| {
                AttributeTable::from_validated(
                    "User",
                    vec![
                        crate::update::AttributeDescriptor::new(
                            "id",
                            crate::update::AttributeFlags::NONE,
                            |u: &User| Ok(Value::from(u.id.clone())),
                        ),
                        crate::update::AttributeDescriptor::new(
                            "name",
                            crate::update::AttributeFlags::NONE,
                            |u: &User| Ok(Value::from(u.name.clone())),
                        ),
                        crate::update::AttributeDescriptor::new(
                            "age",
                            crate::update::AttributeFlags::NONE,
                            |u: &User| Ok(Value::from(u.age)),
                        ),
                        crate::update::AttributeDescriptor::new(
                            "internal_cache",
                            crate::update::AttributeFlags::TRANSIENT,
                            |u: &User| Ok(Value::from(u.internal_cache.clone())),
                        ),
                    ],
                )
            });
            &TABLE
        }
    }

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: Some("Ana".to_string()),
            age: Some(30),
            internal_cache: Some("x".to_string()),
        }
    }

    fn names(payload: &UpdatePayload) -> Vec<&str> {
        payload.names().collect()
    }

    #[test]
    fn test_all_persistable_non_null_attributes() {
        let payload = build_partial_update(&user(), &[]).unwrap();
        assert_eq!(names(&payload), vec!["id", "name", "age"]);
        assert_eq!(payload.get("age"), Some(&Value::I32(30)));
    }

    #[test]
    fn test_excluded_attribute_is_skipped() {
        let payload = build_partial_update(&user(), &["age"]).unwrap();
        assert_eq!(names(&payload), vec!["id", "name"]);
    }

    #[test]
    fn test_null_value_is_omitted() {
        let mut user = user();
        user.name = None;
        let payload = build_partial_update(&user, &[]).unwrap();
        assert_eq!(names(&payload), vec!["id", "age"]);
    }

    #[test]
    fn test_everything_excluded_gives_empty_payload() {
        let payload = build_partial_update(&user(), &["id", "name", "age"]).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_unknown_and_case_mismatched_exclusions_are_ignored() {
        let payload = build_partial_update(&user(), &["AGE", "nope"]).unwrap();
        assert_eq!(names(&payload), vec!["id", "name", "age"]);
    }

    #[test]
    fn test_transient_never_written_even_when_set() {
        let payload = build_partial_update(&user(), &[]).unwrap();
        assert!(!payload.contains("internal_cache"));
    }

    #[test]
    fn test_accessor_failure_aborts_build() {
        let table = AttributeTable::<User>::builder("User")
            .attribute("id", |u| Ok(Value::from(u.id.clone())))
            .attribute("age", |_| {
                Err(PatchError::new("guard poisoned", ErrorKind::InternalError))
            })
            .build()
            .unwrap();

        let err = build_partial_update_with(&user(), &table, &[]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AccessError);
        assert_eq!(err.attribute(), Some("age"));
        assert_eq!(err.cause().map(|c| c.message()), Some("guard poisoned"));
    }

    #[test]
    fn test_failing_accessor_not_read_when_excluded() {
        let table = AttributeTable::<User>::builder("User")
            .attribute("id", |u| Ok(Value::from(u.id.clone())))
            .attribute("age", |_| Err(PatchError::new("boom", ErrorKind::InternalError)))
            .build()
            .unwrap();

        let payload = build_partial_update_with(&user(), &table, &["age"]).unwrap();
        assert_eq!(names(&payload), vec!["id"]);
    }

    #[test]
    fn test_builder_combines_exclusions() {
        let builder = PartialUpdateBuilder::new().exclude("id");
        let payload = builder.build(&user()).unwrap();
        assert_eq!(names(&payload), vec!["name", "age"]);

        let payload = builder
            .build_excluding(&user(), User::attribute_table(), &["age"])
            .unwrap();
        assert_eq!(names(&payload), vec!["name"]);
    }

    #[test]
    fn test_build_into_sink() {
        let builder = PartialUpdateBuilder::new().exclude_all(&["id"]);
        let mut doc = Document::new();
        builder.build_into(&user(), &mut doc).unwrap();
        assert_eq!(doc.size(), 2);
        assert_eq!(doc.get("name"), Value::from("Ana"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let record = user();
        let first = build_partial_update(&record, &["name"]).unwrap();
        let second = build_partial_update(&record, &["name"]).unwrap();
        assert_eq!(first, second);
        assert_eq!(names(&first), names(&second));
    }
}
