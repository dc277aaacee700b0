use crate::common::{Value, PROJECTION_INCLUDE};
use crate::document::Document;
use crate::errors::PatchResult;

/// Direction of a sort key.
///
/// Rendered as `1` (ascending) or `-1` (descending) in sort documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_value(&self) -> Value {
        match self {
            SortOrder::Ascending => Value::I32(1),
            SortOrder::Descending => Value::I32(-1),
        }
    }
}

/// A find request handed to the store operations: criteria, an optional
/// projection, paging and sort keys.
///
/// The criteria document is passed through as given; nothing here inspects
/// or rewrites it.
///
/// ```rust
/// use patchdoc::doc;
/// use patchdoc::repository::{Query, SortOrder};
///
/// let query = Query::new(doc! { "status": "active" })
///     .sort_by("age", SortOrder::Descending)
///     .skip(20)
///     .limit(10);
///
/// assert_eq!(query.limit_count(), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    criteria: Document,
    projection: Option<Document>,
    skip: Option<u64>,
    limit: Option<u64>,
    sort: Vec<(String, SortOrder)>,
}

impl Query {
    pub fn new(criteria: Document) -> Self {
        Query {
            criteria,
            ..Query::default()
        }
    }

    /// A query matching every document.
    pub fn all() -> Self {
        Query::default()
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Projects the query onto `fields`, replacing any earlier projection.
    ///
    /// An empty field name fails with `InvalidFieldName`.
    pub fn include(mut self, fields: &[&str]) -> PatchResult<Self> {
        let mut projection = Document::with_capacity(fields.len());
        for field in fields {
            projection.put(*field, PROJECTION_INCLUDE)?;
        }
        self.projection = Some(projection);
        Ok(self)
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Appends a sort key. A key already present keeps its position and takes
    /// the new direction.
    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        match self.sort.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = order,
            None => self.sort.push((field.to_string(), order)),
        }
        self
    }

    pub fn criteria(&self) -> &Document {
        &self.criteria
    }

    pub fn projection_document(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn sort_fields(&self) -> &[(String, SortOrder)] {
        &self.sort
    }

    /// Renders the sort keys as a store sort document, e.g. `{"age": -1}`.
    pub fn sort_document(&self) -> Document {
        self.sort
            .iter()
            .map(|(field, order)| (field.clone(), order.as_value()))
            .collect()
    }
}

impl From<Document> for Query {
    fn from(criteria: Document) -> Self {
        Query::new(criteria)
    }
}
