use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::common::Value;
use crate::errors::{ErrorKind, PatchError, PatchResult};
use crate::update::UpdateSink;
use std::borrow::Cow;
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// An insertion-ordered document of `String` keys and [Value]s.
///
/// Keys are stored verbatim; a dotted key such as `"address.city"` is a single
/// field name as far as the document is concerned, which is how update
/// documents address embedded fields.
///
/// Iteration order is the order in which keys were first inserted. Replacing
/// the value of an existing key keeps its position; removing a key shifts the
/// keys after it.
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Creates an empty document with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Document {
            data: IndexMap::with_capacity(capacity),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Associates the specified [Value] with the specified key in this document.
    ///
    /// If the key already exists its value is replaced in place.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidFieldName] if the key is empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice")?;
    /// doc.put("age", 30)?;
    /// assert_eq!(doc.size(), 2);
    /// ```
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> PatchResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(PatchError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        self.data.insert(key.into_owned(), value.into());
        Ok(())
    }

    /// Returns the [Value] associated with `key`, or [Value::Null] if the
    /// document has no such key.
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get_ref(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Removes `key` and returns its value. Later keys keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Returns the number of top-level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Checks if a top level key exists in the document.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the top-level field names in insertion order.
    pub fn fields(&self) -> FieldVec {
        self.data.keys().cloned().collect()
    }

    /// Merges `other` into this document.
    ///
    /// Embedded documents present on both sides are merged recursively;
    /// every other value from `other` overwrites the existing one.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    existing.merge(incoming);
                }
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let entries = self
            .data
            .iter()
            .map(|(key, value)| {
                format!("{}\"{}\": {}", indent_str, key, value.to_pretty_json(indent + 2))
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", entries, " ".repeat(indent))
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let entries = self
            .data
            .iter()
            .map(|(key, value)| {
                format!("{}\"{}\": {}", indent_str, key, value.to_debug_string(indent + 2))
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", entries, " ".repeat(indent))
    }
}

impl UpdateSink for Document {
    fn set(&mut self, name: &str, value: Value) -> PatchResult<()> {
        self.put(name, value)
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use patchdoc::doc;
///
/// let empty = doc!{};
///
/// let user = doc!{
///     "name": "Alice",
///     "age": 30,
///     "address": { "city": "Lisbon" },
///     "tags": ["admin", "user"]
/// };
/// assert_eq!(user.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::document::Document::new()
    };

    () => {
        $crate::document::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::document::Document::new();
            $(
                doc.put($crate::document::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut doc = Document::new();
        doc.put("name", "Alice").unwrap();
        doc.put("age", 30).unwrap();

        assert_eq!(doc.get("name"), Value::from("Alice"));
        assert_eq!(doc.get("age"), Value::I32(30));
        assert_eq!(doc.get("missing"), Value::Null);
        assert_eq!(doc.size(), 2);
    }

    #[test]
    fn test_put_rejects_empty_key() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let doc = doc! { "zeta": 1, "alpha": 2, "mid": 3 };
        let fields: Vec<String> = doc.fields().into_iter().collect();
        assert_eq!(fields, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_replacing_keeps_position() {
        let mut doc = doc! { "a": 1, "b": 2 };
        doc.put("a", 10).unwrap();
        let keys: Vec<&String> = doc.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(doc.get("a"), Value::I32(10));
    }

    #[test]
    fn test_remove_shifts_order() {
        let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
        assert_eq!(doc.remove("b"), Some(Value::I32(2)));
        assert_eq!(doc.remove("b"), None);
        let fields: Vec<String> = doc.fields().into_iter().collect();
        assert_eq!(fields, vec!["a", "c"]);
    }

    #[test]
    fn test_dotted_keys_are_verbatim() {
        let mut doc = Document::new();
        doc.put("address.city", "Lisbon").unwrap();
        assert!(doc.contains_key("address.city"));
        assert!(!doc.contains_key("address"));
    }

    #[test]
    fn test_merge_recurses_into_documents() {
        let mut left = doc! { "user": { "name": "Alice", "age": 30 }, "active": true };
        let right = doc! { "user": { "email": "a@x.io" }, "active": false };
        left.merge(&right);

        let user = left.get("user");
        let user = user.as_document().unwrap();
        assert_eq!(user.get("name"), Value::from("Alice"));
        assert_eq!(user.get("email"), Value::from("a@x.io"));
        assert_eq!(left.get("active"), Value::Bool(false));
    }

    #[test]
    fn test_doc_macro_nested_values() {
        let doc = doc! {
            "tags": ["a", "b"],
            "meta": { "level": 2 },
        };
        assert_eq!(
            doc.get("tags"),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
        assert!(doc.get("meta").is_document());
    }

    #[test]
    fn test_sink_set_writes_field() {
        let mut doc = Document::new();
        UpdateSink::set(&mut doc, "name", Value::from("Ana")).unwrap();
        assert_eq!(doc.get("name"), Value::from("Ana"));
    }

    #[test]
    fn test_display_and_debug() {
        let doc = doc! { "n": 1 };
        assert_eq!(doc.to_string(), "{\n  \"n\": 1\n}");
        assert_eq!(format!("{:?}", doc), "{\n  \"n\": i32(1)\n}");
        assert_eq!(Document::new().to_string(), "{}");
    }
}
