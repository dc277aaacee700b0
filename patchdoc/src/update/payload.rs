use crate::common::Value;
use crate::document::Document;
use crate::errors::PatchResult;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};

/// Receives the entries of an [UpdatePayload].
///
/// [Update](crate::update::Update) and [Document] implement it; store clients
/// with their own update type can supply their own implementation.
pub trait UpdateSink {
    fn set(&mut self, name: &str, value: Value) -> PatchResult<()>;
}

/// An ordered mapping from attribute name to value, produced by one partial
/// update build.
///
/// Entries keep declaration order. Once a name is present, later writes for the
/// same name are ignored.
#[derive(Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdatePayload {
    entries: IndexMap<String, Value>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        UpdatePayload {
            entries: IndexMap::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        UpdatePayload {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Appends an entry unless `name` is already present. Returns whether the
    /// entry was added.
    pub(crate) fn insert(&mut self, name: &str, value: Value) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), value);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in payload order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Calls `sink.set` once per entry, in payload order. Stops at the first
    /// error the sink reports.
    pub fn apply_to(&self, sink: &mut dyn UpdateSink) -> PatchResult<()> {
        for (name, value) in self.entries.iter() {
            sink.set(name, value.clone())?;
        }
        Ok(())
    }

    /// Converts the payload into a plain document with the same order.
    pub fn into_document(self) -> Document {
        self.entries.into_iter().collect()
    }
}

impl IntoIterator for UpdatePayload {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Debug for UpdatePayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl Display for UpdatePayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| format!("\"{}\": {}", k, v))
            .join(", ");
        write!(f, "{{{}}}", entries)
    }
}
