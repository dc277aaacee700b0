use crate::common::{Convertible, Value, DOC_ID};
use crate::errors::{ErrorKind, PatchError, PatchResult};
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

/// A record type stored in its own collection.
///
/// # Purpose
/// Supplies the metadata a repository needs: the collection name, the name of
/// the id attribute and the current id value of an instance. Implemented by
/// `#[derive(Entity)]`.
///
/// # Usage
/// ```ignore
/// #[derive(Entity, Convertible, Patchable)]
/// #[entity(name = "users", id = "id")]
/// pub struct User {
///     id: Option<String>,
///     name: String,
/// }
/// ```
///
/// Without `name`, the collection is named after the struct. Without `id`, a
/// field named `id` is used.
pub trait Entity: Convertible<Output = Self> + Sized {
    /// Collection the entity is stored in.
    fn entity_name() -> String;

    /// Stored name of the id attribute.
    fn id_attribute() -> &'static str {
        DOC_ID
    }

    /// Current id value of this instance, [Value::Null] if unassigned.
    fn id_value(&self) -> PatchResult<Value>;

    /// Returns `true` if the instance has not been assigned an id yet.
    fn is_new(&self) -> PatchResult<bool> {
        Ok(self.id_value()?.is_null())
    }
}

/// Database and collection a repository operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: &str, collection: &str) -> PatchResult<Self> {
        if database.is_empty() || collection.is_empty() {
            log::error!("Invalid namespace {}.{}", database, collection);
            return Err(PatchError::new(
                "Database and collection names cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        Ok(Namespace {
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Metadata of an [Entity] type, resolved once per type and cached by the
/// repository factory.
pub struct EntityInformation<T> {
    collection_name: String,
    id_attribute: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityInformation<T> {
    pub fn new() -> Self {
        EntityInformation {
            collection_name: T::entity_name(),
            id_attribute: T::id_attribute(),
            _marker: PhantomData,
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn id_attribute(&self) -> &'static str {
        self.id_attribute
    }

    pub fn is_new(&self, entity: &T) -> PatchResult<bool> {
        entity.is_new()
    }

    pub fn id_value(&self, entity: &T) -> PatchResult<Value> {
        entity.id_value()
    }
}

impl<T: Entity> Default for EntityInformation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EntityInformation<T> {
    fn clone(&self) -> Self {
        EntityInformation {
            collection_name: self.collection_name.clone(),
            id_attribute: self.id_attribute,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for EntityInformation<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityInformation")
            .field("collection_name", &self.collection_name)
            .field("id_attribute", &self.id_attribute)
            .finish()
    }
}
