use crate::common::{Convertible, Value, PROJECTION_INCLUDE};
use crate::document::Document;
use crate::errors::PatchResult;
use crate::repository::{
    Aggregation, BulkMode, BulkOperations, DocumentOperations, Entity, EntityInformation,
    Namespace, Query, UpdateResult,
};
use crate::update::{build_partial_update, Patchable, Update};
use chrono::SecondsFormat;
use std::sync::Arc;

/// A typed repository over one entity collection.
///
/// Every read and write is delegated to the shared [DocumentOperations] with
/// this repository's [Namespace]; returned documents are decoded into `T`
/// through [Convertible]. On top of the passthroughs it offers the helpers
/// for partial updates ([build_base_update](Self::build_base_update)),
/// projections and bulk writes.
///
/// Repositories are cheap to create; get them from
/// [RepositoryFactory::repository](crate::repository::RepositoryFactory::repository).
pub struct CustomRepository<T: Entity, O: DocumentOperations> {
    information: EntityInformation<T>,
    namespace: Namespace,
    operations: Arc<O>,
}

impl<T: Entity, O: DocumentOperations> CustomRepository<T, O> {
    pub fn new(information: EntityInformation<T>, namespace: Namespace, operations: Arc<O>) -> Self {
        CustomRepository {
            information,
            namespace,
            operations,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn entity_information(&self) -> &EntityInformation<T> {
        &self.information
    }

    pub fn operations(&self) -> &Arc<O> {
        &self.operations
    }

    pub fn initialize_ordered_bulk_op(&self) -> BulkOperations<O> {
        BulkOperations::new(BulkMode::Ordered, self.namespace.clone(), self.operations.clone())
    }

    pub fn initialize_unordered_bulk_op(&self) -> BulkOperations<O> {
        BulkOperations::new(BulkMode::Unordered, self.namespace.clone(), self.operations.clone())
    }

    /// Builds a projection document including each of `fields`, in order.
    pub fn generate_fields_obj(&self, fields: &[&str]) -> PatchResult<Document> {
        let mut projection = Document::with_capacity(fields.len());
        for field in fields {
            projection.put(*field, PROJECTION_INCLUDE)?;
        }
        Ok(projection)
    }

    /// Keeps the criteria of `query` and projects onto the id attribute only.
    ///
    /// Paging and sort keys are not carried over.
    pub fn only_id_query(&self, query: &Query) -> PatchResult<Query> {
        Query::new(query.criteria().clone()).include(&[self.information.id_attribute()])
    }

    pub fn upsert(&self, query: &Query, update: &Update) -> PatchResult<UpdateResult> {
        log::trace!("upsert on {}", self.namespace);
        self.operations.upsert(&self.namespace, query, update)
    }

    pub fn count(&self, query: &Query) -> PatchResult<u64> {
        self.operations.count(&self.namespace, query)
    }

    pub fn exists(&self, query: &Query) -> PatchResult<bool> {
        self.operations.exists(&self.namespace, query)
    }

    pub fn find_one(&self, query: &Query) -> PatchResult<Option<T>> {
        self.operations
            .find_one(&self.namespace, query)?
            .map(decode::<T>)
            .transpose()
    }

    pub fn find_all(&self, query: &Query) -> PatchResult<Vec<T>> {
        decode_all(self.operations.find(&self.namespace, query)?)
    }

    /// Ids of every entity matching `query`, rendered as strings.
    ///
    /// Scalar ids are rendered without quotes and dates as RFC 3339. Documents
    /// without an id, or with a compound one, are skipped.
    pub fn find_all_id(&self, query: &Query) -> PatchResult<Vec<String>> {
        let id_attribute = self.information.id_attribute();
        let documents = self.operations.find(&self.namespace, &self.only_id_query(query)?)?;

        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            match render_id(document.get(id_attribute)) {
                Some(id) => ids.push(id),
                None => {
                    log::warn!(
                        "Document without a scalar {} in {}",
                        id_attribute,
                        self.namespace
                    );
                }
            }
        }
        Ok(ids)
    }

    pub fn update_first(&self, query: &Query, update: &Update) -> PatchResult<UpdateResult> {
        log::trace!("update_first on {}", self.namespace);
        self.operations.update_first(&self.namespace, query, update)
    }

    pub fn update_multi(&self, query: &Query, update: &Update) -> PatchResult<UpdateResult> {
        log::trace!("update_multi on {}", self.namespace);
        self.operations.update_multi(&self.namespace, query, update)
    }

    /// Removes every entity matching `query` and returns how many were removed.
    pub fn remove(&self, query: &Query) -> PatchResult<u64> {
        let result = self.operations.remove(&self.namespace, query)?;
        log::debug!("Removed {} documents from {}", result.deleted, self.namespace);
        Ok(result.deleted)
    }

    pub fn find_and_modify(&self, query: &Query, update: &Update) -> PatchResult<Option<T>> {
        self.operations
            .find_and_modify(&self.namespace, query, update)?
            .map(decode::<T>)
            .transpose()
    }

    pub fn find_and_remove(&self, query: &Query) -> PatchResult<Option<T>> {
        self.operations
            .find_and_remove(&self.namespace, query)?
            .map(decode::<T>)
            .transpose()
    }

    pub fn find_all_and_remove(&self, query: &Query) -> PatchResult<Vec<T>> {
        decode_all(self.operations.find_all_and_remove(&self.namespace, query)?)
    }

    /// Runs `aggregation` over this repository's collection and decodes each
    /// result document as `R`.
    pub fn aggregate<R>(&self, aggregation: &Aggregation) -> PatchResult<Vec<R>>
    where
        R: Convertible<Output = R>,
    {
        decode_all(self.operations.aggregate(&self.namespace, aggregation)?)
    }

    /// Runs `aggregation` over another collection of the same database.
    pub fn aggregate_from<R>(&self, collection: &str, aggregation: &Aggregation) -> PatchResult<Vec<R>>
    where
        R: Convertible<Output = R>,
    {
        let namespace = Namespace::new(&self.namespace.database, collection)?;
        decode_all(self.operations.aggregate(&namespace, aggregation)?)
    }
}

impl<T: Entity + Patchable, O: DocumentOperations> CustomRepository<T, O> {
    /// Builds an [Update] that sets every persistable, non-null attribute of
    /// `entity` not named in `exclude`.
    pub fn build_base_update(&self, entity: &T, exclude: &[&str]) -> PatchResult<Update> {
        let payload = build_partial_update(entity, exclude)?;
        Update::from_payload(&payload)
    }
}

fn render_id(id: Value) -> Option<String> {
    match id {
        Value::String(id) => Some(id),
        Value::Char(c) => Some(c.to_string()),
        Value::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Null | Value::Document(_) | Value::Array(_) | Value::Bytes(_) => None,
        scalar => Some(scalar.to_string()),
    }
}

fn decode<T: Convertible<Output = T>>(document: Document) -> PatchResult<T> {
    T::from_value(&Value::Document(document))
}

fn decode_all<T: Convertible<Output = T>>(documents: Vec<Document>) -> PatchResult<Vec<T>> {
    documents.into_iter().map(decode::<T>).collect()
}
