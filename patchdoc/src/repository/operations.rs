use crate::common::Value;
use crate::document::Document;
use crate::errors::PatchResult;
use crate::repository::{Aggregation, BulkMode, BulkOperation, BulkWriteResult, Namespace, Query};
use crate::update::Update;

/// Outcome of an update or upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
    /// Id of the document created by an upsert, if one was created.
    pub upserted_id: Option<Value>,
}

/// Outcome of a remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// The document-store operations a repository delegates to.
///
/// # Purpose
/// This is the seam between the repository layer and a concrete store
/// client. The client owns connections, pooling, retries and transport; the
/// repository only builds requests and decodes the documents it gets back.
///
/// # Characteristics
/// - Shared between repositories through an `Arc`, so it must be `Send + Sync`
/// - Every call names its target collection through a [Namespace]
/// - Documents come back as [Document]s; decoding is the repository's job
///
/// # Errors
/// Implementations should report store failures as
/// [ErrorKind::BackendError](crate::errors::ErrorKind::BackendError).
pub trait DocumentOperations: Send + Sync {
    fn upsert(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<UpdateResult>;

    fn count(&self, namespace: &Namespace, query: &Query) -> PatchResult<u64>;

    fn exists(&self, namespace: &Namespace, query: &Query) -> PatchResult<bool> {
        Ok(self.count(namespace, query)? > 0)
    }

    fn find_one(&self, namespace: &Namespace, query: &Query) -> PatchResult<Option<Document>>;

    fn find(&self, namespace: &Namespace, query: &Query) -> PatchResult<Vec<Document>>;

    fn update_first(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<UpdateResult>;

    fn update_multi(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<UpdateResult>;

    fn remove(&self, namespace: &Namespace, query: &Query) -> PatchResult<DeleteResult>;

    /// Applies `update` to the first match and returns the document as it was
    /// before the update.
    fn find_and_modify(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<Option<Document>>;

    fn find_and_remove(&self, namespace: &Namespace, query: &Query) -> PatchResult<Option<Document>>;

    fn find_all_and_remove(&self, namespace: &Namespace, query: &Query) -> PatchResult<Vec<Document>>;

    fn aggregate(&self, namespace: &Namespace, aggregation: &Aggregation) -> PatchResult<Vec<Document>>;

    fn bulk_write(
        &self,
        namespace: &Namespace,
        mode: BulkMode,
        operations: &[BulkOperation],
    ) -> PatchResult<BulkWriteResult>;
}
