use crate::common::Value;
use crate::document::Document;
use crate::errors::{ErrorKind, PatchError, PatchResult};
use crate::repository::{DocumentOperations, Namespace, Query};
use crate::update::Update;
use std::sync::Arc;

/// Whether a bulk write stops at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMode {
    /// Operations run in queue order; the first failure stops the rest.
    Ordered,
    /// Operations may run in any order; failures do not stop the others.
    Unordered,
}

/// One queued write of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    Insert(Document),
    UpdateOne { query: Query, update: Update },
    UpdateMulti { query: Query, update: Update },
    Upsert { query: Query, update: Update },
    Remove(Query),
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkWriteResult {
    pub inserted: u64,
    pub matched: u64,
    pub modified: u64,
    pub deleted: u64,
    pub upserted_ids: Vec<Value>,
}

/// A queue of writes against one collection, sent to the store in a single
/// request.
///
/// Created by
/// [CustomRepository::initialize_ordered_bulk_op](crate::repository::CustomRepository::initialize_ordered_bulk_op)
/// or its unordered counterpart. [execute](Self::execute) consumes the queue,
/// so a bulk request runs at most once.
pub struct BulkOperations<O: DocumentOperations> {
    mode: BulkMode,
    namespace: Namespace,
    operations: Arc<O>,
    queue: Vec<BulkOperation>,
}

impl<O: DocumentOperations> BulkOperations<O> {
    pub(crate) fn new(mode: BulkMode, namespace: Namespace, operations: Arc<O>) -> Self {
        BulkOperations {
            mode,
            namespace,
            operations,
            queue: Vec::new(),
        }
    }

    pub fn insert(&mut self, document: Document) -> &mut Self {
        self.queue.push(BulkOperation::Insert(document));
        self
    }

    pub fn update_one(&mut self, query: Query, update: Update) -> &mut Self {
        self.queue.push(BulkOperation::UpdateOne { query, update });
        self
    }

    pub fn update_multi(&mut self, query: Query, update: Update) -> &mut Self {
        self.queue.push(BulkOperation::UpdateMulti { query, update });
        self
    }

    pub fn upsert(&mut self, query: Query, update: Update) -> &mut Self {
        self.queue.push(BulkOperation::Upsert { query, update });
        self
    }

    pub fn remove(&mut self, query: Query) -> &mut Self {
        self.queue.push(BulkOperation::Remove(query));
        self
    }

    pub fn mode(&self) -> BulkMode {
        self.mode
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn queued(&self) -> &[BulkOperation] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Sends the queued writes to the store.
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidOperation] if nothing was queued; otherwise whatever
    /// the store operations report.
    pub fn execute(self) -> PatchResult<BulkWriteResult> {
        if self.queue.is_empty() {
            log::error!("No bulk operations queued for {}", self.namespace);
            return Err(PatchError::new(
                "Bulk write has no operations",
                ErrorKind::InvalidOperation,
            ));
        }

        log::debug!(
            "Executing {:?} bulk write of {} operations on {}",
            self.mode,
            self.queue.len(),
            self.namespace
        );
        self.operations
            .bulk_write(&self.namespace, self.mode, &self.queue)
    }
}
