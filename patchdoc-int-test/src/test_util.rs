use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use patchdoc::common::{Value, DOC_ID};
use patchdoc::document::Document;
use patchdoc::errors::{ErrorKind, PatchError, PatchResult};
use patchdoc::repository::{
    Aggregation, BulkMode, BulkOperation, BulkWriteResult, DeleteResult, DocumentOperations,
    Namespace, Query, RepositoryFactory, SortOrder, UpdateResult,
};
use patchdoc::repository_config::RepositoryConfig;
use patchdoc::update::Update;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Runs a test between a setup and a teardown step.
///
/// The teardown runs even when the test body fails. A failure in any step
/// panics with the step name and the error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> PatchResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> PatchResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> PatchResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| match before() {
        Ok(ctx) => match test(ctx.clone()) {
            Ok(_) => after(ctx).map_err(|e| format!("After run failed: {:?}", e)),
            Err(e) => {
                let _ = after(ctx);
                Err(format!("Test failed: {:?}", e))
            }
        },
        Err(e) => Err(format!("Before run failed: {:?}", e)),
    });

    let elapsed = start_time.elapsed();
    match result {
        Ok(Ok(_)) => log::debug!("Test passed in {:?}", elapsed),
        Ok(Err(e)) => panic!("{} (took {:?})", e, elapsed),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            panic!("Test panicked: {} (took {:?})", err_msg, elapsed);
        }
    }
}

#[derive(Clone)]
pub struct TestContext {
    database: String,
    operations: Arc<RecordingOperations>,
    factory: RepositoryFactory<RecordingOperations>,
}

impl TestContext {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn operations(&self) -> Arc<RecordingOperations> {
        self.operations.clone()
    }

    pub fn factory(&self) -> RepositoryFactory<RecordingOperations> {
        self.factory.clone()
    }
}

/// A database name nobody else uses.
pub fn random_database() -> String {
    format!("test_{}", uuid::Uuid::new_v4().simple())
}

pub fn create_test_context() -> PatchResult<TestContext> {
    let database = random_database();
    let config = RepositoryConfig::builder().database_name(&database).build()?;
    let operations = Arc::new(RecordingOperations::new());
    let factory = RepositoryFactory::new(config, operations.clone())?;

    Ok(TestContext {
        database,
        operations,
        factory,
    })
}

pub fn cleanup(ctx: TestContext) -> PatchResult<()> {
    ctx.operations.clear();
    Ok(())
}

/// A call received by [RecordingOperations].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub namespace: String,
    pub query: Option<Query>,
    pub update: Option<Update>,
}

/// An in-memory [DocumentOperations] that records every call.
///
/// Criteria match on top-level field equality. Only `$match`, `$skip` and
/// `$limit` aggregation stages are understood.
#[derive(Default)]
pub struct RecordingOperations {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    calls: Mutex<Vec<RecordedCall>>,
    failure: Mutex<Option<String>>,
}

impl RecordingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `documents` directly, bypassing the call log.
    pub fn seed(&self, namespace: &Namespace, documents: Vec<Document>) {
        let mut collections = self.collections.lock();
        collections
            .entry(namespace.to_string())
            .or_default()
            .extend(documents);
    }

    pub fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        let collections = self.collections.lock();
        collections
            .get(&namespace.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    /// Makes the next call fail with a backend error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn clear(&self) {
        self.collections.lock().clear();
        self.calls.lock().clear();
        self.failure.lock().take();
    }

    fn record(
        &self,
        operation: &'static str,
        namespace: &Namespace,
        query: Option<&Query>,
        update: Option<&Update>,
    ) -> PatchResult<()> {
        self.calls.lock().push(RecordedCall {
            operation,
            namespace: namespace.to_string(),
            query: query.cloned(),
            update: update.cloned(),
        });

        match self.failure.lock().take() {
            Some(message) => Err(PatchError::new(&message, ErrorKind::BackendError)),
            None => Ok(()),
        }
    }

    fn with_collection<R>(&self, namespace: &Namespace, f: impl FnOnce(&mut Vec<Document>) -> R) -> R {
        let mut collections = self.collections.lock();
        f(collections.entry(namespace.to_string()).or_default())
    }

    fn select(&self, namespace: &Namespace, query: &Query) -> Vec<Document> {
        let mut found: Vec<Document> = self.with_collection(namespace, |documents| {
            documents
                .iter()
                .filter(|doc| matches(doc, query.criteria()))
                .cloned()
                .collect()
        });

        if !query.sort_fields().is_empty() {
            found.sort_by(|a, b| compare_documents(a, b, query.sort_fields()));
        }

        let skip = query.skip_count().unwrap_or(0) as usize;
        let limit = query.limit_count().map(|l| l as usize).unwrap_or(usize::MAX);
        found
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| project(doc, query.projection_document()))
            .collect()
    }

    fn update_matching(
        &self,
        namespace: &Namespace,
        query: &Query,
        update: &Update,
        multi: bool,
        upsert: bool,
    ) -> PatchResult<UpdateResult> {
        self.with_collection(namespace, |documents| -> PatchResult<UpdateResult> {
            let mut result = UpdateResult::default();
            for doc in documents.iter_mut().filter(|doc| matches(doc, query.criteria())) {
                result.matched += 1;
                if apply(doc, update)? {
                    result.modified += 1;
                }
                if !multi {
                    break;
                }
            }

            if result.matched == 0 && upsert {
                let mut created = query.criteria().clone();
                apply(&mut created, update)?;
                if !created.contains_key(DOC_ID) {
                    created.put(DOC_ID, uuid::Uuid::new_v4().to_string())?;
                }
                result.upserted_id = Some(created.get(DOC_ID));
                documents.push(created);
            }
            Ok(result)
        })
    }

    fn remove_matching(&self, namespace: &Namespace, query: &Query, first_only: bool) -> Vec<Document> {
        self.with_collection(namespace, |documents| {
            let mut removed = Vec::new();
            let mut kept = Vec::with_capacity(documents.len());
            for doc in documents.drain(..) {
                if matches(&doc, query.criteria()) && !(first_only && !removed.is_empty()) {
                    removed.push(doc);
                } else {
                    kept.push(doc);
                }
            }
            *documents = kept;
            removed
        })
    }

    fn write_one(&self, namespace: &Namespace, operation: &BulkOperation, result: &mut BulkWriteResult) -> PatchResult<()> {
        match operation {
            BulkOperation::Insert(document) => {
                self.with_collection(namespace, |documents| documents.push(document.clone()));
                result.inserted += 1;
            }
            BulkOperation::UpdateOne { query, update } => {
                let outcome = self.update_matching(namespace, query, update, false, false)?;
                result.matched += outcome.matched;
                result.modified += outcome.modified;
            }
            BulkOperation::UpdateMulti { query, update } => {
                let outcome = self.update_matching(namespace, query, update, true, false)?;
                result.matched += outcome.matched;
                result.modified += outcome.modified;
            }
            BulkOperation::Upsert { query, update } => {
                let outcome = self.update_matching(namespace, query, update, false, true)?;
                result.matched += outcome.matched;
                result.modified += outcome.modified;
                result.upserted_ids.extend(outcome.upserted_id);
            }
            BulkOperation::Remove(query) => {
                result.deleted += self.remove_matching(namespace, query, false).len() as u64;
            }
        }
        Ok(())
    }
}

impl DocumentOperations for RecordingOperations {
    fn upsert(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<UpdateResult> {
        self.record("upsert", namespace, Some(query), Some(update))?;
        self.update_matching(namespace, query, update, false, true)
    }

    fn count(&self, namespace: &Namespace, query: &Query) -> PatchResult<u64> {
        self.record("count", namespace, Some(query), None)?;
        Ok(self.select(namespace, query).len() as u64)
    }

    fn find_one(&self, namespace: &Namespace, query: &Query) -> PatchResult<Option<Document>> {
        self.record("find_one", namespace, Some(query), None)?;
        Ok(self.select(namespace, query).into_iter().next())
    }

    fn find(&self, namespace: &Namespace, query: &Query) -> PatchResult<Vec<Document>> {
        self.record("find", namespace, Some(query), None)?;
        Ok(self.select(namespace, query))
    }

    fn update_first(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<UpdateResult> {
        self.record("update_first", namespace, Some(query), Some(update))?;
        self.update_matching(namespace, query, update, false, false)
    }

    fn update_multi(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<UpdateResult> {
        self.record("update_multi", namespace, Some(query), Some(update))?;
        self.update_matching(namespace, query, update, true, false)
    }

    fn remove(&self, namespace: &Namespace, query: &Query) -> PatchResult<DeleteResult> {
        self.record("remove", namespace, Some(query), None)?;
        let removed = self.remove_matching(namespace, query, false);
        Ok(DeleteResult {
            deleted: removed.len() as u64,
        })
    }

    fn find_and_modify(&self, namespace: &Namespace, query: &Query, update: &Update) -> PatchResult<Option<Document>> {
        self.record("find_and_modify", namespace, Some(query), Some(update))?;
        let before = self
            .with_collection(namespace, |documents| {
                documents.iter().find(|doc| matches(doc, query.criteria())).cloned()
            });
        if before.is_some() {
            self.update_matching(namespace, query, update, false, false)?;
        }
        Ok(before)
    }

    fn find_and_remove(&self, namespace: &Namespace, query: &Query) -> PatchResult<Option<Document>> {
        self.record("find_and_remove", namespace, Some(query), None)?;
        Ok(self.remove_matching(namespace, query, true).into_iter().next())
    }

    fn find_all_and_remove(&self, namespace: &Namespace, query: &Query) -> PatchResult<Vec<Document>> {
        self.record("find_all_and_remove", namespace, Some(query), None)?;
        Ok(self.remove_matching(namespace, query, false))
    }

    fn aggregate(&self, namespace: &Namespace, aggregation: &Aggregation) -> PatchResult<Vec<Document>> {
        self.record("aggregate", namespace, None, None)?;
        let mut documents = self.select(namespace, &Query::all());

        for stage in aggregation.stages() {
            let Some((operator, body)) = stage.iter().next() else {
                continue;
            };
            match operator.as_str() {
                "$match" => {
                    let criteria = body.as_document().cloned().unwrap_or_default();
                    documents.retain(|doc| matches(doc, &criteria));
                }
                "$skip" => {
                    let skip = body.as_integer().unwrap_or(0) as usize;
                    documents = documents.into_iter().skip(skip).collect();
                }
                "$limit" => {
                    let limit = body.as_integer().unwrap_or(0) as usize;
                    documents.truncate(limit);
                }
                other => {
                    return Err(PatchError::new(
                        &format!("Unsupported aggregation stage {}", other),
                        ErrorKind::BackendError,
                    ));
                }
            }
        }
        Ok(documents)
    }

    fn bulk_write(
        &self,
        namespace: &Namespace,
        mode: BulkMode,
        operations: &[BulkOperation],
    ) -> PatchResult<BulkWriteResult> {
        self.record("bulk_write", namespace, None, None)?;
        let mut result = BulkWriteResult::default();
        for operation in operations {
            if let Err(e) = self.write_one(namespace, operation, &mut result) {
                if mode == BulkMode::Ordered {
                    return Err(e);
                }
                log::warn!("Bulk operation failed, continuing: {}", e);
            }
        }
        Ok(result)
    }
}

fn matches(document: &Document, criteria: &Document) -> bool {
    criteria
        .iter()
        .all(|(field, expected)| document.get(field) == *expected)
}

fn project(document: Document, projection: Option<&Document>) -> Document {
    match projection {
        None => document,
        Some(projection) => document
            .into_iter()
            .filter(|(field, _)| field == DOC_ID || projection.contains_key(field))
            .collect(),
    }
}

/// Applies `update` to `document` and reports whether anything changed.
fn apply(document: &mut Document, update: &Update) -> PatchResult<bool> {
    let before = document.clone();

    for (field, value) in update.set_fields().iter() {
        document.put(field.as_str(), value.clone())?;
    }
    for (field, _) in update.unset_fields().iter() {
        document.remove(field);
    }
    for (field, amount) in update.inc_fields().iter() {
        let current = document.get(field);
        let next = match (current.as_integer(), amount.as_integer()) {
            (Some(a), Some(b)) => Value::I64((a + b) as i64),
            (None, Some(b)) if current.is_null() => Value::I64(b as i64),
            _ => {
                let a = current.as_decimal().or(current.as_integer().map(|v| v as f64)).unwrap_or(0.0);
                let b = amount.as_decimal().unwrap_or(0.0);
                Value::F64(a + b)
            }
        };
        document.put(field.as_str(), next)?;
    }

    Ok(*document != before)
}

fn compare_documents(a: &Document, b: &Document, sort: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort {
        let ordering = compare_values(&a.get(field), &b.get(field));
        let ordering = match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_integer(), b.as_integer()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_string(), b.as_string()) {
        return x.cmp(y);
    }
    if let (Some(x), Some(y)) = (a.as_date_time(), b.as_date_time()) {
        return x.cmp(y);
    }
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    // nulls first
    a.is_null().cmp(&b.is_null()).reverse()
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_decimal().or(value.as_integer().map(|v| v as f64))
}

/// A fixed instant with millisecond precision.
pub fn sample_instant() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap_or_default()
}
