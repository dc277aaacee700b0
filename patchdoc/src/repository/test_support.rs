use crate::common::{Convertible, Value};
use crate::doc;
use crate::document::Document;
use crate::errors::{ErrorKind, PatchError, PatchResult};
use crate::repository::{
    Aggregation, BulkMode, BulkOperation, BulkWriteResult, DeleteResult, DocumentOperations,
    Entity, Namespace, Query, UpdateResult,
};
use crate::update::Update;
use parking_lot::Mutex;

// Setup only one time throughout the crate's unit tests.
#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, PartialEq)]
pub(crate) struct Tag {
    pub(crate) code: String,
}

impl Convertible for Tag {
    type Output = Tag;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::Document(doc! { "code": (self.code.clone()) }))
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        let doc = Document::from_value(value)?;
        Ok(Tag {
            code: String::from_value(&doc.get("code"))?,
        })
    }
}

impl Entity for Tag {
    fn entity_name() -> String {
        "tags".to_string()
    }

    fn id_attribute() -> &'static str {
        "code"
    }

    fn id_value(&self) -> PatchResult<Value> {
        self.code.to_value()
    }
}

/// Serves a fixed list of documents and remembers the last query it saw.
#[derive(Default)]
pub(crate) struct StubOperations {
    pub(crate) documents: Vec<Document>,
    pub(crate) last_query: Mutex<Option<Query>>,
}

impl StubOperations {
    pub(crate) fn with_documents(documents: Vec<Document>) -> Self {
        StubOperations {
            documents,
            ..StubOperations::default()
        }
    }

    fn record(&self, query: &Query) {
        *self.last_query.lock() = Some(query.clone());
    }
}

impl DocumentOperations for StubOperations {
    fn upsert(&self, _: &Namespace, query: &Query, _: &Update) -> PatchResult<UpdateResult> {
        self.record(query);
        Ok(UpdateResult::default())
    }

    fn count(&self, _: &Namespace, query: &Query) -> PatchResult<u64> {
        self.record(query);
        Ok(self.documents.len() as u64)
    }

    fn find_one(&self, _: &Namespace, query: &Query) -> PatchResult<Option<Document>> {
        self.record(query);
        Ok(self.documents.first().cloned())
    }

    fn find(&self, _: &Namespace, query: &Query) -> PatchResult<Vec<Document>> {
        self.record(query);
        Ok(self.documents.clone())
    }

    fn update_first(&self, _: &Namespace, _: &Query, _: &Update) -> PatchResult<UpdateResult> {
        Ok(UpdateResult::default())
    }

    fn update_multi(&self, _: &Namespace, _: &Query, _: &Update) -> PatchResult<UpdateResult> {
        Ok(UpdateResult::default())
    }

    fn remove(&self, _: &Namespace, _: &Query) -> PatchResult<DeleteResult> {
        Ok(DeleteResult {
            deleted: self.documents.len() as u64,
        })
    }

    fn find_and_modify(&self, _: &Namespace, _: &Query, _: &Update) -> PatchResult<Option<Document>> {
        Ok(None)
    }

    fn find_and_remove(&self, _: &Namespace, _: &Query) -> PatchResult<Option<Document>> {
        Ok(self.documents.first().cloned())
    }

    fn find_all_and_remove(&self, _: &Namespace, _: &Query) -> PatchResult<Vec<Document>> {
        Ok(self.documents.clone())
    }

    fn aggregate(&self, _: &Namespace, _: &Aggregation) -> PatchResult<Vec<Document>> {
        Err(PatchError::new("aggregation unsupported", ErrorKind::BackendError))
    }

    fn bulk_write(&self, _: &Namespace, _: BulkMode, _: &[BulkOperation]) -> PatchResult<BulkWriteResult> {
        Ok(BulkWriteResult::default())
    }
}
