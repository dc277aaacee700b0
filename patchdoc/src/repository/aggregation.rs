use crate::common::PROJECTION_INCLUDE;
use crate::document::Document;
use crate::repository::SortOrder;

/// An ordered aggregation pipeline.
///
/// Each stage is a document such as `{"$match": {...}}`. Stages are passed to
/// the store operations in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    stages: Vec<Document>,
}

impl Aggregation {
    pub fn new() -> Self {
        Aggregation { stages: Vec::new() }
    }

    /// Appends a raw stage document.
    pub fn stage(mut self, stage: Document) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn match_criteria(self, criteria: Document) -> Self {
        self.operator_stage("$match", criteria)
    }

    pub fn project(self, fields: &[&str]) -> Self {
        let projection: Document = fields
            .iter()
            .map(|field| (field.to_string(), PROJECTION_INCLUDE.into()))
            .collect();
        self.operator_stage("$project", projection)
    }

    pub fn group(self, group: Document) -> Self {
        self.operator_stage("$group", group)
    }

    pub fn sort(self, field: &str, order: SortOrder) -> Self {
        let sort: Document = [(field.to_string(), order.as_value())].into_iter().collect();
        self.operator_stage("$sort", sort)
    }

    pub fn skip(self, skip: u64) -> Self {
        let stage: Document = [("$skip".to_string(), skip.into())].into_iter().collect();
        self.stage(stage)
    }

    pub fn limit(self, limit: u64) -> Self {
        let stage: Document = [("$limit".to_string(), limit.into())].into_iter().collect();
        self.stage(stage)
    }

    fn operator_stage(self, operator: &str, body: Document) -> Self {
        let stage: Document = [(operator.to_string(), body.into())].into_iter().collect();
        self.stage(stage)
    }

    pub fn stages(&self) -> &[Document] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::doc;

    #[test]
    fn test_stages_keep_order() {
        let aggregation = Aggregation::new()
            .match_criteria(doc! { "status": "active" })
            .group(doc! { "_id": "$city", "total": { "$sum": 1 } })
            .sort("total", SortOrder::Descending)
            .limit(5);

        let operators: Vec<String> = aggregation
            .stages()
            .iter()
            .map(|stage| stage.fields()[0].clone())
            .collect();
        assert_eq!(operators, vec!["$match", "$group", "$sort", "$limit"]);
        assert_eq!(aggregation.len(), 4);
    }

    #[test]
    fn test_project_stage() {
        let aggregation = Aggregation::new().project(&["name"]);
        let stage = &aggregation.stages()[0];
        let projection = stage.get("$project");
        assert_eq!(
            projection.as_document().unwrap().get("name"),
            Value::I32(1)
        );
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(Aggregation::new().is_empty());
    }
}
