//! Factory calls for each aggregation kind.
//!
//! Compiled names are derived from the target field and kind
//! (`"<field>_terms_agg"`, `"<path>_nested_agg"`, ...). The strategy bound to
//! each node comes from the builder's [`StrategyRegistry`].

use super::multi::MultiBranch;
use super::node::AggNode;
use super::registry::{AggKind, StrategyRegistry};
use super::strategy::{KeySource, StrategyOptions};
use crate::error::Result;
use serde_json::{Map, Value, json};

pub const SUM_LABEL: &str = "Sum";
pub const SUM_VALUE_FIELD: &str = "value";

#[derive(Debug, Clone, Default)]
pub struct AggBuilder {
    registry: StrategyRegistry,
}

impl AggBuilder {
    /// Builder using the default strategy of every kind.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    fn node(&self, kind: AggKind, name: String, body: Value, options: StrategyOptions) -> AggNode {
        AggNode::new(name, body, self.registry.strategy_for(kind), options).with_kind(kind)
    }

    fn keyed_options(&self) -> StrategyOptions {
        StrategyOptions::default().with_label_case(self.registry.label_case())
    }

    /// Count of documents matching `query`, labeled with `filter_key` when
    /// given and passed through as a bare number otherwise.
    pub fn filter(&self, query: Value, filter_key: Option<&str>) -> AggNode {
        let options = match filter_key {
            Some(key) if !key.is_empty() => StrategyOptions::default().with_label(key),
            _ => StrategyOptions::default(),
        };
        self.node(
            AggKind::Filter,
            "filter_agg".to_string(),
            json!({ "filter": query }),
            options,
        )
    }

    /// One keyed bucket per labeled query.
    pub fn filters<L: Into<String>>(
        &self,
        queries: impl IntoIterator<Item = (L, Value)>,
    ) -> AggNode {
        let filters: Map<String, Value> = queries
            .into_iter()
            .map(|(label, query)| (label.into(), query))
            .collect();
        self.node(
            AggKind::Filters,
            "filters_agg".to_string(),
            json!({ "filters": { "filters": filters } }),
            self.keyed_options(),
        )
    }

    /// Terms buckets over `field`. `field` overrides any `field` member
    /// already present in `options`.
    pub fn terms(&self, field: &str, mut options: Map<String, Value>) -> AggNode {
        options.insert("field".to_string(), Value::String(field.to_string()));
        self.node(
            AggKind::Terms,
            format!("{field}_terms_agg"),
            json!({ "terms": options }),
            self.keyed_options(),
        )
    }

    /// Date histogram over `field`, labeled by each bucket's `key_as_string`.
    pub fn date_histogram(&self, field: &str, mut options: Map<String, Value>) -> AggNode {
        options.insert("field".to_string(), Value::String(field.to_string()));
        self.node(
            AggKind::DateHistogram,
            format!("{field}_date_histogram_agg"),
            json!({ "date_histogram": options }),
            StrategyOptions::default().with_key_source(KeySource::KeyAsString),
        )
    }

    pub fn range(&self, field: &str, ranges: Vec<Value>) -> AggNode {
        self.node(
            AggKind::Range,
            format!("{field}_range_agg"),
            json!({ "range": { "field": field, "ranges": ranges } }),
            self.keyed_options(),
        )
    }

    /// Sum of `field`, reported as `{Total, options: {Sum: n}}`.
    pub fn sum(&self, field: &str) -> AggNode {
        self.node(
            AggKind::Sum,
            format!("{field}_sum_agg"),
            json!({ "sum": { "field": field } }),
            StrategyOptions::default()
                .with_label(SUM_LABEL)
                .with_value_field(SUM_VALUE_FIELD),
        )
    }

    /// Step into the nested documents at `path`. Unlabeled, so a nested node
    /// with one child reports that child's result unchanged.
    pub fn nested(&self, path: &str) -> AggNode {
        self.node(
            AggKind::Nested,
            format!("{path}_nested_agg"),
            json!({ "nested": { "path": path } }),
            StrategyOptions::default(),
        )
    }

    /// Step back out to the parent documents.
    pub fn reverse_nested(&self) -> AggNode {
        self.node(
            AggKind::ReverseNested,
            "reverse_nested_agg".to_string(),
            json!({ "reverse_nested": {} }),
            StrategyOptions::default(),
        )
    }

    pub fn multi<L: Into<String>>(
        &self,
        branches: impl IntoIterator<Item = (L, AggNode)>,
    ) -> Result<MultiBranch> {
        MultiBranch::new(branches)
    }

    pub fn root(&self) -> AggNode {
        AggNode::root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg::strategy::LabelCase;

    #[test]
    fn test_names_derive_from_field_and_kind() {
        let builder = AggBuilder::new();
        assert_eq!(builder.terms("tags", Map::new()).name(), "tags_terms_agg");
        assert_eq!(
            builder.date_histogram("when", Map::new()).name(),
            "when_date_histogram_agg"
        );
        assert_eq!(builder.range("age", Vec::new()).name(), "age_range_agg");
        assert_eq!(builder.sum("amount").name(), "amount_sum_agg");
        assert_eq!(builder.nested("people").name(), "people_nested_agg");
        assert_eq!(builder.reverse_nested().name(), "reverse_nested_agg");
        assert_eq!(builder.filter(json!({}), None).name(), "filter_agg");
        assert_eq!(
            builder.filters(Vec::<(String, Value)>::new()).name(),
            "filters_agg"
        );
    }

    #[test]
    fn test_terms_field_overrides_options() {
        let mut options = Map::new();
        options.insert("field".to_string(), json!("other"));
        options.insert("size".to_string(), json!(10));
        let node = AggBuilder::new().terms("tags", options);
        assert_eq!(
            node.compile_query(),
            json!({"tags_terms_agg": {"terms": {"field": "tags", "size": 10}}})
        );
    }

    #[test]
    fn test_empty_filter_key_is_unlabeled() {
        let node = AggBuilder::new().filter(json!({}), Some(""));
        assert_eq!(node.options().label, None);
    }

    #[test]
    fn test_registry_label_case_reaches_key_labels_only() {
        let registry = StrategyRegistry::new().with_label_case(LabelCase::TitleCase);
        let builder = AggBuilder::with_registry(registry);
        assert_eq!(
            builder.terms("t", Map::new()).options().label_case,
            LabelCase::TitleCase
        );
        assert_eq!(
            builder.date_histogram("d", Map::new()).options().label_case,
            LabelCase::Verbatim
        );
        assert_eq!(builder.sum("s").options().label_case, LabelCase::Verbatim);
    }

    #[test]
    fn test_kinds_recorded() {
        let builder = AggBuilder::new();
        assert_eq!(builder.sum("s").kind(), Some(AggKind::Sum));
        assert_eq!(builder.root().kind(), None);
    }
}
