//! Declarative aggregation trees loaded from YAML or JSON.
//!
//! ```yaml
//! kind: nested
//! path: parentField
//! multi:
//!   Value1:
//!     kind: filter
//!     query: { term: { parentField.value: Value1 } }
//!   Value2:
//!     kind: filter
//!     query: { term: { parentField.value: Value2 } }
//! ```

use crate::agg::{AggBuilder, AggNode};
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters of one aggregation, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggSpec {
    Filter {
        query: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Filters {
        filters: IndexMap<String, Value>,
    },
    Terms {
        field: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        options: Map<String, Value>,
    },
    DateHistogram {
        field: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        options: Map<String, Value>,
    },
    Range {
        field: String,
        ranges: Vec<Value>,
    },
    Sum {
        field: String,
    },
    Nested {
        path: String,
    },
    ReverseNested,
}

/// One aggregation plus either child definitions or a labeled multi-branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggDefinition {
    #[serde(flatten)]
    pub spec: AggSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggs: Vec<AggDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<IndexMap<String, AggDefinition>>,
}

impl AggDefinition {
    pub fn leaf(spec: AggSpec) -> Self {
        Self {
            spec,
            aggs: Vec::new(),
            multi: None,
        }
    }

    /// Build the node tree through `builder`, so its registry decides every
    /// node's strategy.
    pub fn build(&self, builder: &AggBuilder) -> Result<AggNode> {
        let node = match &self.spec {
            AggSpec::Filter { query, label } => builder.filter(query.clone(), label.as_deref()),
            AggSpec::Filters { filters } => builder.filters(filters.clone()),
            AggSpec::Terms { field, options } => builder.terms(field, options.clone()),
            AggSpec::DateHistogram { field, options } => {
                builder.date_histogram(field, options.clone())
            }
            AggSpec::Range { field, ranges } => builder.range(field, ranges.clone()),
            AggSpec::Sum { field } => builder.sum(field),
            AggSpec::Nested { path } => builder.nested(path),
            AggSpec::ReverseNested => builder.reverse_nested(),
        };

        let children = build_all(&self.aggs, builder)?;
        let node = node.with_children(children)?;

        match &self.multi {
            Some(branches) => {
                let branches = branches
                    .iter()
                    .map(|(label, definition)| Ok((label.clone(), definition.build(builder)?)))
                    .collect::<Result<Vec<_>>>()?;
                node.with_multi(builder.multi(branches)?)
            }
            None => Ok(node),
        }
    }
}

fn build_all(definitions: &[AggDefinition], builder: &AggBuilder) -> Result<Vec<AggNode>> {
    definitions
        .iter()
        .map(|definition| definition.build(builder))
        .collect()
}

/// A definition file: one aggregation, or a list grouped under a root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionDocument {
    Single(AggDefinition),
    Many(Vec<AggDefinition>),
}

impl DefinitionDocument {
    pub fn build(&self, builder: &AggBuilder) -> Result<AggNode> {
        match self {
            DefinitionDocument::Single(definition) => definition.build(builder),
            DefinitionDocument::Many(definitions) => {
                builder.root().with_children(build_all(definitions, builder)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AggError;
    use serde_json::json;

    #[test]
    fn test_yaml_multi_keeps_document_order() {
        let yaml = r#"
kind: nested
path: parentField
multi:
  Value2:
    kind: filter
    query: { term: { parentField.value: Value2 } }
  Value1:
    kind: filter
    query: { term: { parentField.value: Value1 } }
"#;
        let document: DefinitionDocument = serde_yaml::from_str(yaml).unwrap();
        let node = document.build(&AggBuilder::new()).unwrap();
        assert_eq!(
            node.compile_query(),
            json!({
                "parentField_nested_agg": {
                    "nested": {"path": "parentField"},
                    "aggs": {
                        "0_filter_agg": {"filter": {"term": {"parentField.value": "Value2"}}},
                        "1_filter_agg": {"filter": {"term": {"parentField.value": "Value1"}}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_list_becomes_root() {
        let json_text = r#"[
            {"kind": "sum", "field": "amount"},
            {"kind": "terms", "field": "tag", "options": {"size": 5}}
        ]"#;
        let document: DefinitionDocument = serde_json::from_str(json_text).unwrap();
        let node = document.build(&AggBuilder::new()).unwrap();
        assert!(node.is_root());
        assert_eq!(
            node.compile_query(),
            json!({
                "amount_sum_agg": {"sum": {"field": "amount"}},
                "tag_terms_agg": {"terms": {"field": "tag", "size": 5}}
            })
        );
    }

    #[test]
    fn test_duplicate_children_fail_on_build() {
        let document: DefinitionDocument = serde_json::from_value(json!({
            "kind": "nested",
            "path": "p",
            "aggs": [
                {"kind": "reverse_nested"},
                {"kind": "reverse_nested"}
            ]
        }))
        .unwrap();
        assert_eq!(
            document.build(&AggBuilder::new()).unwrap_err(),
            AggError::DuplicateAggregationName {
                name: "reverse_nested_agg".to_string()
            }
        );
    }
}
