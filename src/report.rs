//! Resolved report: either a bare number or `{Total, options}`.

use crate::numeric::Numeric;
use indexmap::IndexMap;
use serde::Serialize;

/// Final flattened output of resolving an aggregation tree.
///
/// Serializes as the bare number for [`Report::Scalar`] and as
/// `{"Total": n, "options": {...}}` for [`Report::Summary`], with `options`
/// in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Scalar(Numeric),
    Summary(Summary),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Summary {
    #[serde(rename = "Total")]
    pub total: Numeric,
    pub options: IndexMap<String, Report>,
}

impl Report {
    /// The numeric value a parent sums: the scalar itself, or a summary's total.
    pub fn value(&self) -> Numeric {
        match self {
            Report::Scalar(n) => *n,
            Report::Summary(summary) => summary.total,
        }
    }

    pub fn as_summary(&self) -> Option<&Summary> {
        match self {
            Report::Summary(summary) => Some(summary),
            Report::Scalar(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Serializing numbers and string-keyed maps cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<Numeric> for Report {
    fn from(value: Numeric) -> Self {
        Report::Scalar(value)
    }
}

impl Summary {
    /// Build a summary whose total is the sum of its option values.
    pub fn from_options(options: IndexMap<String, Report>) -> Self {
        let total = options.values().map(Report::value).sum();
        Self { total, options }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn get(&self, label: &str) -> Option<&Report> {
        self.options.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_serializes_bare() {
        assert_eq!(Report::Scalar(Numeric::Int(5)).to_json(), json!(5));
    }

    #[test]
    fn test_summary_total_includes_nested_totals() {
        let mut inner = IndexMap::new();
        inner.insert("a".to_string(), Report::Scalar(Numeric::Int(2)));
        inner.insert("b".to_string(), Report::Scalar(Numeric::Int(3)));

        let mut outer = IndexMap::new();
        outer.insert(
            "nested".to_string(),
            Report::Summary(Summary::from_options(inner)),
        );
        outer.insert("flat".to_string(), Report::Scalar(Numeric::Int(1)));

        let summary = Summary::from_options(outer);
        assert_eq!(summary.total, Numeric::Int(6));
        assert_eq!(
            Report::Summary(summary).to_json(),
            json!({
                "Total": 6,
                "options": {"nested": {"Total": 5, "options": {"a": 2, "b": 3}}, "flat": 1}
            })
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = Summary::from_options(IndexMap::new());
        assert_eq!(
            Report::Summary(summary).to_json(),
            json!({"Total": 0, "options": {}})
        );
    }
}
