//! Extraction strategies: pure mappings from a named slice of a raw response
//! to an ordered sequence of [`ResultEntry`].
//!
//! Every strategy receives the aggregation name it is bound to and its
//! options as explicit arguments; nothing is captured at construction.

use super::entry::ResultEntry;
use crate::error::{AggError, Result};
use crate::numeric::Numeric;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum::{Display, EnumString};

pub const DOC_COUNT: &str = "doc_count";
pub const BUCKETS: &str = "buckets";

/// Text transform applied to labels read from bucket keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LabelCase {
    /// Keys are used exactly as the engine returned them
    #[default]
    Verbatim,
    /// First character of every whitespace-separated word is upper-cased
    /// when it is an ASCII letter; all other characters pass through
    TitleCase,
}

impl LabelCase {
    pub fn apply(&self, label: String) -> String {
        match self {
            LabelCase::Verbatim => label,
            LabelCase::TitleCase => title_case(&label),
        }
    }
}

/// Upper-case the first character of each word. Word boundaries are ASCII
/// whitespace. Only ASCII letters change, so the output has the same length
/// as the input.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for ch in text.chars() {
        out.push(if word_start {
            ch.to_ascii_uppercase()
        } else {
            ch
        });
        word_start = matches!(ch, ' ' | '\t' | '\r' | '\n' | '\u{0B}' | '\u{0C}');
    }
    out
}

/// Which bucket member supplies the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    #[default]
    Key,
    KeyAsString,
}

impl KeySource {
    pub fn field(&self) -> &'static str {
        match self {
            KeySource::Key => "key",
            KeySource::KeyAsString => "key_as_string",
        }
    }
}

/// Per-node extraction parameters, fixed when the node is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOptions {
    /// Fixed label for single-value extraction; `None` yields an unlabeled entry
    pub label: Option<String>,
    /// Member holding a single-value aggregation's number
    pub value_field: String,
    pub key_source: KeySource,
    pub label_case: LabelCase,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            label: None,
            value_field: DOC_COUNT.to_string(),
            key_source: KeySource::Key,
            label_case: LabelCase::Verbatim,
        }
    }
}

impl StrategyOptions {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value_field(mut self, field: impl Into<String>) -> Self {
        self.value_field = field.into();
        self
    }

    pub fn with_key_source(mut self, key_source: KeySource) -> Self {
        self.key_source = key_source;
        self
    }

    pub fn with_label_case(mut self, label_case: LabelCase) -> Self {
        self.label_case = label_case;
        self
    }
}

/// A result-extraction strategy for one family of aggregations.
pub trait ExtractionStrategy: Send + Sync + fmt::Debug {
    /// Registry name of this strategy
    fn name(&self) -> &str;

    /// Read `raw[agg_name]` and produce its entries in response order.
    fn extract<'a>(
        &self,
        raw: &'a Value,
        agg_name: &str,
        options: &StrategyOptions,
    ) -> Result<Vec<ResultEntry<'a>>>;
}

fn aggregation<'a>(raw: &'a Value, agg_name: &str) -> Result<&'a Value> {
    raw.get(agg_name)
        .filter(|value| value.is_object())
        .ok_or_else(|| AggError::malformed(agg_name, agg_name))
}

fn number_at(
    object: &Value,
    field: &str,
    agg_name: &str,
    path: impl FnOnce() -> String,
) -> Result<Numeric> {
    object
        .get(field)
        .and_then(Numeric::from_json)
        .ok_or_else(|| AggError::malformed(agg_name, path()))
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =============================================================================
// Built-in strategies
// =============================================================================

/// One entry read from `raw[name][value_field]`, carrying `raw[name]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleValueStrategy;

impl ExtractionStrategy for SingleValueStrategy {
    fn name(&self) -> &str {
        "single_value"
    }

    fn extract<'a>(
        &self,
        raw: &'a Value,
        agg_name: &str,
        options: &StrategyOptions,
    ) -> Result<Vec<ResultEntry<'a>>> {
        let agg = aggregation(raw, agg_name)?;
        let value = number_at(agg, &options.value_field, agg_name, || {
            options.value_field.clone()
        })?;
        let entry = match &options.label {
            Some(label) => ResultEntry::labeled(label.clone(), value, agg),
            None => ResultEntry::unlabeled(value, agg),
        };
        Ok(vec![entry])
    }
}

/// One entry per element of the `raw[name].buckets` sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketStrategy;

impl ExtractionStrategy for BucketStrategy {
    fn name(&self) -> &str {
        "bucket"
    }

    fn extract<'a>(
        &self,
        raw: &'a Value,
        agg_name: &str,
        options: &StrategyOptions,
    ) -> Result<Vec<ResultEntry<'a>>> {
        let buckets = aggregation(raw, agg_name)?
            .get(BUCKETS)
            .and_then(Value::as_array)
            .ok_or_else(|| AggError::malformed(agg_name, BUCKETS))?;

        let key_field = options.key_source.field();
        buckets
            .iter()
            .enumerate()
            .map(|(idx, bucket)| {
                let label = bucket
                    .get(key_field)
                    .and_then(key_text)
                    .ok_or_else(|| {
                        AggError::malformed(agg_name, format!("{BUCKETS}[{idx}].{key_field}"))
                    })?;
                let label = match options.key_source {
                    KeySource::Key => options.label_case.apply(label),
                    KeySource::KeyAsString => label,
                };
                let value = number_at(bucket, DOC_COUNT, agg_name, || {
                    format!("{BUCKETS}[{idx}].{DOC_COUNT}")
                })?;
                Ok(ResultEntry::labeled(label, value, bucket))
            })
            .collect()
    }
}

/// One entry per member of the label-keyed `raw[name].buckets` object.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedBucketStrategy;

impl ExtractionStrategy for KeyedBucketStrategy {
    fn name(&self) -> &str {
        "keyed_bucket"
    }

    fn extract<'a>(
        &self,
        raw: &'a Value,
        agg_name: &str,
        options: &StrategyOptions,
    ) -> Result<Vec<ResultEntry<'a>>> {
        let buckets = aggregation(raw, agg_name)?
            .get(BUCKETS)
            .and_then(Value::as_object)
            .ok_or_else(|| AggError::malformed(agg_name, BUCKETS))?;

        buckets
            .iter()
            .map(|(key, bucket)| {
                let value = number_at(bucket, DOC_COUNT, agg_name, || {
                    format!("{BUCKETS}.{key}.{DOC_COUNT}")
                })?;
                Ok(ResultEntry::labeled(
                    options.label_case.apply(key.clone()),
                    value,
                    bucket,
                ))
            })
            .collect()
    }
}

/// A single unlabeled zero entry carrying the whole input. Used by root nodes
/// that only group their children.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStrategy;

impl ExtractionStrategy for EmptyStrategy {
    fn name(&self) -> &str {
        "empty"
    }

    fn extract<'a>(
        &self,
        raw: &'a Value,
        _agg_name: &str,
        _options: &StrategyOptions,
    ) -> Result<Vec<ResultEntry<'a>>> {
        Ok(vec![ResultEntry::unlabeled(Numeric::ZERO, raw)])
    }
}

/// Strategy backed by a caller-supplied function.
pub struct FnStrategy<F> {
    name: String,
    f: F,
}

impl<F> FnStrategy<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a Value, &str, &StrategyOptions) -> Result<Vec<ResultEntry<'a>>>
            + Send
            + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnStrategy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").field("name", &self.name).finish()
    }
}

impl<F> ExtractionStrategy for FnStrategy<F>
where
    F: for<'a> Fn(&'a Value, &str, &StrategyOptions) -> Result<Vec<ResultEntry<'a>>>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn extract<'a>(
        &self,
        raw: &'a Value,
        agg_name: &str,
        options: &StrategyOptions,
    ) -> Result<Vec<ResultEntry<'a>>> {
        (self.f)(raw, agg_name, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(entries: &[ResultEntry<'_>]) -> Vec<Option<String>> {
        entries.iter().map(|e| e.label.clone()).collect()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("term1"), "Term1");
        assert_eq!(title_case("hello wORLD"), "Hello WORLD");
        assert_eq!(title_case("a\tb\nc"), "A\tB\nC");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_title_case_leaves_non_ascii_alone() {
        assert_eq!(title_case("ßtraße ǆem"), "ßtraße ǆem");
        assert_eq!(title_case("über alles"), "über Alles");
    }

    #[test]
    fn test_single_value_unlabeled_by_default() {
        let raw = json!({"filter_agg": {"doc_count": 5}});
        let entries = SingleValueStrategy
            .extract(&raw, "filter_agg", &StrategyOptions::default())
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, None);
        assert_eq!(entries[0].value, Numeric::Int(5));
        assert_eq!(entries[0].carry, &raw["filter_agg"]);
    }

    #[test]
    fn test_single_value_custom_field_and_label() {
        let raw = json!({"x_sum_agg": {"value": 47.5}});
        let options = StrategyOptions::default()
            .with_label("Sum")
            .with_value_field("value");
        let entries = SingleValueStrategy
            .extract(&raw, "x_sum_agg", &options)
            .unwrap();
        assert_eq!(labels(&entries), vec![Some("Sum".to_string())]);
        assert_eq!(entries[0].value, Numeric::Float(47.5));
    }

    #[test]
    fn test_single_value_missing_field() {
        let raw = json!({"filter_agg": {}});
        let err = SingleValueStrategy
            .extract(&raw, "filter_agg", &StrategyOptions::default())
            .unwrap_err();
        assert_eq!(err, AggError::malformed("filter_agg", "doc_count"));
    }

    #[test]
    fn test_bucket_numeric_keys_become_text() {
        let raw = json!({"n_terms_agg": {"buckets": [
            {"key": 10, "doc_count": 1},
            {"key": 2.5, "doc_count": 2}
        ]}});
        let entries = BucketStrategy
            .extract(&raw, "n_terms_agg", &StrategyOptions::default())
            .unwrap();
        assert_eq!(
            labels(&entries),
            vec![Some("10".to_string()), Some("2.5".to_string())]
        );
    }

    #[test]
    fn test_bucket_title_case_skips_key_as_string() {
        let raw = json!({"d_date_histogram_agg": {"buckets": [
            {"key": 1, "key_as_string": "jan first", "doc_count": 1}
        ]}});
        let options = StrategyOptions::default()
            .with_key_source(KeySource::KeyAsString)
            .with_label_case(LabelCase::TitleCase);
        let entries = BucketStrategy
            .extract(&raw, "d_date_histogram_agg", &options)
            .unwrap();
        assert_eq!(labels(&entries), vec![Some("jan first".to_string())]);
    }

    #[test]
    fn test_bucket_missing_doc_count_reports_path() {
        let raw = json!({"t_terms_agg": {"buckets": [{"key": "a", "doc_count": 1}, {"key": "b"}]}});
        let err = BucketStrategy
            .extract(&raw, "t_terms_agg", &StrategyOptions::default())
            .unwrap_err();
        assert_eq!(err, AggError::malformed("t_terms_agg", "buckets[1].doc_count"));
    }

    #[test]
    fn test_bucket_rejects_keyed_buckets() {
        let raw = json!({"t_terms_agg": {"buckets": {"a": {"doc_count": 1}}}});
        let err = BucketStrategy
            .extract(&raw, "t_terms_agg", &StrategyOptions::default())
            .unwrap_err();
        assert_eq!(err, AggError::malformed("t_terms_agg", "buckets"));
    }

    #[test]
    fn test_keyed_bucket_keeps_response_order() {
        let raw: Value = serde_json::from_str(
            r#"{"filters_agg": {"buckets": {"zeta": {"doc_count": 1}, "alpha": {"doc_count": 2}}}}"#,
        )
        .unwrap();
        let entries = KeyedBucketStrategy
            .extract(&raw, "filters_agg", &StrategyOptions::default())
            .unwrap();
        assert_eq!(
            labels(&entries),
            vec![Some("zeta".to_string()), Some("alpha".to_string())]
        );
    }

    #[test]
    fn test_missing_aggregation_is_malformed() {
        let raw = json!({});
        let err = KeyedBucketStrategy
            .extract(&raw, "filters_agg", &StrategyOptions::default())
            .unwrap_err();
        assert_eq!(err, AggError::malformed("filters_agg", "filters_agg"));
    }

    #[test]
    fn test_fn_strategy_receives_bound_name() {
        let strategy = FnStrategy::new("constant", |raw, name, _options| {
            Ok(vec![ResultEntry::labeled(name, Numeric::Int(1), raw)])
        });
        let raw = json!({});
        let entries = strategy
            .extract(&raw, "bound_name", &StrategyOptions::default())
            .unwrap();
        assert_eq!(labels(&entries), vec![Some("bound_name".to_string())]);
        assert_eq!(strategy.name(), "constant");
    }
}
