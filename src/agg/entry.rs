use crate::numeric::Numeric;
use serde_json::Value;

/// One item extracted from a response slice.
///
/// `carry` borrows the raw subtree the entry came from (a bucket, or the
/// aggregation object itself) so child aggregations can be resolved against
/// it without copying the response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry<'a> {
    pub label: Option<String>,
    pub value: Numeric,
    pub carry: &'a Value,
}

impl<'a> ResultEntry<'a> {
    pub fn labeled(label: impl Into<String>, value: Numeric, carry: &'a Value) -> Self {
        Self {
            label: Some(label.into()),
            value,
            carry,
        }
    }

    pub fn unlabeled(value: Numeric, carry: &'a Value) -> Self {
        Self {
            label: None,
            value,
            carry,
        }
    }
}
