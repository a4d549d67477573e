//! Aggregation tree nodes: query compilation and recursive result resolution.

use super::multi::MultiBranch;
use super::registry::AggKind;
use super::strategy::{EmptyStrategy, ExtractionStrategy, StrategyOptions};
use crate::error::{AggError, Result};
use crate::numeric::Numeric;
use crate::report::{Report, Summary};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const AGGS: &str = "aggs";

/// What hangs below a node: nothing, plain children, or a multi-branch.
#[derive(Debug, Clone, Default)]
pub enum Children {
    #[default]
    Empty,
    Nodes(Vec<AggNode>),
    Multi(MultiBranch),
}

/// One aggregation: a query template, the strategy that reads its results,
/// and its children.
///
/// Nodes are immutable once attached to a parent; composition happens through
/// consuming calls (`with_child`, `with_children`, `with_multi`) that validate
/// sibling names eagerly.
#[derive(Debug, Clone)]
pub struct AggNode {
    name: Option<String>,
    kind: Option<AggKind>,
    body: Value,
    strategy: Arc<dyn ExtractionStrategy>,
    options: StrategyOptions,
    children: Children,
}

impl AggNode {
    /// Node compiling to `{name: body}` whose results are read by `strategy`.
    pub fn new(
        name: impl Into<String>,
        body: Value,
        strategy: Arc<dyn ExtractionStrategy>,
        options: StrategyOptions,
    ) -> Self {
        Self {
            name: Some(name.into()),
            kind: None,
            body,
            strategy,
            options,
            children: Children::Empty,
        }
    }

    /// Unnamed grouping node. It compiles to its children's merged map and
    /// resolves them against the whole response.
    pub fn root() -> Self {
        Self {
            name: None,
            kind: None,
            body: Value::Object(Map::new()),
            strategy: Arc::new(EmptyStrategy),
            options: StrategyOptions::default(),
            children: Children::Empty,
        }
    }

    pub(crate) fn with_kind(mut self, kind: AggKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Compiled name; empty for root nodes.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn is_root(&self) -> bool {
        self.name.is_none()
    }

    fn label_for_errors(&self) -> &str {
        self.name.as_deref().unwrap_or("root")
    }

    pub fn kind(&self) -> Option<AggKind> {
        self.kind
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The named wrapper `{name: body}` without children.
    pub fn template(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.name().to_string(), self.body.clone());
        Value::Object(map)
    }

    pub fn options(&self) -> &StrategyOptions {
        &self.options
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Attach one more child. Fails if the child is an unnamed root, if its
    /// name collides with a sibling, or if this node already holds a
    /// multi-branch.
    pub fn with_child(mut self, child: AggNode) -> Result<Self> {
        if child.is_root() {
            return Err(AggError::UnnamedChild {
                parent: self.label_for_errors().to_string(),
            });
        }
        match &mut self.children {
            Children::Multi(_) => {
                return Err(AggError::ConflictingChildren {
                    name: self.name().to_string(),
                });
            }
            Children::Nodes(nodes) => {
                if nodes.iter().any(|sibling| sibling.name() == child.name()) {
                    return Err(AggError::DuplicateAggregationName {
                        name: child.name().to_string(),
                    });
                }
                nodes.push(child);
            }
            Children::Empty => self.children = Children::Nodes(vec![child]),
        }
        Ok(self)
    }

    pub fn with_children(self, children: impl IntoIterator<Item = AggNode>) -> Result<Self> {
        children
            .into_iter()
            .try_fold(self, |node, child| node.with_child(child))
    }

    /// Attach a multi-branch. A node holds either plain children or one
    /// multi-branch, never both.
    pub fn with_multi(mut self, multi: MultiBranch) -> Result<Self> {
        if !matches!(self.children, Children::Empty) {
            return Err(AggError::ConflictingChildren {
                name: self.name().to_string(),
            });
        }
        self.children = Children::Multi(multi);
        Ok(self)
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// `{name: template, aggs?: children}`; for root nodes just the merged
    /// children map.
    pub fn compile_query(&self) -> Value {
        match &self.name {
            Some(name) => {
                let mut map = Map::new();
                map.insert(name.clone(), self.compile_body());
                Value::Object(map)
            }
            None => Value::Object(self.merge_child_queries().unwrap_or_default()),
        }
    }

    /// The template body with the `aggs` member attached when there are
    /// children.
    pub fn compile_body(&self) -> Value {
        let mut body = self.body.clone();
        if let Some(aggs) = self.merge_child_queries()
            && let Value::Object(map) = &mut body
        {
            map.insert(AGGS.to_string(), Value::Object(aggs));
        }
        body
    }

    /// Union of every child's compiled query, or the multi-branch's
    /// ordinal-prefixed map. `None` when there are no children.
    pub fn merge_child_queries(&self) -> Option<Map<String, Value>> {
        match &self.children {
            Children::Empty => None,
            Children::Nodes(nodes) => {
                let mut merged = Map::new();
                for child in nodes {
                    if let Value::Object(compiled) = child.compile_query() {
                        merged.extend(compiled);
                    }
                }
                Some(merged)
            }
            Children::Multi(multi) => Some(multi.compile()),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Reduce `raw` (the object holding this node's aggregation by name)
    /// into a report.
    pub fn resolve(&self, raw: &Value) -> Result<Report> {
        self.resolve_as(raw, self.name())
    }

    /// Resolve with the strategy bound to `agg_name` instead of this node's
    /// own name. Multi-branches use this for their ordinal-prefixed names.
    pub fn resolve_as(&self, raw: &Value, agg_name: &str) -> Result<Report> {
        let entries = self.strategy.extract(raw, agg_name, &self.options)?;
        tracing::trace!(
            agg = agg_name,
            strategy = self.strategy.name(),
            entries = entries.len(),
            "extracted result entries"
        );

        if let [entry] = entries.as_slice()
            && entry.label.is_none()
        {
            return self.final_value(entry.value, entry.carry);
        }

        let count = entries.len();
        let mut resolved = Vec::with_capacity(count);
        for entry in entries {
            let label = entry.label.ok_or_else(|| AggError::UnlabeledEntry {
                agg_name: agg_name.to_string(),
                count,
            })?;
            let value = self.final_value(entry.value, entry.carry)?;
            resolved.push((label, value));
        }
        summarize(agg_name, resolved)
    }

    /// An entry's displayed value: its own number for leaves, otherwise the
    /// recursive resolution of the children against its carry.
    fn final_value(&self, value: Numeric, carry: &Value) -> Result<Report> {
        match &self.children {
            Children::Empty => Ok(Report::Scalar(value)),
            Children::Nodes(nodes) => match nodes.as_slice() {
                [only] => only.resolve(carry),
                _ => {
                    let resolved = nodes
                        .iter()
                        .map(|child| Ok((child.name().to_string(), child.resolve(carry)?)))
                        .collect::<Result<Vec<_>>>()?;
                    summarize(self.name(), resolved)
                }
            },
            Children::Multi(multi) => multi.resolve(carry),
        }
    }
}

/// Wrap labeled values into `{Total, options}`, preserving their order.
pub(crate) fn summarize(
    agg_name: &str,
    entries: impl IntoIterator<Item = (String, Report)>,
) -> Result<Report> {
    let mut options = IndexMap::new();
    for (label, value) in entries {
        if options.contains_key(&label) {
            return Err(AggError::DuplicateLabel {
                agg_name: agg_name.to_string(),
                label,
            });
        }
        options.insert(label, value);
    }
    Ok(Report::Summary(Summary::from_options(options)))
}
