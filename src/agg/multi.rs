//! Ordered label -> aggregation tables compiled under ordinal-prefixed names.
//!
//! Each branch compiles as `"{ordinal}_{childName}"`, where the ordinal is the
//! branch's position in the caller's insertion order. Resolution walks the
//! stored branch table, never the response's own key order, so the report
//! always follows insertion order.

use super::node::{AggNode, summarize};
use crate::error::{AggError, Result};
use crate::report::Report;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Branch {
    ordinal: usize,
    label: String,
    compiled_name: String,
    node: AggNode,
}

impl Branch {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn compiled_name(&self) -> &str {
        &self.compiled_name
    }

    pub fn node(&self) -> &AggNode {
        &self.node
    }
}

#[derive(Debug, Clone)]
pub struct MultiBranch {
    branches: Vec<Branch>,
}

impl MultiBranch {
    /// Build from `(label, node)` pairs in insertion order. Labels must be
    /// unique and every node must be named.
    pub fn new<L: Into<String>>(
        branches: impl IntoIterator<Item = (L, AggNode)>,
    ) -> Result<Self> {
        let mut table: Vec<Branch> = Vec::new();
        for (ordinal, (label, node)) in branches.into_iter().enumerate() {
            let label = label.into();
            if node.is_root() {
                return Err(AggError::UnnamedChild {
                    parent: format!("multi branch '{label}'"),
                });
            }
            if table.iter().any(|branch| branch.label == label) {
                return Err(AggError::DuplicateLabel {
                    agg_name: "multi".to_string(),
                    label,
                });
            }
            table.push(Branch {
                ordinal,
                compiled_name: format!("{ordinal}_{}", node.name()),
                label,
                node,
            });
        }
        Ok(Self { branches: table })
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(Branch::label)
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// `{"{ordinal}_{childName}": compiledChildBody}` for every branch.
    pub fn compile(&self) -> Map<String, Value> {
        self.branches
            .iter()
            .map(|branch| (branch.compiled_name.clone(), branch.node.compile_body()))
            .collect()
    }

    /// Resolve every branch against `raw` under its ordinal name and label
    /// the results with the original labels.
    pub fn resolve(&self, raw: &Value) -> Result<Report> {
        let resolved = self
            .branches
            .iter()
            .map(|branch| {
                let value = branch.node.resolve_as(raw, &branch.compiled_name)?;
                Ok((branch.label.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;
        summarize("multi", resolved)
    }
}
