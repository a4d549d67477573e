//! Per-kind extraction strategy lookup.
//!
//! A registry holds named strategies and the bindings from aggregation kinds
//! to strategies. Kinds without an explicit binding use their documented
//! default. Bindings only affect result extraction; compiled queries never
//! depend on the registry.

use super::strategy::{
    BucketStrategy, EmptyStrategy, ExtractionStrategy, KeyedBucketStrategy, LabelCase,
    SingleValueStrategy,
};
use crate::error::{AggError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Aggregation families with their own factory and default strategy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggKind {
    Filter,
    Filters,
    Terms,
    DateHistogram,
    Range,
    Sum,
    Nested,
    ReverseNested,
}

impl AggKind {
    /// Built-in strategy used when nothing is bound to this kind.
    pub fn default_strategy(&self) -> Builtin {
        match self {
            AggKind::Filter
            | AggKind::Sum
            | AggKind::Nested
            | AggKind::ReverseNested => Builtin::SingleValue,
            AggKind::Filters => Builtin::KeyedBucket,
            AggKind::Terms | AggKind::DateHistogram | AggKind::Range => Builtin::Bucket,
        }
    }

    /// Registry name of [`AggKind::default_strategy`].
    pub fn default_strategy_name(&self) -> &'static str {
        self.default_strategy().name()
    }
}

/// Strategies every registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Builtin {
    SingleValue,
    Bucket,
    KeyedBucket,
    Empty,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::SingleValue => "single_value",
            Builtin::Bucket => "bucket",
            Builtin::KeyedBucket => "keyed_bucket",
            Builtin::Empty => "empty",
        }
    }

    pub fn strategy(&self) -> Arc<dyn ExtractionStrategy> {
        match self {
            Builtin::SingleValue => Arc::new(SingleValueStrategy),
            Builtin::Bucket => Arc::new(BucketStrategy),
            Builtin::KeyedBucket => Arc::new(KeyedBucketStrategy),
            Builtin::Empty => Arc::new(EmptyStrategy),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    named: HashMap<String, Arc<dyn ExtractionStrategy>>,
    bound: HashMap<AggKind, Arc<dyn ExtractionStrategy>>,
    label_case: LabelCase,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    /// Registry with the built-in strategies and no kind bindings.
    pub fn new() -> Self {
        let mut registry = Self {
            named: HashMap::new(),
            bound: HashMap::new(),
            label_case: LabelCase::default(),
        };
        for builtin in Builtin::iter() {
            registry.register(builtin.strategy());
        }
        registry
    }

    pub fn with_label_case(mut self, label_case: LabelCase) -> Self {
        self.label_case = label_case;
        self
    }

    /// Label case applied to key-derived bucket labels.
    pub fn label_case(&self) -> LabelCase {
        self.label_case
    }

    pub fn set_label_case(&mut self, label_case: LabelCase) {
        self.label_case = label_case;
    }

    /// Register a strategy under its own name, replacing any previous one.
    /// Re-registering a built-in name changes the default of every kind
    /// that falls back to it.
    pub fn register(&mut self, strategy: Arc<dyn ExtractionStrategy>) {
        self.named.insert(strategy.name().to_string(), strategy);
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn ExtractionStrategy>> {
        self.named
            .get(name)
            .cloned()
            .ok_or_else(|| AggError::UnknownStrategy(name.to_string()))
    }

    /// Bind the registered strategy `name` to `kind`.
    pub fn override_kind(&mut self, kind: AggKind, name: &str) -> Result<()> {
        let strategy = self.lookup(name)?;
        tracing::debug!(kind = %kind, strategy = name, "strategy override registered");
        self.bound.insert(kind, strategy);
        Ok(())
    }

    /// Bind a strategy instance to `kind` without registering it by name.
    pub fn set_strategy(&mut self, kind: AggKind, strategy: Arc<dyn ExtractionStrategy>) {
        self.bound.insert(kind, strategy);
    }

    pub fn is_overridden(&self, kind: AggKind) -> bool {
        self.bound.contains_key(&kind)
    }

    /// Strategy bound to `kind`, or the kind's default.
    pub fn strategy_for(&self, kind: AggKind) -> Arc<dyn ExtractionStrategy> {
        if let Some(strategy) = self.bound.get(&kind) {
            return strategy.clone();
        }
        // Built-in names are registered in `new` and `register` only replaces.
        self.named[kind.default_strategy_name()].clone()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.named.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = StrategyRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["bucket", "empty", "keyed_bucket", "single_value"]
        );
    }

    #[test]
    fn test_defaults_match_documented_names() {
        let registry = StrategyRegistry::new();
        for kind in AggKind::iter() {
            assert_eq!(
                registry.strategy_for(kind).name(),
                kind.default_strategy_name()
            );
            assert!(!registry.is_overridden(kind));
        }
    }

    #[test]
    fn test_builtin_table_matches_strategy_names() {
        for builtin in Builtin::iter() {
            assert_eq!(builtin.strategy().name(), builtin.name());
        }
    }

    #[test]
    fn test_unknown_override_fails() {
        let mut registry = StrategyRegistry::new();
        let err = registry
            .override_kind(AggKind::Terms, "missing")
            .unwrap_err();
        assert_eq!(err, AggError::UnknownStrategy("missing".to_string()));
        assert!(!registry.is_overridden(AggKind::Terms));
    }

    #[test]
    fn test_override_binds_only_that_kind() {
        let mut registry = StrategyRegistry::new();
        registry
            .override_kind(AggKind::Range, "keyed_bucket")
            .unwrap();
        assert_eq!(registry.strategy_for(AggKind::Range).name(), "keyed_bucket");
        assert_eq!(registry.strategy_for(AggKind::Terms).name(), "bucket");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "date_histogram".parse::<AggKind>().unwrap(),
            AggKind::DateHistogram
        );
        assert_eq!(AggKind::ReverseNested.to_string(), "reverse_nested");
    }
}
