//! Aggregation tree composition and response resolution.
//!
//! An [`AggNode`] pairs a query template with an extraction strategy and its
//! children. Compiling walks the tree top-down into the engine's nested
//! aggregation request; resolving walks the raw response in lockstep with the
//! tree and reduces it into a [`Report`](crate::report::Report).

pub mod builder;
pub mod entry;
pub mod multi;
pub mod node;
pub mod registry;
pub mod strategy;

pub use builder::AggBuilder;
pub use entry::ResultEntry;
pub use multi::{Branch, MultiBranch};
pub use node::{AggNode, Children};
pub use registry::{AggKind, Builtin, StrategyRegistry};
pub use strategy::{
    BucketStrategy, EmptyStrategy, ExtractionStrategy, FnStrategy, KeySource,
    KeyedBucketStrategy, LabelCase, SingleValueStrategy, StrategyOptions, title_case,
};
