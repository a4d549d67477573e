//! Error types for aggregation composition and resolution
//!
//! Every failure is deterministic given the same inputs: nothing here is
//! retryable, and no partial report is ever returned alongside an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable numeric codes for each error condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// A response slice lacks a field its aggregation expects
    MalformedResponse = -32101,
    /// Two sibling aggregations compile to the same name
    DuplicateAggregationName = -32102,
    /// A strategy override names a strategy nobody registered
    UnknownStrategy = -32103,
    /// Two entries of one aggregation share a label
    DuplicateLabel = -32104,
    /// An unlabeled entry appeared next to other entries
    UnlabeledEntry = -32105,
    /// A node would hold both plain children and a multi-branch
    ConflictingChildren = -32106,
    /// An unnamed root node was attached below another aggregation
    UnnamedChild = -32107,
}

impl ErrorCode {
    /// Get the integer code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Resolution is a pure function of its inputs, so retrying never helps
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::MalformedResponse
            | ErrorCode::DuplicateLabel
            | ErrorCode::UnlabeledEntry => "response_error",
            ErrorCode::DuplicateAggregationName
            | ErrorCode::ConflictingChildren
            | ErrorCode::UnnamedChild => "construction_error",
            ErrorCode::UnknownStrategy => "configuration_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

// =============================================================================
// AGGREGATION ERROR
// =============================================================================

/// Errors raised while building an aggregation tree or resolving a response
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggError {
    #[error("malformed response for aggregation '{agg_name}': missing or invalid '{field}'")]
    MalformedResponse { agg_name: String, field: String },

    #[error("duplicate aggregation name '{name}' among siblings")]
    DuplicateAggregationName { name: String },

    #[error("unknown extraction strategy '{0}'")]
    UnknownStrategy(String),

    #[error("aggregation '{agg_name}' produced label '{label}' more than once")]
    DuplicateLabel { agg_name: String, label: String },

    #[error("aggregation '{agg_name}' produced an unlabeled entry among {count} entries")]
    UnlabeledEntry { agg_name: String, count: usize },

    #[error("aggregation '{name}' cannot hold both child aggregations and a multi-branch")]
    ConflictingChildren { name: String },

    #[error("'{parent}' cannot hold an unnamed root node; attach the root's children instead")]
    UnnamedChild { parent: String },
}

impl AggError {
    pub fn malformed(agg_name: impl Into<String>, field: impl Into<String>) -> Self {
        AggError::MalformedResponse {
            agg_name: agg_name.into(),
            field: field.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AggError::MalformedResponse { .. } => ErrorCode::MalformedResponse,
            AggError::DuplicateAggregationName { .. } => ErrorCode::DuplicateAggregationName,
            AggError::UnknownStrategy(_) => ErrorCode::UnknownStrategy,
            AggError::DuplicateLabel { .. } => ErrorCode::DuplicateLabel,
            AggError::UnlabeledEntry { .. } => ErrorCode::UnlabeledEntry,
            AggError::ConflictingChildren { .. } => ErrorCode::ConflictingChildren,
            AggError::UnnamedChild { .. } => ErrorCode::UnnamedChild,
        }
    }
}

pub type Result<T, E = AggError> = std::result::Result<T, E>;
