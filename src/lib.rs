pub mod agg;
pub mod config;
pub mod definition;
pub mod error;
pub mod logging;
pub mod numeric;
pub mod query;
pub mod report;

pub use agg::{AggBuilder, AggKind, AggNode, LabelCase, MultiBranch, StrategyRegistry};
pub use config::{CliArgs, Command, EngineConfig, load_document};
pub use definition::{AggDefinition, AggSpec, DefinitionDocument};
pub use error::{AggError, ErrorCode};
pub use logging::{LoggingConfig, init_logging};
pub use numeric::Numeric;
pub use query::{BoolQuery, Query};
pub use report::{Report, Summary};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

const AGGREGATIONS: &str = "aggregations";

/// Execute one command and return the JSON text it prints.
pub fn run_command(args: &CliArgs) -> Result<String> {
    let config = EngineConfig::from_args(args)?;
    let builder = config.builder()?;

    let output = match &args.command {
        Command::Compile { definition } => {
            let _span = logging::operation_span("compile").entered();
            let node = load_tree(definition, &builder)?;
            let mut request = serde_json::Map::new();
            request.insert("aggs".to_string(), node.compile_query());
            Value::Object(request)
        }
        Command::Resolve {
            definition,
            response,
        } => {
            let _span = logging::resolve_span(&definition.display().to_string()).entered();
            let node = load_tree(definition, &builder)?;
            let response: Value = load_document(response, "response")?;
            let report = node
                .resolve(aggregations_of(&response))
                .with_context(|| format!("failed to resolve response against {:?}", definition))?;
            tracing::info!(total = %report.value(), "response resolved");
            report.to_json()
        }
    };

    let text = if config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(text)
}

fn load_tree(path: &Path, builder: &AggBuilder) -> Result<AggNode> {
    let document: DefinitionDocument = load_document(path, "definition")?;
    let node = document
        .build(builder)
        .with_context(|| format!("invalid aggregation definition {:?}", path))?;
    tracing::debug!(definition = %path.display(), "aggregation tree built");
    Ok(node)
}

/// A full search response keeps its aggregations under `aggregations`; bare
/// aggregation objects are used as they are.
pub fn aggregations_of(response: &Value) -> &Value {
    response.get(AGGREGATIONS).unwrap_or(response)
}
