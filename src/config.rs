use crate::agg::{AggBuilder, AggKind, LabelCase, StrategyRegistry};
use crate::error::AggError;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// `KIND=NAME`: bind the registered strategy `NAME` to aggregation kind `KIND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOverride {
    pub kind: AggKind,
    pub strategy: String,
}

pub fn parse_strategy_override(raw: &str) -> Result<StrategyOverride, String> {
    let (kind, strategy) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=NAME, got {raw:?}"))?;
    let kind = kind
        .trim()
        .parse::<AggKind>()
        .map_err(|_| format!("unknown aggregation kind {:?}", kind.trim()))?;
    let strategy = strategy.trim();
    if strategy.is_empty() {
        return Err(format!("missing strategy name in {raw:?}"));
    }
    Ok(StrategyOverride {
        kind,
        strategy: strategy.to_string(),
    })
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "search-agg",
    about = "Compile aggregation trees and resolve search responses into reports",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        env = "SEARCH_AGG_CONFIG",
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SEARCH_AGG_LABEL_CASE",
        value_name = "CASE",
        help = "Label case for bucket keys (verbatim or title-case)",
        global = true
    )]
    pub label_case: Option<LabelCase>,

    #[arg(
        long = "strategy",
        env = "SEARCH_AGG_STRATEGIES",
        value_name = "KIND=NAME",
        value_delimiter = ',',
        value_parser = parse_strategy_override,
        help = "Bind a registered extraction strategy to an aggregation kind",
        global = true
    )]
    pub strategies: Option<Vec<StrategyOverride>>,

    #[arg(long, help = "Pretty-print JSON output", global = true)]
    pub pretty: bool,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Log more to stderr (-v info, -vv debug, -vvv trace)",
        global = true
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the compiled aggregation request as `{"aggs": ...}`
    Compile {
        #[arg(long, short, value_name = "FILE")]
        definition: PathBuf,
    },
    /// Resolve a raw search response into a report
    Resolve {
        #[arg(long, short, value_name = "FILE")]
        definition: PathBuf,
        #[arg(long, short, value_name = "FILE")]
        response: PathBuf,
    },
}

/// Effective engine settings after merging the config file and CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub label_case: LabelCase,
    pub strategy_overrides: Vec<StrategyOverride>,
    pub pretty: bool,
}

impl EngineConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_document::<PartialConfig>(path, "config")?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            label_case: file_label_case,
            strategies: file_strategies,
            pretty: file_pretty,
        } = file_config;

        let label_case = args
            .label_case
            .or(file_label_case)
            .unwrap_or_default();

        // CLI bindings replace file bindings for the same kind.
        let mut bindings: IndexMap<AggKind, String> = file_strategies.unwrap_or_default();
        for binding in args.strategies.iter().flatten() {
            bindings.insert(binding.kind, binding.strategy.clone());
        }
        let strategy_overrides = bindings
            .into_iter()
            .map(|(kind, strategy)| StrategyOverride { kind, strategy })
            .collect();

        Ok(Self {
            label_case,
            strategy_overrides,
            pretty: args.pretty || file_pretty.unwrap_or(false),
        })
    }

    pub fn registry(&self) -> Result<StrategyRegistry, AggError> {
        let mut registry = StrategyRegistry::new().with_label_case(self.label_case);
        for binding in &self.strategy_overrides {
            registry.override_kind(binding.kind, &binding.strategy)?;
        }
        Ok(registry)
    }

    pub fn builder(&self) -> Result<AggBuilder, AggError> {
        Ok(AggBuilder::with_registry(self.registry()?))
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    label_case: Option<LabelCase>,
    strategies: Option<IndexMap<AggKind, String>>,
    pretty: Option<bool>,
}

/// Read a YAML or JSON document, chosen by file extension.
pub fn load_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    if !path.exists() {
        anyhow::bail!("{what} file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML {what} {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON {what} {:?}", path))?,
        other => anyhow::bail!("unsupported {what} extension: {other}"),
    };
    Ok(parsed)
}
