//! Diagnostics for the `search-agg` command line.
//!
//! Stdout carries only the JSON a command prints, so events go to stderr or,
//! when `LOG_DIR` is set, to a daily-rotated file in that directory. Verbosity
//! follows the repeated `-v` flag unless `RUST_LOG` gives an explicit filter.
//! `LOG_FORMAT=json` switches from compact text lines to JSON objects.

use anyhow::{Context, Result};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "search-agg.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One compact line per event
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stderr,
    /// Daily-rotated files under the given directory
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Number of `-v` flags: warn, info, debug, then trace
    pub verbosity: u8,
}

impl LoggingConfig {
    /// Settings from the process environment plus the CLI verbosity.
    pub fn from_env(verbosity: u8) -> Self {
        Self::from_lookup(verbosity, |key| std::env::var(key).ok())
    }

    /// Settings read through `lookup`, so callers can supply variables
    /// without touching the process environment.
    pub fn from_lookup(verbosity: u8, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = match lookup("LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let output = lookup("LOG_DIR")
            .filter(|dir| !dir.is_empty())
            .map(|dir| LogOutput::Directory(PathBuf::from(dir)))
            .unwrap_or_default();
        Self {
            format,
            output,
            verbosity,
        }
    }

    pub fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered events are flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let (writer, guard) = match &config.output {
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::Directory(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {:?}", dir))?;
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
        }
    };
    let ansi = matches!(config.output, LogOutput::Stderr) && io::stderr().is_terminal();

    let layer = match config.format {
        LogFormat::Text => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::debug!(format = ?config.format, output = ?config.output, "logging initialized");
    Ok(guard)
}

/// Span wrapping one command-line operation.
pub fn operation_span(name: &'static str) -> tracing::Span {
    tracing::info_span!("operation", operation.name = name)
}

/// Span wrapping the resolution of one response against a definition.
pub fn resolve_span(definition: &str) -> tracing::Span {
    tracing::info_span!("resolve", agg.definition = definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_keep_stdout_clean() {
        let config = LoggingConfig::from_lookup(0, lookup(&[]));
        assert_eq!(config.output, LogOutput::Stderr);
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.default_directive(), "warn");
    }

    #[test]
    fn test_log_dir_and_format() {
        let config =
            LoggingConfig::from_lookup(2, lookup(&[("LOG_FORMAT", "JSON"), ("LOG_DIR", "/tmp/agg")]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Directory(PathBuf::from("/tmp/agg")));
        assert_eq!(config.default_directive(), "debug");
    }

    #[test]
    fn test_empty_log_dir_means_stderr() {
        let config = LoggingConfig::from_lookup(7, lookup(&[("LOG_DIR", "")]));
        assert_eq!(config.output, LogOutput::Stderr);
        assert_eq!(config.default_directive(), "trace");
    }
}
