use std::path::PathBuf;

use ruleset_core::RulesetError;
use thiserror::Error;

use crate::source::Layer;

/// Errors returned by the engine when loading rule sources or exporting results.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {layer} rules: {message}")]
    Parse { layer: Layer, message: String },
    #[error("{layer} rules must be a JSON object keyed by rule identifier")]
    NotAnObject { layer: Layer },
    #[error("{layer} rules are a converter failure report: {message}")]
    ConverterFailure { layer: Layer, message: String },
    #[error("failed to export aggregated rules as {format}: {message}")]
    Export {
        format: &'static str,
        message: String,
    },
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(layer: Layer, message: impl Into<String>) -> Self {
        RuleError::Parse {
            layer,
            message: message.into(),
        }
    }

    pub fn export_error(format: &'static str, message: impl Into<String>) -> Self {
        RuleError::Export {
            format,
            message: message.into(),
        }
    }
}

impl From<RuleError> for RulesetError {
    fn from(value: RuleError) -> Self {
        match value {
            RuleError::Io { source, .. } => RulesetError::IoError(source),
            RuleError::Export { .. } => RulesetError::SerializationError(value.to_string()),
            other => RulesetError::DeserializationError(other.to_string()),
        }
    }
}
