use std::io;

use thiserror::Error;

/// Result type used across the ruleset core crate.
pub type Result<T> = std::result::Result<T, RulesetError>;

/// Canonical error representation shared by all crates in the workspace.
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for RulesetError {
    fn from(err: serde_json::Error) -> Self {
        RulesetError::DeserializationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for RulesetError {
    fn from(value: ConfigError) -> Self {
        RulesetError::ConfigError(value.to_string())
    }
}
