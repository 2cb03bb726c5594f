//! Core shared library for the ruleset workspace.
//!
//! This crate exposes the primitives the engine and the command line
//! depend on: the canonical error type, configuration loading from the
//! environment, JSON helpers and logging setup.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::RulesetConfig;
pub use errors::{ConfigError, Result as CoreResult, RulesetError};
