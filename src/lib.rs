//! Bypass ruleset: deterministic aggregation of layered domain rules.
//!
//! The ruleset served to extension installations is assembled from three
//! independently maintained layers:
//!
//! * `base`: rules converted from the extension's own release
//! * `updated`: the maintained overlay of changed rules
//! * `custom`: locally authored additions and deletions
//!
//! This crate re-exports the engine and the shared core so callers only
//! need a single dependency.

pub use ruleset_core::{config, errors, logging, serde_utils};
pub use ruleset_core::{ConfigError, RulesetConfig, RulesetError};
pub use ruleset_engine::*;

/// Aggregates three JSON layers using the configured header identity and
/// returns the pretty JSON array together with the YAML document.
pub fn export_all(
    config: &RulesetConfig,
    base: &str,
    updated: &str,
    custom: &str,
    version: Option<&str>,
) -> Result<(String, String), RulesetError> {
    let engine = RulesetEngine::new(ExportOptions::from(config));
    let run = engine.run_json(base, updated, custom)?;
    let json = engine.to_json(&run)?;
    let yaml = engine.to_yaml(&run, version)?;
    Ok((json, yaml))
}
