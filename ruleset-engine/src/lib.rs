//! Rule aggregation engine for the Bypass ruleset.
//!
//! Three independently maintained layers (base, updated, custom) are merged
//! with whole-record precedence, deletion instructions are resolved into key
//! and domain sets, group rules are expanded into one record per domain, and
//! the resulting domain-unique collection is exported as JSON and YAML.
//!
//! Each stage is a pure function of the previous one:
//!
//! ```text
//! RuleSource x3 -> merge -> resolve_deletions -> aggregate -> Exporter
//! ```

mod aggregate;
mod deletion;
mod engine;
mod error;
mod export;
mod manifest;
mod merge;
mod ordered;
mod report;
mod rule;
mod source;
mod store;
pub mod version;

pub use aggregate::{aggregate, aggregate_with_stats, AggregatedOutput, AggregatedRule, ExpansionStats};
pub use deletion::{resolve_deletions, DeletionSets};
pub use engine::{generate_aggregated_json, AggregationRun, RulesetEngine};
pub use error::RuleError;
pub use export::{to_json, ExportOptions, Exporter};
pub use manifest::{ArtifactKind, Manifest, ManifestEntry, SourceVersions};
pub use merge::{merge, merge_layers, MergedRule, MergedRuleSet};
pub use ordered::LastWins;
pub use report::{AggregationReport, LayerCount};
pub use rule::{
    is_reserved_domain, Rule, GROUP_MARKER_PREFIX, OPTIONS_PREFIX, REMOVE_SITES_KEY,
    SETTINGS_DOMAIN,
};
pub use source::{highest_upd_version, Layer, RuleSource};
pub use store::{ArtifactRevision, ArtifactStore, PublishOutcome, RawSources};
