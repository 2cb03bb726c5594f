use tracing::{info, warn};

use crate::aggregate::{aggregate_with_stats, AggregatedOutput};
use crate::deletion::{resolve_deletions, DeletionSets};
use crate::error::RuleError;
use crate::export::{ExportOptions, Exporter};
use crate::merge::{merge, MergedRuleSet};
use crate::report::AggregationReport;
use crate::source::{Layer, RuleSource};

/// Every intermediate stage of one aggregation, kept for inspection.
#[derive(Debug, Clone)]
pub struct AggregationRun {
    pub merged: MergedRuleSet,
    pub deletions: DeletionSets,
    pub output: AggregatedOutput,
    pub report: AggregationReport,
}

/// Runs the merge, deletion, expansion pipeline and exports its result.
///
/// The engine holds no state between runs; the same inputs always produce
/// the same output.
#[derive(Debug, Clone, Default)]
pub struct RulesetEngine {
    exporter: Exporter,
}

impl RulesetEngine {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            exporter: Exporter::new(options),
        }
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Aggregates three already parsed layers.
    pub fn run(
        &self,
        base: &RuleSource,
        updated: &RuleSource,
        custom: &RuleSource,
    ) -> AggregationRun {
        let merged = merge(base, updated, custom);
        let deletions = resolve_deletions(&merged);
        let (output, stats) = aggregate_with_stats(&merged, &deletions);
        let report =
            AggregationReport::new([base, updated, custom], &merged, &deletions, stats, output.len());

        if report.has_unmatched_markers() {
            warn!(markers = ?report.unmatched_markers, "some group deletion markers had no effect");
        }
        info!(
            merged = report.merged_rules,
            deleted_keys = report.deleted_keys,
            deleted_domains = report.deleted_domains,
            records = report.final_records,
            "aggregation finished"
        );

        AggregationRun {
            merged,
            deletions,
            output,
            report,
        }
    }

    /// Parses the three layers from JSON text and aggregates them.
    ///
    /// A broken layer fails the whole run before any aggregation happens.
    pub fn run_json(
        &self,
        base: &str,
        updated: &str,
        custom: &str,
    ) -> Result<AggregationRun, RuleError> {
        let base = RuleSource::from_json(Layer::Base, base)?;
        let updated = RuleSource::from_json(Layer::Updated, updated)?;
        let custom = RuleSource::from_json(Layer::Custom, custom)?;
        Ok(self.run(&base, &updated, &custom))
    }

    pub fn to_json(&self, run: &AggregationRun) -> Result<String, RuleError> {
        self.exporter.to_json(&run.output)
    }

    pub fn to_yaml(&self, run: &AggregationRun, version: Option<&str>) -> Result<String, RuleError> {
        self.exporter.to_yaml(&run.output, version)
    }
}

/// Text in, pretty JSON array out.
pub fn generate_aggregated_json(
    base: &str,
    updated: &str,
    custom: &str,
) -> Result<String, RuleError> {
    let engine = RulesetEngine::default();
    let run = engine.run_json(base, updated, custom)?;
    engine.to_json(&run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_reflects_pipeline() {
        let base = json!({
            "a": {"domain": "a.com"},
            "g": {"domain": "###_g", "group": ["x.com", "y.com"]},
        });
        let updated = json!({"a": {"domain": "a.com", "upd_version": "1.0"}});
        let custom = json!({
            "drop": {"domain": "###_g"},
            "stray": {"domain": "###_nothing"},
        });

        let run = RulesetEngine::default()
            .run_json(&base.to_string(), &updated.to_string(), &custom.to_string())
            .expect("run");

        assert_eq!(run.report.layer_rules(Layer::Base), 2);
        assert_eq!(run.report.merged_rules, 4);
        assert_eq!(run.report.overridden_keys, 1);
        assert_eq!(run.report.deleted_keys, 1);
        assert_eq!(run.report.unmatched_markers, vec!["###_nothing".to_string()]);
        assert_eq!(run.report.final_records, run.output.len());
        assert!(run.output.get("x.com").is_none());
        assert!(run.output.get("###_g").is_none());
        assert!(run.output.get("###_nothing").is_none());
    }

    #[test]
    fn broken_layer_fails_fast() {
        let err = generate_aggregated_json("{}", "{not json", "{}").unwrap_err();
        assert!(matches!(err, RuleError::Parse { layer: Layer::Updated, .. }));
    }

    #[test]
    fn identical_inputs_give_identical_json() {
        let base = json!({
            "g": {"domain": "g.example", "group": "x.com, y.com"},
            "s": {"domain": "s.com"},
        })
        .to_string();
        let custom = json!({"###_remove_sites": {"domain": "###", "cs_code": "s"}}).to_string();

        let first = generate_aggregated_json(&base, "{}", &custom).expect("first");
        let second = generate_aggregated_json(&base, "{}", &custom).expect("second");
        assert_eq!(first, second);
        assert!(!first.contains("s.com"));
        assert!(first.contains("g.example"));
    }
}
