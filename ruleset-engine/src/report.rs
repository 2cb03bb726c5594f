use std::collections::HashSet;

use serde::Serialize;

use crate::aggregate::ExpansionStats;
use crate::deletion::DeletionSets;
use crate::merge::MergedRuleSet;
use crate::source::{Layer, RuleSource};

/// Rules contributed by one layer before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerCount {
    pub layer: Layer,
    pub rules: usize,
}

/// Summary of how one aggregation run shaped the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    pub layers: Vec<LayerCount>,
    pub merged_rules: usize,
    pub overridden_keys: usize,
    pub deleted_keys: usize,
    pub deleted_domains: usize,
    pub unmatched_markers: Vec<String>,
    pub expanded_groups: usize,
    pub emitted_records: usize,
    pub domain_collisions: usize,
    pub final_records: usize,
}

impl AggregationReport {
    pub(crate) fn new(
        sources: [&RuleSource; 3],
        merged: &MergedRuleSet,
        deletions: &DeletionSets,
        stats: ExpansionStats,
        final_records: usize,
    ) -> Self {
        // First occurrence order, each marker domain once.
        let mut seen = HashSet::new();
        let unmatched_markers = deletions
            .unmatched_markers
            .iter()
            .filter(|marker| seen.insert(marker.as_str()))
            .cloned()
            .collect();

        Self {
            layers: sources
                .iter()
                .map(|source| LayerCount {
                    layer: source.layer(),
                    rules: source.len(),
                })
                .collect(),
            merged_rules: merged.len(),
            overridden_keys: merged.overridden(),
            deleted_keys: deletions.keys.len(),
            deleted_domains: deletions.domains.len(),
            unmatched_markers,
            expanded_groups: stats.expanded_groups,
            emitted_records: stats.emitted_records,
            domain_collisions: stats.domain_collisions,
            final_records,
        }
    }

    pub fn layer_rules(&self, layer: Layer) -> usize {
        self.layers
            .iter()
            .filter(|count| count.layer == layer)
            .map(|count| count.rules)
            .sum()
    }

    pub fn has_unmatched_markers(&self) -> bool {
        !self.unmatched_markers.is_empty()
    }
}
