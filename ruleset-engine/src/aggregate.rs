use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::deletion::DeletionSets;
use crate::merge::MergedRuleSet;
use crate::ordered::LastWins;
use crate::rule::{is_reserved_domain, Rule, DOMAIN_FIELD, GROUP_MARKER_PREFIX};

/// Flattened output record: the source rule's payload with `group` removed
/// and `domain` set to the concrete target.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRule {
    domain: String,
    fields: Map<String, Value>,
}

impl AggregatedRule {
    /// Builds the record for one domain of a group rule.
    fn expanded(rule: &Rule, domain: &str) -> Self {
        let mut fields = rule.without_group();
        fields.insert(DOMAIN_FIELD.to_string(), Value::String(domain.to_string()));
        Self {
            domain: domain.to_string(),
            fields,
        }
    }

    /// Builds the record for a rule that already names its domain.
    fn verbatim(rule: &Rule, domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            fields: rule.without_group(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Serialize for AggregatedRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Ordered, domain-unique sequence of aggregated rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregatedOutput {
    rules: Vec<AggregatedRule>,
}

impl AggregatedOutput {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedRule> {
        self.rules.iter()
    }

    pub fn get(&self, domain: &str) -> Option<&AggregatedRule> {
        self.rules.iter().find(|rule| rule.domain == domain)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(AggregatedRule::domain)
    }

    pub fn into_rules(self) -> Vec<AggregatedRule> {
        self.rules
    }
}

/// Counters collected while expanding and aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub expanded_groups: usize,
    pub emitted_records: usize,
    pub domain_collisions: usize,
    pub filtered_records: usize,
}

/// Expands groups and assembles the final domain-unique output.
pub fn aggregate(merged: &MergedRuleSet, deletions: &DeletionSets) -> AggregatedOutput {
    aggregate_with_stats(merged, deletions).0
}

pub fn aggregate_with_stats(
    merged: &MergedRuleSet,
    deletions: &DeletionSets,
) -> (AggregatedOutput, ExpansionStats) {
    let mut stats = ExpansionStats::default();
    let mut by_domain: LastWins<AggregatedRule> = LastWins::new();
    let mut emit = |record: AggregatedRule, stats: &mut ExpansionStats| {
        stats.emitted_records += 1;
        if by_domain.insert(record.domain.clone(), record).is_some() {
            stats.domain_collisions += 1;
        }
    };

    for (key, rule) in merged.iter() {
        if deletions.is_key_deleted(key) || deletions.is_domain_deleted(rule.domain()) {
            continue;
        }

        match rule.group_domains() {
            Some(group) => {
                stats.expanded_groups += 1;
                for domain in group {
                    if deletions.is_domain_deleted(Some(domain)) || is_reserved_domain(domain) {
                        continue;
                    }
                    emit(AggregatedRule::expanded(rule, domain), &mut stats);
                }

                if let Some(umbrella) = umbrella_domain(rule, deletions) {
                    emit(AggregatedRule::verbatim(rule, umbrella), &mut stats);
                }
            }
            None => {
                // Settings records (`###`) and single-domain rules pass through as-is.
                // Group-deletion markers are instructions and never become records.
                if let Some(domain) = rule
                    .domain()
                    .filter(|domain| !domain.is_empty() && !domain.starts_with(GROUP_MARKER_PREFIX))
                {
                    emit(AggregatedRule::verbatim(rule, domain), &mut stats);
                }
            }
        }
    }

    let rules: Vec<AggregatedRule> = by_domain
        .into_values()
        .filter(|record| {
            let keep = !deletions.domains.contains(&record.domain);
            if !keep {
                stats.filtered_records += 1;
            }
            keep
        })
        .collect();

    debug!(
        emitted = stats.emitted_records,
        collisions = stats.domain_collisions,
        records = rules.len(),
        "aggregated rules"
    );
    (AggregatedOutput { rules }, stats)
}

/// The group rule's own domain, when it names a concrete, surviving target.
fn umbrella_domain<'a>(rule: &'a Rule, deletions: &DeletionSets) -> Option<&'a str> {
    rule.domain().filter(|domain| {
        !domain.is_empty()
            && !domain.starts_with(GROUP_MARKER_PREFIX)
            && !is_reserved_domain(domain)
            && !deletions.domains.contains(*domain)
    })
}
