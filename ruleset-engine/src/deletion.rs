use std::collections::HashSet;

use tracing::{debug, warn};

use crate::merge::MergedRuleSet;
use crate::rule::{split_list, Rule, REMOVE_SITES_KEY, SETTINGS_DOMAIN};

/// Keys to drop entirely and domains to suppress wherever they appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionSets {
    pub keys: HashSet<String>,
    pub domains: HashSet<String>,
    /// Group-deletion marker domains for which no group rule exists.
    pub unmatched_markers: Vec<String>,
}

impl DeletionSets {
    pub fn is_key_deleted(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Whether an optional domain is suppressed. An absent domain never is.
    pub fn is_domain_deleted(&self, domain: Option<&str>) -> bool {
        domain.is_some_and(|domain| self.domains.contains(domain))
    }
}

/// Computes both deletion sets from an immutable merged snapshot.
///
/// Key matching is exact and case-sensitive on every path.
pub fn resolve_deletions(merged: &MergedRuleSet) -> DeletionSets {
    let mut sets = DeletionSets::default();

    if let Some(cs_code) = merged.get(REMOVE_SITES_KEY).and_then(Rule::cs_code) {
        sets.keys.extend(split_list(cs_code).map(str::to_string));
    }

    for (key, rule) in merged.iter() {
        if is_self_deleting(key, rule) {
            sets.keys.insert(key.to_string());
        }
    }

    for (_, marker) in merged.iter().filter(|(_, rule)| rule.is_group_deletion_marker()) {
        let Some(marker_domain) = marker.domain() else {
            continue;
        };
        match first_group_with_domain(merged, marker_domain) {
            Some(group_key) => {
                debug!(marker = marker_domain, group_key, "group deletion marker matched");
                sets.keys.insert(group_key.to_string());
            }
            None => {
                warn!(marker = marker_domain, "group deletion marker matched no group rule");
                sets.unmatched_markers.push(marker_domain.to_string());
            }
        }
    }

    for key in &sets.keys {
        if let Some(domains) = merged.get(key).and_then(Rule::group_domains) {
            sets.domains.extend(domains.into_iter().map(str::to_string));
        }
        // Keys double as domains: a deleted `example.com` key suppresses `example.com`.
        sets.domains.insert(key.clone());
    }

    debug!(
        keys = sets.keys.len(),
        domains = sets.domains.len(),
        "resolved deletion sets"
    );
    sets
}

fn is_self_deleting(key: &str, rule: &Rule) -> bool {
    match rule.domain() {
        Some("") => true,
        Some(SETTINGS_DOMAIN) if key == REMOVE_SITES_KEY => true,
        _ => rule.is_flagged_deleted(),
    }
}

/// Only the first group rule sharing the marker domain is removed, even when
/// several share it.
fn first_group_with_domain<'a>(merged: &'a MergedRuleSet, domain: &str) -> Option<&'a str> {
    merged
        .iter()
        .find(|(_, rule)| rule.has_group() && rule.domain() == Some(domain))
        .map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::source::{Layer, RuleSource};
    use serde_json::{json, Value};

    fn merged(custom: Value) -> MergedRuleSet {
        let custom = RuleSource::from_json(Layer::Custom, &custom.to_string()).expect("valid");
        merge(
            &RuleSource::new(Layer::Base),
            &RuleSource::new(Layer::Updated),
            &custom,
        )
    }

    #[test]
    fn cs_code_tokens_are_trimmed_and_skipped_when_empty() {
        let sets = resolve_deletions(&merged(json!({
            "###_remove_sites": {"domain": "###", "cs_code": " siteA, ,siteB,"},
        })));

        assert!(sets.is_key_deleted("siteA"));
        assert!(sets.is_key_deleted("siteB"));
        assert!(sets.is_key_deleted("###_remove_sites"));
        assert!(!sets.is_key_deleted(""));
        assert_eq!(sets.keys.len(), 3);
    }

    #[test]
    fn cs_code_matching_is_case_sensitive() {
        let sets = resolve_deletions(&merged(json!({
            "###_remove_sites": {"domain": "###", "cs_code": "SiteA"},
            "sitea": {"domain": "sitea.com"},
        })));
        assert!(!sets.is_key_deleted("sitea"));
    }

    #[test]
    fn empty_domain_and_delete_flag_mark_keys() {
        let sets = resolve_deletions(&merged(json!({
            "blank": {"domain": ""},
            "flagged": {"domain": "flagged.com", "delete": true},
            "kept": {"domain": "kept.com", "delete": false},
            "settings": {"domain": "###"},
        })));

        assert!(sets.is_key_deleted("blank"));
        assert!(sets.is_key_deleted("flagged"));
        assert!(!sets.is_key_deleted("kept"));
        assert!(!sets.is_key_deleted("settings"));
    }

    #[test]
    fn marker_deletes_group_and_cascades_its_domains() {
        let sets = resolve_deletions(&merged(json!({
            "K": {"domain": "###_K", "group": ["a.com", " b.com"]},
            "marker": {"domain": "###_K"},
        })));

        assert!(sets.is_key_deleted("K"));
        assert!(!sets.is_key_deleted("marker"));
        assert!(sets.is_domain_deleted(Some("a.com")));
        assert!(sets.is_domain_deleted(Some("b.com")));
        assert!(sets.is_domain_deleted(Some("K")));
        assert!(sets.unmatched_markers.is_empty());
    }

    #[test]
    fn marker_only_removes_first_matching_group() {
        let sets = resolve_deletions(&merged(json!({
            "first": {"domain": "###_shared", "group": "a.com"},
            "second": {"domain": "###_shared", "group": "b.com"},
            "marker": {"domain": "###_shared"},
        })));

        assert!(sets.is_key_deleted("first"));
        assert!(!sets.is_key_deleted("second"));
        assert!(!sets.is_domain_deleted(Some("b.com")));
    }

    #[test]
    fn unmatched_marker_is_recorded() {
        let sets = resolve_deletions(&merged(json!({
            "marker": {"domain": "###_missing"},
        })));
        assert_eq!(sets.unmatched_markers, vec!["###_missing".to_string()]);
        assert!(sets.keys.is_empty());
    }

    #[test]
    fn cs_code_keys_without_records_still_suppress_domains() {
        let sets = resolve_deletions(&merged(json!({
            "###_remove_sites": {"domain": "###", "cs_code": "ghost.com"},
        })));
        assert!(sets.is_domain_deleted(Some("ghost.com")));
        assert!(!sets.is_domain_deleted(None));
    }
}
