use tracing::debug;

use crate::ordered::LastWins;
use crate::rule::Rule;
use crate::source::{Layer, RuleSource};

/// A rule after layer merging, together with the layer that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRule {
    pub layer: Layer,
    pub rule: Rule,
}

/// Immutable snapshot of all layers folded into one keyed set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRuleSet {
    rules: LastWins<MergedRule>,
    overridden: usize,
}

impl MergedRuleSet {
    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key).map(|merged| &merged.rule)
    }

    /// The layer whose record survived for `key`.
    pub fn origin(&self, key: &str) -> Option<Layer> {
        self.rules.get(key).map(|merged| merged.layer)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of keys whose record was replaced by a higher layer.
    pub fn overridden(&self) -> usize {
        self.overridden
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(key, merged)| (key, &merged.rule))
    }
}

/// Merges the three layers with custom over updated over base.
pub fn merge(base: &RuleSource, updated: &RuleSource, custom: &RuleSource) -> MergedRuleSet {
    merge_layers([base, updated, custom])
}

/// Folds layers left to right. A later layer replaces a whole record; a key
/// keeps the position of the layer that introduced it first.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a RuleSource>) -> MergedRuleSet {
    let mut merged = MergedRuleSet::default();

    for source in layers {
        let layer = source.layer();
        for (key, rule) in source.iter() {
            let entry = MergedRule {
                layer,
                rule: rule.clone(),
            };
            if merged.rules.insert(key, entry).is_some() {
                merged.overridden += 1;
            }
        }
        debug!(%layer, rules = source.len(), merged = merged.len(), "merged rule layer");
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(layer: Layer, value: serde_json::Value) -> RuleSource {
        RuleSource::from_json(layer, &value.to_string()).expect("valid source")
    }

    #[test]
    fn custom_replaces_whole_record() {
        let base = source(Layer::Base, json!({"k": {"domain": "k.com", "a": 1, "b": 2}}));
        let updated = source(Layer::Updated, json!({}));
        let custom = source(Layer::Custom, json!({"k": {"domain": "k.com", "c": 3}}));

        let merged = merge(&base, &updated, &custom);
        let rule = merged.get("k").expect("merged rule");
        assert_eq!(rule.get("c"), Some(&json!(3)));
        assert!(rule.get("a").is_none());
        assert_eq!(merged.origin("k"), Some(Layer::Custom));
        assert_eq!(merged.overridden(), 1);
    }

    #[test]
    fn custom_wins_over_updated_and_base() {
        let base = source(Layer::Base, json!({"k": {"domain": "k.com", "v": "base"}}));
        let updated = source(Layer::Updated, json!({"k": {"domain": "k.com", "v": "updated"}}));
        let custom = source(Layer::Custom, json!({"k": {"domain": "k.com", "v": "custom"}}));

        let merged = merge(&base, &updated, &custom);
        assert_eq!(merged.get("k").and_then(|r| r.get("v")), Some(&json!("custom")));
        assert_eq!(merged.overridden(), 2);
    }

    #[test]
    fn position_follows_first_appearance() {
        let base = source(Layer::Base, json!({"b1": {}, "shared": {}, "b2": {}}));
        let updated = source(Layer::Updated, json!({"u1": {}, "shared": {"domain": "s.com"}}));
        let custom = source(Layer::Custom, json!({"c1": {}, "b1": {"domain": "b.com"}}));

        let merged = merge(&base, &updated, &custom);
        let keys: Vec<&str> = merged.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["b1", "shared", "b2", "u1", "c1"]);
        assert_eq!(merged.origin("b1"), Some(Layer::Custom));
        assert_eq!(merged.origin("shared"), Some(Layer::Updated));
    }

    #[test]
    fn empty_layers_merge_to_empty_set() {
        let merged = merge(
            &RuleSource::new(Layer::Base),
            &RuleSource::new(Layer::Updated),
            &RuleSource::new(Layer::Custom),
        );
        assert!(merged.is_empty());
    }
}
