use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::RuleError;
use crate::ordered::LastWins;
use crate::rule::Rule;
use crate::version;

const UPD_VERSION_FIELD: &str = "upd_version";

/// The three independently maintained rule layers, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Base,
    Updated,
    Custom,
}

impl Layer {
    /// Every layer in merge order: later layers override earlier ones.
    pub const ALL: [Layer; 3] = [Layer::Base, Layer::Updated, Layer::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Base => "base",
            Layer::Updated => "updated",
            Layer::Custom => "custom",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping of rule keys to rules for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSource {
    layer: Layer,
    rules: LastWins<Rule>,
}

impl RuleSource {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            rules: LastWins::new(),
        }
    }

    /// Builder-style insert, mostly useful for assembling fixtures in code.
    pub fn with_rule(mut self, key: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.insert(key, rule);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, rule: impl Into<Rule>) -> Option<Rule> {
        self.rules.insert(key, rule.into())
    }

    /// Parses one layer from JSON text, keeping the key order of the document.
    pub fn from_json(layer: Layer, raw: &str) -> Result<Self, RuleError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| RuleError::parse_error(layer, err.to_string()))?;
        let Value::Object(object) = value else {
            return Err(RuleError::NotAnObject { layer });
        };

        if let Some(message) = converter_failure(&object) {
            return Err(RuleError::ConverterFailure { layer, message });
        }

        let rules: LastWins<Rule> = object
            .into_iter()
            .map(|(key, value)| (key, Rule::from(value)))
            .collect();
        debug!(%layer, rules = rules.len(), "parsed rule source");

        Ok(Self { layer, rules })
    }

    /// Reads and parses one layer from a file on disk.
    pub fn load(layer: Layer, path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RuleError::MissingPath(path.display().to_string()));
        }
        let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
        Self::from_json(layer, &raw)
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter()
    }

    /// Every string `upd_version` field, in source order.
    pub fn upd_versions(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter_map(|(_, rule)| rule.get(UPD_VERSION_FIELD).and_then(Value::as_str))
    }
}

/// Highest `upd_version` carried by any record of the source.
pub fn highest_upd_version(source: &RuleSource) -> Option<String> {
    version::highest(source.upd_versions().map(Some))
}

/// The script converter reports failures as `{error, message, stack}` (or
/// `{error, raw_error}`) instead of a ruleset. Rule values are always objects,
/// so a string `error` member identifies such a report.
fn converter_failure(object: &Map<String, Value>) -> Option<String> {
    let error = object.get("error")?.as_str()?;
    let detail = object
        .get("message")
        .or_else(|| object.get("raw_error"))
        .and_then(Value::as_str);

    Some(match detail {
        Some(detail) => format!("{}: {}", error, detail),
        None => error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn keeps_document_order() {
        let source = RuleSource::from_json(
            Layer::Base,
            r#"{"zeta": {"domain": "z.com"}, "alpha": {"domain": "a.com"}, "mid": {"domain": "m.com"}}"#,
        )
        .expect("parse");

        let keys: Vec<&str> = source.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(source.layer(), Layer::Base);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = RuleSource::from_json(Layer::Custom, "{\"broken\": ").unwrap_err();
        assert!(matches!(err, RuleError::Parse { layer: Layer::Custom, .. }));
    }

    #[test]
    fn rejects_non_object_root() {
        let err = RuleSource::from_json(Layer::Updated, "[]").unwrap_err();
        assert!(matches!(err, RuleError::NotAnObject { layer: Layer::Updated }));
    }

    #[test]
    fn rejects_converter_failure_report() {
        let raw = r#"{"error": "AST conversion failed", "message": "Unexpected token", "stack": "..."}"#;
        let err = RuleSource::from_json(Layer::Base, raw).unwrap_err();
        match err {
            RuleError::ConverterFailure { layer, message } => {
                assert_eq!(layer, Layer::Base);
                assert_eq!(message, "AST conversion failed: Unexpected token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn extracts_highest_upd_version() {
        let source = RuleSource::from_json(
            Layer::Updated,
            r#"{
                "a": {"domain": "a.com", "upd_version": "4.2.1.8"},
                "b": {"domain": "b.com", "upd_version": "4.2.10.0"},
                "c": {"domain": "c.com", "upd_version": 5},
                "d": {"domain": "d.com"}
            }"#,
        )
        .expect("parse");

        assert_eq!(
            source.upd_versions().collect::<Vec<_>>(),
            vec!["4.2.1.8", "4.2.10.0"]
        );
        assert_eq!(highest_upd_version(&source).as_deref(), Some("4.2.10.0"));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"example": {{"domain": "example.com"}}}}"#).expect("write");

        let source = RuleSource::load(Layer::Custom, file.path()).expect("load");
        assert_eq!(source.len(), 1);
        assert_eq!(
            source.get("example").and_then(Rule::domain),
            Some("example.com")
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let err = RuleSource::load(Layer::Base, "/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RuleError::MissingPath(_)));
    }
}
