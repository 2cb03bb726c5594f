use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Domain of a settings record preserved verbatim in the output.
pub const SETTINGS_DOMAIN: &str = "###";
/// Prefix of group-deletion markers (`###_<name>`).
pub const GROUP_MARKER_PREFIX: &str = "###_";
/// Prefix of option records that are never expanded from groups.
pub const OPTIONS_PREFIX: &str = "#options_";
/// Reserved key whose `cs_code` lists rule keys to delete.
pub const REMOVE_SITES_KEY: &str = "###_remove_sites";

pub(crate) const DOMAIN_FIELD: &str = "domain";
pub(crate) const GROUP_FIELD: &str = "group";
const DELETE_FIELD: &str = "delete";
const CS_CODE_FIELD: &str = "cs_code";

/// Whether the domain is a sentinel (`###...` or `#options_...`) rather than a target.
pub fn is_reserved_domain(domain: &str) -> bool {
    domain.starts_with(SETTINGS_DOMAIN) || domain.starts_with(OPTIONS_PREFIX)
}

/// Splits a comma separated list, trimming entries and skipping empty ones.
pub(crate) fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// A single rule record as authored in a rule source.
///
/// Only `domain`, `group`, `delete` and `cs_code` carry meaning for the engine.
/// Every other field is opaque payload kept in its original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    fields: Map<String, Value>,
}

impl Rule {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The `domain` field when it is a string.
    pub fn domain(&self) -> Option<&str> {
        self.fields.get(DOMAIN_FIELD).and_then(Value::as_str)
    }

    /// Whether a usable `group` field is present: a non-empty string or an array.
    pub fn has_group(&self) -> bool {
        match self.fields.get(GROUP_FIELD) {
            Some(Value::String(raw)) => !raw.is_empty(),
            Some(Value::Array(_)) => true,
            _ => false,
        }
    }

    /// Trimmed, non-empty domains listed in `group`, in authored order.
    ///
    /// Returns `None` when the record is not a group rule.
    pub fn group_domains(&self) -> Option<Vec<&str>> {
        match self.fields.get(GROUP_FIELD) {
            Some(Value::String(raw)) if !raw.is_empty() => Some(split_list(raw).collect()),
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            _ => None,
        }
    }

    /// `delete: true` marks the record for removal.
    pub fn is_flagged_deleted(&self) -> bool {
        matches!(self.fields.get(DELETE_FIELD), Some(Value::Bool(true)))
    }

    pub fn cs_code(&self) -> Option<&str> {
        self.fields.get(CS_CODE_FIELD).and_then(Value::as_str)
    }

    /// A `###_<name>` domain without a group asks for the matching group rule to be dropped.
    pub fn is_group_deletion_marker(&self) -> bool {
        !self.has_group()
            && self
                .domain()
                .is_some_and(|domain| domain.starts_with(GROUP_MARKER_PREFIX))
    }

    /// Copy of the record with the `group` field removed, keeping field order.
    pub fn without_group(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != GROUP_FIELD)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl From<Map<String, Value>> for Rule {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}

impl From<Value> for Rule {
    /// Non-object values become an empty record, which never emits output.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            _ => Self::default(),
        }
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Rule::from)
    }
}
