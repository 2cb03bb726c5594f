use chrono::{DateTime, SecondsFormat, Utc};
use ruleset_core::serde_utils::to_pretty_json;
use ruleset_core::RulesetConfig;
use tracing::debug;

use crate::aggregate::AggregatedOutput;
use crate::error::RuleError;

/// Identity and attribution written into the YAML header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub tool_name: String,
    pub source_url: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        RulesetConfig::default().into()
    }
}

impl From<RulesetConfig> for ExportOptions {
    fn from(config: RulesetConfig) -> Self {
        Self {
            tool_name: config.tool_name,
            source_url: config.source_url,
        }
    }
}

impl From<&RulesetConfig> for ExportOptions {
    fn from(config: &RulesetConfig) -> Self {
        config.clone().into()
    }
}

/// Serializes aggregated output to pretty JSON and to YAML with a header.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Pretty-printed JSON array with two-space indentation.
    pub fn to_json(&self, output: &AggregatedOutput) -> Result<String, RuleError> {
        to_json(output)
    }

    /// YAML document stamped with the current time.
    pub fn to_yaml(
        &self,
        output: &AggregatedOutput,
        version: Option<&str>,
    ) -> Result<String, RuleError> {
        self.to_yaml_at(output, version, Utc::now())
    }

    pub fn to_yaml_at(
        &self,
        output: &AggregatedOutput,
        version: Option<&str>,
        generated_at: DateTime<Utc>,
    ) -> Result<String, RuleError> {
        let body = serde_yaml::to_string(output)
            .map_err(|err| RuleError::export_error("yaml", err.to_string()))?;
        let mut document = self.header(version, generated_at);
        document.push_str(&body);
        debug!(records = output.len(), bytes = document.len(), "rendered yaml export");
        Ok(document)
    }

    /// Fixed comment block preceding the YAML body, ending with a blank line.
    pub fn header(&self, version: Option<&str>, generated_at: DateTime<Utc>) -> String {
        let mut header = format!("# {} \u{00B7} Aggregated Ruleset\n", self.options.tool_name);
        header.push_str(&format!(
            "# generated: {}\n",
            generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        if let Some(version) = version.filter(|version| !version.is_empty()) {
            header.push_str(&format!("# version: {}\n", version));
        }
        header.push_str(&format!("# source: {}\n", self.options.source_url));
        header.push('\n');
        header
    }
}

/// Pretty-printed JSON array with two-space indentation.
pub fn to_json(output: &AggregatedOutput) -> Result<String, RuleError> {
    to_pretty_json(output).map_err(|err| RuleError::export_error("json", err.to_string()))
}
