use std::env;

use tracing::debug;
use url::Url;

use crate::errors::ConfigError;

const DEFAULT_TOOL_NAME: &str = "Bypass";
const DEFAULT_SOURCE_URL: &str = "https://bypass.andrewe.dev";

/// Settings shared by the aggregation tooling.
#[derive(Debug, Clone)]
pub struct RulesetConfig {
    /// Tool identity printed in the first line of the YAML header.
    pub tool_name: String,
    /// Attribution URL printed in the YAML header.
    pub source_url: String,
    /// Base URL under which published artifacts are served, used by the manifest.
    pub public_base_url: String,
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            public_base_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

impl RulesetConfig {
    /// Loads configuration from the process environment using the `RULESET_` prefix.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("RULESET_")
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `RULESET_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let tool_name = env::var(key("TOOL_NAME"))
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());

        let source_key = key("SOURCE_URL");
        let source_url = match env::var(&source_key) {
            Ok(raw) => read_http_url(&source_key, &raw)?,
            Err(_) => DEFAULT_SOURCE_URL.to_string(),
        };

        let base_key = key("PUBLIC_BASE_URL");
        let public_base_url = match env::var(&base_key) {
            Ok(raw) => read_http_url(&base_key, &raw)?,
            Err(_) => source_url.clone(),
        };

        debug!(%tool_name, %source_url, "loaded ruleset configuration");
        Ok(Self {
            tool_name,
            source_url,
            public_base_url,
        })
    }
}

fn read_http_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unsupported scheme '{}'", other),
        }),
    }
}
