use std::fmt;

use ruleset_core::serde_utils::to_pretty_json;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::version;

/// Every artifact published by an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SitesJs,
    SitesJson,
    SitesUpdatedJson,
    SitesCustomJson,
    SitesAggregatedJson,
    SitesAggregatedYaml,
    Manifest,
}

impl ArtifactKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::SitesJs => "sites.js",
            ArtifactKind::SitesJson => "sites.json",
            ArtifactKind::SitesUpdatedJson => "sites_updated.json",
            ArtifactKind::SitesCustomJson => "sites_custom.json",
            ArtifactKind::SitesAggregatedJson => "sites_aggregated.json",
            ArtifactKind::SitesAggregatedYaml => "sites_aggregated.yaml",
            ArtifactKind::Manifest => "manifest.json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::SitesJs => "application/javascript",
            ArtifactKind::SitesAggregatedYaml => "text/yaml; charset=utf-8",
            _ => "application/json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Versions known for the upstream sources of one update run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceVersions {
    /// Version of the extension release that shipped the base rules.
    pub sites: Option<String>,
    /// Highest `upd_version` found in the updated overlay.
    pub updated: Option<String>,
    /// Version declared by the remote repository manifest.
    pub remote_manifest: Option<String>,
}

impl SourceVersions {
    /// Highest of all known versions, used to stamp aggregated artifacts.
    pub fn highest(&self) -> Option<String> {
        version::highest([
            self.sites.as_deref(),
            self.updated.as_deref(),
            self.remote_manifest.as_deref(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub version: Option<String>,
    pub url: String,
}

/// Summary of published artifact versions and URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub sites_js: ManifestEntry,
    pub sites_json: ManifestEntry,
    pub sites_updated_json: ManifestEntry,
    pub sites_custom_json: ManifestEntry,
    pub sites_aggregated_json: ManifestEntry,
    pub sites_aggregated_yaml: ManifestEntry,
}

impl Manifest {
    /// Builds the manifest, or `None` while the sites or remote manifest
    /// version is still unknown.
    pub fn build(versions: &SourceVersions, base_url: &str) -> Option<Self> {
        let sites = versions.sites.clone().filter(|v| !v.is_empty())?;
        let remote = versions.remote_manifest.clone().filter(|v| !v.is_empty())?;
        let updated = versions
            .updated
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| remote.clone());
        let aggregated = versions.highest();

        let base_url = base_url.trim_end_matches('/');
        let entry = |kind: ArtifactKind, version: Option<String>| ManifestEntry {
            version,
            url: format!("{}/{}", base_url, kind.file_name()),
        };

        Some(Self {
            sites_js: entry(ArtifactKind::SitesJs, Some(sites.clone())),
            sites_json: entry(ArtifactKind::SitesJson, Some(sites)),
            sites_updated_json: entry(ArtifactKind::SitesUpdatedJson, Some(updated)),
            sites_custom_json: entry(ArtifactKind::SitesCustomJson, Some(remote)),
            sites_aggregated_json: entry(ArtifactKind::SitesAggregatedJson, aggregated.clone()),
            sites_aggregated_yaml: entry(ArtifactKind::SitesAggregatedYaml, aggregated),
        })
    }

    pub fn to_json(&self) -> Result<String, RuleError> {
        to_pretty_json(self)
            .map_err(|err| RuleError::export_error("json", err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(sites: Option<&str>, updated: Option<&str>, remote: Option<&str>) -> SourceVersions {
        SourceVersions {
            sites: sites.map(str::to_string),
            updated: updated.map(str::to_string),
            remote_manifest: remote.map(str::to_string),
        }
    }

    #[test]
    fn requires_sites_and_remote_versions() {
        assert!(Manifest::build(&versions(None, Some("1.0"), Some("1.0")), "https://x.org").is_none());
        assert!(Manifest::build(&versions(Some("1.0"), None, None), "https://x.org").is_none());
    }

    #[test]
    fn aggregated_artifacts_carry_highest_version() {
        let manifest = Manifest::build(
            &versions(Some("4.2.1.8"), Some("4.2.10.0"), Some("4.2.2")),
            "https://rules.example.org/",
        )
        .expect("manifest");

        assert_eq!(manifest.sites_js.version.as_deref(), Some("4.2.1.8"));
        assert_eq!(manifest.sites_updated_json.version.as_deref(), Some("4.2.10.0"));
        assert_eq!(manifest.sites_custom_json.version.as_deref(), Some("4.2.2"));
        assert_eq!(manifest.sites_aggregated_yaml.version.as_deref(), Some("4.2.10.0"));
        assert_eq!(
            manifest.sites_aggregated_json.url,
            "https://rules.example.org/sites_aggregated.json"
        );
    }

    #[test]
    fn updated_version_falls_back_to_remote_manifest() {
        let manifest =
            Manifest::build(&versions(Some("1.0"), None, Some("1.1")), "https://x.org").expect("manifest");
        assert_eq!(manifest.sites_updated_json.version.as_deref(), Some("1.1"));
    }

    #[test]
    fn serializes_with_artifact_keys() {
        let manifest =
            Manifest::build(&versions(Some("1.0"), None, Some("1.0")), "https://x.org").expect("manifest");
        let value: serde_json::Value =
            serde_json::from_str(&manifest.to_json().expect("json")).expect("parse");
        assert_eq!(value["sites_js"]["url"], "https://x.org/sites.js");
        assert_eq!(value["sites_aggregated_yaml"]["version"], "1.0");
    }
}
