use std::fs;
use std::path::{Path, PathBuf};

use ruleset_core::{ConfigError, RulesetConfig};
use ruleset_engine::{
    highest_upd_version, version, AggregationReport, ArtifactKind, ExportOptions, Layer, Manifest,
    RuleError, RuleSource, RulesetEngine, SourceVersions,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration failed: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Inputs of one `ruleset aggregate` invocation.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    pub base: PathBuf,
    pub updated: PathBuf,
    pub custom: PathBuf,
    pub out_dir: PathBuf,
    pub sites_version: Option<String>,
    pub manifest_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AggregateSummary {
    pub report: AggregationReport,
    pub version: Option<String>,
    pub written: Vec<PathBuf>,
}

/// Loads the three layers, aggregates them and writes the artifacts.
///
/// All layers are parsed before anything is written, so a broken input never
/// replaces previously exported files.
pub fn aggregate(
    request: &AggregateRequest,
    config: &RulesetConfig,
) -> Result<AggregateSummary, CliError> {
    let base = RuleSource::load(Layer::Base, &request.base)?;
    let updated = RuleSource::load(Layer::Updated, &request.updated)?;
    let custom = RuleSource::load(Layer::Custom, &request.custom)?;

    let versions = SourceVersions {
        sites: request.sites_version.clone(),
        updated: highest_upd_version(&updated),
        remote_manifest: request.manifest_version.clone(),
    };
    let version = versions.highest();

    let engine = RulesetEngine::new(ExportOptions::from(config));
    let run = engine.run(&base, &updated, &custom);
    let json = engine.to_json(&run)?;
    let yaml = engine.to_yaml(&run, version.as_deref())?;
    let manifest = Manifest::build(&versions, &config.public_base_url)
        .map(|manifest| manifest.to_json())
        .transpose()?;

    fs::create_dir_all(&request.out_dir).map_err(|source| CliError::Write {
        path: request.out_dir.display().to_string(),
        source,
    })?;

    let mut written = vec![
        write_artifact(&request.out_dir, ArtifactKind::SitesAggregatedJson, &json)?,
        write_artifact(&request.out_dir, ArtifactKind::SitesAggregatedYaml, &yaml)?,
    ];
    if let Some(manifest) = manifest {
        written.push(write_artifact(&request.out_dir, ArtifactKind::Manifest, &manifest)?);
    }

    Ok(AggregateSummary {
        report: run.report,
        version,
        written,
    })
}

fn write_artifact(dir: &Path, kind: ArtifactKind, content: &str) -> Result<PathBuf, CliError> {
    let path = dir.join(kind.file_name());
    fs::write(&path, content).map_err(|source| CliError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!(artifact = %kind, path = %path.display(), "wrote artifact");
    Ok(path)
}

pub fn highest(versions: &[String]) -> Option<String> {
    version::highest(versions.iter().map(|v| Some(v.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    fn request(dir: &Path, custom: &str) -> AggregateRequest {
        AggregateRequest {
            base: write(dir, "sites.json", r#"{"g": {"domain": "g.example", "group": "x.com, y.com"}}"#),
            updated: write(
                dir,
                "sites_updated.json",
                r#"{"u": {"domain": "u.com", "upd_version": "4.2.10.0"}}"#,
            ),
            custom: write(dir, "sites_custom.json", custom),
            out_dir: dir.join("out"),
            sites_version: Some("4.2.1.8".into()),
            manifest_version: Some("4.2.2".into()),
        }
    }

    #[test]
    fn writes_json_yaml_and_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = aggregate(&request(dir.path(), "{}"), &RulesetConfig::default()).expect("aggregate");

        assert_eq!(summary.version.as_deref(), Some("4.2.10.0"));
        assert_eq!(summary.written.len(), 3);
        assert_eq!(summary.report.final_records, 4);

        let json = fs::read_to_string(dir.path().join("out/sites_aggregated.json")).expect("json");
        let records: serde_json::Value = serde_json::from_str(&json).expect("parse json");
        assert_eq!(records.as_array().map(Vec::len), Some(4));

        let yaml = fs::read_to_string(dir.path().join("out/sites_aggregated.yaml")).expect("yaml");
        assert!(yaml.starts_with("# Bypass \u{00B7} Aggregated Ruleset\n"));
        assert!(yaml.contains("# version: 4.2.10.0\n"));
    }

    #[test]
    fn broken_layer_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = aggregate(&request(dir.path(), "{oops"), &RulesetConfig::default()).unwrap_err();

        assert!(matches!(err, CliError::Rules(RuleError::Parse { layer: Layer::Custom, .. })));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn highest_ignores_blank_arguments() {
        let versions = vec!["".to_string(), "1.0".to_string(), "1.0.1".to_string()];
        assert_eq!(highest(&versions).as_deref(), Some("1.0.1"));
        assert_eq!(highest(&[]), None);
    }
}
