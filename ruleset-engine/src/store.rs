use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::RulesetEngine;
use crate::error::RuleError;
use crate::manifest::{ArtifactKind, Manifest, SourceVersions};
use crate::report::AggregationReport;
use crate::source::{highest_upd_version, Layer, RuleSource};

/// One published revision of an artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactRevision {
    pub revision: u32,
    pub content: String,
    pub published_at: DateTime<Utc>,
}

impl ArtifactRevision {
    fn new(revision: u32, content: String) -> Self {
        Self {
            revision,
            content,
            published_at: Utc::now(),
        }
    }
}

/// Raw JSON text of the three rule layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSources {
    pub base: String,
    pub updated: String,
    pub custom: String,
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub report: AggregationReport,
    /// Version stamped into the YAML export.
    pub version: Option<String>,
    pub published: Vec<(ArtifactKind, u32)>,
}

impl PublishOutcome {
    pub fn revision_of(&self, kind: ArtifactKind) -> Option<u32> {
        self.published
            .iter()
            .find(|(published, _)| *published == kind)
            .map(|(_, revision)| *revision)
    }
}

/// In-memory artifact store with per-artifact revision history.
///
/// Each artifact is replaced independently; there is no transaction across
/// artifacts, so readers must not assume one consistent snapshot.
#[derive(Default, Clone)]
pub struct ArtifactStore {
    inner: Arc<RwLock<HashMap<ArtifactKind, Vec<ArtifactRevision>>>>,
}

impl ArtifactStore {
    /// Creates a new empty artifact store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the artifacts currently published.
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let inner = self.inner.read();
        inner.keys().copied().collect()
    }

    /// Returns the latest revision of an artifact, if available.
    pub fn latest(&self, kind: ArtifactKind) -> Option<ArtifactRevision> {
        let inner = self.inner.read();
        inner.get(&kind).and_then(|history| history.last().cloned())
    }

    pub fn content(&self, kind: ArtifactKind) -> Option<String> {
        self.latest(kind).map(|revision| revision.content)
    }

    /// Returns the full history for an artifact.
    pub fn history(&self, kind: ArtifactKind) -> Vec<ArtifactRevision> {
        let inner = self.inner.read();
        inner.get(&kind).cloned().unwrap_or_default()
    }

    /// Replaces one artifact. Identical content keeps the current revision.
    pub fn put(&self, kind: ArtifactKind, content: impl Into<String>) -> ArtifactRevision {
        let content = content.into();
        let mut inner = self.inner.write();
        let history = inner.entry(kind).or_default();

        if let Some(latest) = history.last() {
            if latest.content == content {
                debug!(artifact = %kind, revision = latest.revision, "artifact unchanged");
                return latest.clone();
            }
        }

        let revision = history.last().map(|last| last.revision + 1).unwrap_or(1);
        let entry = ArtifactRevision::new(revision, content);
        history.push(entry.clone());
        debug!(artifact = %kind, revision, "artifact published");
        entry
    }

    /// Aggregates the raw layers and publishes every derived artifact.
    ///
    /// Nothing is written unless all three layers parse, so a broken input
    /// leaves the last published artifacts in place.
    pub fn publish_run(
        &self,
        engine: &RulesetEngine,
        raw: &RawSources,
        versions: &SourceVersions,
        base_url: &str,
    ) -> Result<PublishOutcome, RuleError> {
        let base = RuleSource::from_json(Layer::Base, &raw.base)?;
        let updated = RuleSource::from_json(Layer::Updated, &raw.updated)?;
        let custom = RuleSource::from_json(Layer::Custom, &raw.custom)?;

        let versions = SourceVersions {
            updated: versions
                .updated
                .clone()
                .or_else(|| highest_upd_version(&updated)),
            ..versions.clone()
        };
        let version = versions.highest();

        let run = engine.run(&base, &updated, &custom);
        let json = engine.to_json(&run)?;
        let yaml = engine.to_yaml(&run, version.as_deref())?;
        let manifest = Manifest::build(&versions, base_url)
            .map(|manifest| manifest.to_json())
            .transpose()?;

        let mut artifacts = vec![
            (ArtifactKind::SitesJson, raw.base.clone()),
            (ArtifactKind::SitesUpdatedJson, raw.updated.clone()),
            (ArtifactKind::SitesCustomJson, raw.custom.clone()),
            (ArtifactKind::SitesAggregatedJson, json),
            (ArtifactKind::SitesAggregatedYaml, yaml),
        ];
        if let Some(manifest) = manifest {
            artifacts.push((ArtifactKind::Manifest, manifest));
        }

        let published = artifacts
            .into_iter()
            .map(|(kind, content)| (kind, self.put(kind, content).revision))
            .collect();
        info!(version = ?version, records = run.report.final_records, "published aggregated artifacts");

        Ok(PublishOutcome {
            report: run.report,
            version,
            published,
        })
    }
}
