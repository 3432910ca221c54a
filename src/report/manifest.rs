//! Consolidated manifest
//!
//! A single JSON document with the run metadata, the static configuration
//! tables and every enriched record keyed `day_N`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::audit::AuditResults;
use crate::config::{EngineConfig, ShadowingConfig};
use crate::curriculum::{Stage, StageModel};
use crate::taxonomy::{TechniqueRule, TechniqueTaxonomy};
use crate::types::{Day, StageId};

const FRAMEWORKS_APPLIED: [&str; 3] = [
    "Processability Theory (Pienemann)",
    "Noticing Hypothesis (Schmidt)",
    "Shadowing Mode (Phonological Loop)",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    pub curriculum_version: String,
    pub generated_date: DateTime<Utc>,
    pub preservation_mode: bool,
    pub frameworks_applied: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub total_days: usize,
    pub stages_covered: Vec<StageId>,
    pub drill_days: usize,
    pub total_drill_phrases: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfigurations<'a> {
    pub stages: Vec<&'a Stage>,
    pub techniques: &'a [TechniqueRule],
    pub drills: &'a ShadowingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest<'a> {
    pub metadata: ManifestMetadata,
    pub summary: ManifestSummary,
    pub configurations: ManifestConfigurations<'a>,
    pub days: Map<String, Value>,
}

impl<'a> Manifest<'a> {
    pub fn build(
        audit: &AuditResults,
        records: &BTreeMap<Day, Value>,
        stages: &'a StageModel,
        taxonomy: &'a TechniqueTaxonomy,
        config: &'a EngineConfig,
    ) -> Self {
        let mut stages_covered: Vec<StageId> = audit
            .alignment
            .results
            .values()
            .map(|r| r.declared_stage)
            .collect();
        stages_covered.sort_unstable();
        stages_covered.dedup();

        let days = records
            .iter()
            .map(|(day, record)| (format!("day_{}", day), record.clone()))
            .collect();

        Self {
            metadata: ManifestMetadata {
                curriculum_version: config.output.curriculum_version.clone(),
                generated_date: audit.summary.generated_at,
                preservation_mode: audit.summary.preservation_mode,
                frameworks_applied: FRAMEWORKS_APPLIED.iter().map(|s| s.to_string()).collect(),
            },
            summary: ManifestSummary {
                total_days: audit.alignment.total_days,
                stages_covered,
                drill_days: audit.drills.days_with_drills,
                total_drill_phrases: audit.drills.total_phrases_needed,
            },
            configurations: ManifestConfigurations {
                stages: stages.iter().collect(),
                techniques: taxonomy.rules(),
                drills: &config.shadowing,
            },
            days,
        }
    }

    /// Write the manifest as pretty JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        info!("Wrote manifest with {} days to {}", self.days.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::UnitRegistry;
    use crate::enrich::EnrichmentPipeline;

    #[test]
    fn test_manifest_layout() {
        let units = UnitRegistry::builtin();
        let stages = StageModel::builtin();
        let taxonomy = TechniqueTaxonomy::builtin();
        let config = EngineConfig::default();
        let pipeline = EnrichmentPipeline::new(&units, &stages, &taxonomy, &config);
        let audit = pipeline.audit(Utc::now()).unwrap();
        let records = pipeline.preview(&audit, Utc::now()).unwrap();

        let manifest = Manifest::build(&audit, &records, &stages, &taxonomy, &config);
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["metadata"]["curriculumVersion"], "2.0-PT-Noticing-Shadowing");
        assert_eq!(value["metadata"]["preservationMode"], true);
        assert_eq!(value["summary"]["totalDays"], 30);
        assert_eq!(value["summary"]["stagesCovered"], serde_json::json!([1, 2, 3, 4, 5, 6]));
        assert_eq!(value["summary"]["drillDays"], 24);
        assert_eq!(value["summary"]["totalDrillPhrases"], 168);
        assert_eq!(value["configurations"]["stages"].as_array().unwrap().len(), 6);
        assert_eq!(value["configurations"]["techniques"].as_array().unwrap().len(), 6);
        assert_eq!(value["configurations"]["drills"]["unlock_day"], 7);

        let days = value["days"].as_object().unwrap();
        assert_eq!(days.len(), 30);
        assert_eq!(days.keys().next().unwrap(), "day_1");
        assert_eq!(days["day_7"]["shadowingMode"]["phrases"][0]["id"], "day7_shadow_01");
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let units = UnitRegistry::builtin();
        let stages = StageModel::builtin();
        let taxonomy = TechniqueTaxonomy::builtin();
        let config = EngineConfig::default();
        let pipeline = EnrichmentPipeline::new(&units, &stages, &taxonomy, &config);
        let audit = pipeline.audit(Utc::now()).unwrap();

        let path = dir.path().join("manifest.json");
        Manifest::build(&audit, &BTreeMap::new(), &stages, &taxonomy, &config)
            .write(&path)
            .unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed["days"].as_object().unwrap().is_empty());
    }
}
