//! Enrichment merger
//!
//! Adds the engine's top-level blocks to a unit's content record. Author
//! fields are never touched. A record that already carries one of the
//! engine's keys is only rewritten when its enhancement marker shows the
//! engine wrote it; otherwise the merge refuses with `MergeConflict`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::audit::{AuditResults, DrillOutcome};
use crate::config::OutputConfig;
use crate::curriculum::StageModel;
use crate::error::{EngineError, EngineResult};
use crate::taxonomy::{colors, Callout, CalloutBlock, ColorVariant, TechniqueKey, TechniqueTaxonomy};
use crate::types::{Day, StageId};

pub const PROCESSABILITY_KEY: &str = "processabilityTheory";
pub const NOTICING_KEY: &str = "noticingEnhancements";
pub const SHADOWING_KEY: &str = "shadowingMode";
pub const COLOR_SCHEMES_KEY: &str = "colorSchemes";
pub const META_KEY: &str = "enhancementMeta";

/// Top-level keys owned by the engine, in write order
pub const ENGINE_KEYS: [&str; 5] = [
    PROCESSABILITY_KEY,
    NOTICING_KEY,
    SHADOWING_KEY,
    COLOR_SCHEMES_KEY,
    META_KEY,
];

const FRAMEWORKS: [&str; 3] = ["ProcessabilityTheory", "NoticingHypothesis", "ShadowingMode"];

const MORPHEME_FORMAT: &str = "habl|o, habl|as, habl|a, habl|amos, habl|áis, habl|an";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessabilityBlock {
    pub stage: StageId,
    pub stage_name: String,
    pub description: String,
    pub prerequisite_stage: Option<StageId>,
    pub prerequisite_satisfied: bool,
    pub aligned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFlooding {
    pub minimum_examples: usize,
    pub maximum_examples: usize,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphemeDisplay {
    pub format: String,
    pub spec: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNoticing {
    pub topic: String,
    pub applied_techniques: Vec<TechniqueKey>,
    pub coverage_percent: f64,
    pub color_scheme: ColorVariant,
    pub callouts: Vec<CalloutBlock>,
    pub input_flooding: InputFlooding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morpheme_display: Option<MorphemeDisplay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticingBlock {
    /// Palette of the first topic with a specialized variant
    pub color_scheme: ColorVariant,
    pub color_codes: Value,
    pub coverage_percent: f64,
    pub topics: Vec<TopicNoticing>,
    pub recommendations: Vec<String>,
}

/// The engine's derived content for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub day: Day,
    pub processability: ProcessabilityBlock,
    pub noticing: NoticingBlock,
    pub shadowing: DrillOutcome,
    pub version: String,
}

impl Enrichment {
    /// Assemble a unit's enrichment from a finished audit
    pub fn from_audit(
        day: Day,
        audit: &AuditResults,
        stages: &StageModel,
        taxonomy: &TechniqueTaxonomy,
        output: &OutputConfig,
    ) -> Option<Self> {
        let alignment = audit.alignment.get(day)?;
        let coverage = audit.coverage.get(day)?;
        let shadowing = audit.drills.days.get(&day)?.clone();

        let stage_name = stages
            .get(alignment.declared_stage)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| alignment.stage_name.clone());

        let processability = ProcessabilityBlock {
            stage: alignment.declared_stage,
            description: format!("Stage {}: {}", alignment.declared_stage, stage_name),
            stage_name,
            prerequisite_stage: alignment.prerequisite_stage,
            prerequisite_satisfied: alignment.prerequisite_satisfied,
            aligned: alignment.aligned,
        };

        let (min_examples, max_examples) = taxonomy.flood_examples();
        let topics: Vec<TopicNoticing> = coverage
            .topics
            .iter()
            .map(|topic| TopicNoticing {
                topic: topic.topic.clone(),
                applied_techniques: topic.applied_techniques.clone(),
                coverage_percent: topic.coverage_percent,
                color_scheme: topic.color_variant,
                callouts: Callout::for_topic(&topic.topic)
                    .iter()
                    .map(Callout::to_block)
                    .collect(),
                input_flooding: InputFlooding {
                    minimum_examples: min_examples,
                    maximum_examples: max_examples,
                    examples: Vec::new(),
                },
                morpheme_display: topic.has(TechniqueKey::TypographicSalience).then(|| {
                    MorphemeDisplay {
                        format: MORPHEME_FORMAT.to_string(),
                        spec: "Use | to show morpheme boundaries, bold + color for endings"
                            .to_string(),
                    }
                }),
            })
            .collect();

        let color_scheme = topics
            .iter()
            .map(|t| t.color_scheme)
            .find(ColorVariant::is_attributed)
            .unwrap_or(ColorVariant::PartsOfSpeech);

        let recommendations = audit
            .coverage
            .gaps_for(day)
            .map(|gap| gap.recommendation.clone())
            .collect();

        Some(Self {
            day,
            processability,
            noticing: NoticingBlock {
                color_scheme,
                color_codes: color_scheme.to_value(),
                coverage_percent: coverage.coverage_percent,
                topics,
                recommendations,
            },
            shadowing,
            version: output.enhancement_version.clone(),
        })
    }

    /// Engine blocks in `ENGINE_KEYS` order
    fn blocks(&self, enhanced_at: DateTime<Utc>) -> EngineResult<Vec<(&'static str, Value)>> {
        let to_value = |value: serde_json::Result<Value>| {
            value.map_err(|e| EngineError::serialization(self.day, e.to_string()))
        };

        Ok(vec![
            (PROCESSABILITY_KEY, to_value(serde_json::to_value(&self.processability))?),
            (NOTICING_KEY, to_value(serde_json::to_value(&self.noticing))?),
            (SHADOWING_KEY, to_value(serde_json::to_value(&self.shadowing))?),
            (COLOR_SCHEMES_KEY, colors::reference_block()),
            (
                META_KEY,
                json!({
                    "version": self.version,
                    "enhanced": true,
                    "enhancedAt": enhanced_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "frameworks": FRAMEWORKS,
                }),
            ),
        ])
    }
}

fn has_marker(meta: Option<&Value>) -> bool {
    let Some(meta) = meta else {
        return false;
    };
    meta.get("enhanced").and_then(Value::as_bool) == Some(true)
        && meta.get("version").is_some_and(Value::is_string)
}

/// Whether a record carries the engine's enhancement marker
pub fn is_enriched(record: &Value) -> bool {
    has_marker(record.get(META_KEY))
}

/// First engine key present in a record that the engine did not write
pub fn conflicting_key(record: &Map<String, Value>) -> Option<&'static str> {
    if has_marker(record.get(META_KEY)) {
        return None;
    }
    ENGINE_KEYS.iter().copied().find(|key| record.contains_key(*key))
}

/// Merge an enrichment into an existing record.
///
/// Author keys keep their values and positions. Engine keys from an earlier
/// run are replaced in place, so merging twice only changes `enhancedAt`.
pub fn merge(
    existing: Value,
    enrichment: &Enrichment,
    enhanced_at: DateTime<Utc>,
) -> EngineResult<Value> {
    let day = enrichment.day;
    let Value::Object(mut record) = existing else {
        return Err(EngineError::serialization(day, "record is not a JSON object"));
    };

    if let Some(key) = conflicting_key(&record) {
        return Err(EngineError::MergeConflict {
            day,
            key: key.to_string(),
        });
    }

    for (key, value) in enrichment.blocks(enhanced_at)? {
        record.insert(key.to_string(), value);
    }

    Ok(Value::Object(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Auditor;
    use crate::config::EngineConfig;
    use crate::curriculum::UnitRegistry;
    use chrono::TimeZone;

    fn enrichment(day: Day) -> Enrichment {
        let units = UnitRegistry::builtin();
        let stages = StageModel::builtin();
        let taxonomy = TechniqueTaxonomy::builtin();
        let config = EngineConfig::default();
        let audit = Auditor::new(&units, &stages, &taxonomy, &config).run().unwrap();
        Enrichment::from_audit(day, &audit, &stages, &taxonomy, &config.output).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn author_record() -> Value {
        json!({
            "day": 8,
            "title": "En el restaurante",
            "vocabulary": [{"es": "la cuenta", "en": "the bill"}],
            "grammar": {"topic": "-AR verbs"}
        })
    }

    #[test]
    fn test_merge_preserves_author_fields() {
        let original = author_record();
        let merged = merge(original.clone(), &enrichment(8), at(9)).unwrap();

        for (key, value) in original.as_object().unwrap() {
            assert_eq!(&merged[key], value);
        }
        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(&keys[..4], &["day", "title", "vocabulary", "grammar"]);
        assert_eq!(&keys[4..], &ENGINE_KEYS);
        assert!(is_enriched(&merged));
        assert_eq!(merged[META_KEY]["enhancedAt"], "2024-03-01T09:00:00Z");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let first = merge(author_record(), &enrichment(8), at(9)).unwrap();
        let second = merge(first.clone(), &enrichment(8), at(9)).unwrap();
        assert_eq!(first, second);

        let later = merge(first.clone(), &enrichment(8), at(11)).unwrap();
        assert_ne!(later[META_KEY]["enhancedAt"], first[META_KEY]["enhancedAt"]);
        let mut normalized = later.clone();
        normalized[META_KEY]["enhancedAt"] = first[META_KEY]["enhancedAt"].clone();
        assert_eq!(normalized, first);
        assert!(later[META_KEY].get(META_KEY).is_none());
        assert!(later[NOTICING_KEY].get(NOTICING_KEY).is_none());
    }

    #[test]
    fn test_author_owned_engine_key_conflicts() {
        let mut record = author_record();
        record["shadowingMode"] = json!({"notes": "hand written"});
        let err = merge(record, &enrichment(8), at(9)).unwrap_err();
        match err {
            EngineError::MergeConflict { day, key } => {
                assert_eq!(day, 8);
                assert_eq!(key, "shadowingMode");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_marker_without_version_conflicts() {
        let mut record = author_record();
        record[META_KEY] = json!({"enhanced": true});
        assert!(matches!(
            merge(record, &enrichment(8), at(9)),
            Err(EngineError::MergeConflict { .. })
        ));
    }

    #[test]
    fn test_non_object_record_is_serialization_error() {
        let err = merge(json!([1, 2, 3]), &enrichment(2), at(9)).unwrap_err();
        assert!(matches!(err, EngineError::Serialization { day: 2, .. }));
    }

    #[test]
    fn test_locked_day_gets_disabled_marker() {
        let merged = merge(json!({"day": 2}), &enrichment(2), at(9)).unwrap();
        assert_eq!(merged[SHADOWING_KEY]["enabled"], false);
        assert_eq!(merged[SHADOWING_KEY]["unlockDay"], 7);
        assert_eq!(merged[PROCESSABILITY_KEY]["stage"], 1);
        assert_eq!(
            merged[PROCESSABILITY_KEY]["description"],
            "Stage 1: Lemma Access (Words/Formulas)"
        );
    }

    #[test]
    fn test_noticing_block_for_conjugation_day() {
        let merged = merge(author_record(), &enrichment(8), at(9)).unwrap();
        let noticing = &merged[NOTICING_KEY];
        assert_eq!(noticing["colorScheme"], "verb_endings");
        assert_eq!(noticing["colorCodes"]["yo"], "#F44336");
        let conjugation = &noticing["topics"][1];
        assert_eq!(conjugation["topic"], "-AR verb conjugation");
        assert_eq!(conjugation["inputFlooding"]["minimumExamples"], 5);
        assert!(conjugation.get("morphemeDisplay").is_some());
        assert!(noticing["topics"][0].get("morphemeDisplay").is_none());
    }
}
