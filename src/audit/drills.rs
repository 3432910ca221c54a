//! Drill (shadowing) generator
//!
//! Produces a fixed-size manifest of practice-phrase placeholders for each
//! unit at or past the unlock day. Output depends only on the day, the theme
//! and the configured tiers, so ids and file names are stable across runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{EncouragementMessages, ShadowingConfig, TierConfig};
use crate::curriculum::UnitRegistry;
use crate::error::{EngineError, EngineResult};
use crate::types::Day;

/// Where a practice phrase is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Grammar,
    Vocabulary,
    Dialogue,
    Review,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Grammar => "grammar",
            SourceType::Vocabulary => "vocabulary",
            SourceType::Dialogue => "dialogue",
            SourceType::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusSlot {
    Primary,
    Secondary,
    Fixed(&'static str),
}

const PHRASE_TEMPLATE: [(SourceType, FocusSlot); 7] = [
    (SourceType::Grammar, FocusSlot::Primary),
    (SourceType::Grammar, FocusSlot::Secondary),
    (SourceType::Vocabulary, FocusSlot::Primary),
    (SourceType::Vocabulary, FocusSlot::Secondary),
    (SourceType::Dialogue, FocusSlot::Primary),
    (SourceType::Review, FocusSlot::Fixed("rhythm")),
    (SourceType::Review, FocusSlot::Fixed("intonation")),
];

/// One placeholder phrase in a drill session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseSpec {
    pub id: String,
    pub source_type: SourceType,
    pub focus: String,
    pub max_words: u32,
    pub speed_multiplier: f64,
    pub placeholder_text: String,
    pub audio_file: String,
    #[serde(rename = "durationEstimateSeconds")]
    pub duration_estimate_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillFeedback {
    pub primary_metric: String,
    pub encouragement: EncouragementMessages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillInstructions {
    pub intro: String,
    pub focus: String,
    pub tip: String,
}

/// Drill content for an unlocked unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillManifest {
    pub enabled: bool,
    pub day: Day,
    pub tier: String,
    pub max_words: u32,
    pub speed_multiplier: f64,
    pub primary_focus: String,
    pub secondary_focus: String,
    pub session_duration_minutes: u32,
    pub phrases: Vec<PhraseSpec>,
    pub instructions: DrillInstructions,
    pub feedback: DrillFeedback,
}

/// Stand-in for units before the unlock day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledMarker {
    pub enabled: bool,
    pub unlock_day: Day,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrillOutcome {
    Enabled(DrillManifest),
    Disabled(DisabledMarker),
}

impl DrillOutcome {
    pub fn is_enabled(&self) -> bool {
        matches!(self, DrillOutcome::Enabled(_))
    }

    pub fn manifest(&self) -> Option<&DrillManifest> {
        match self {
            DrillOutcome::Enabled(m) => Some(m),
            DrillOutcome::Disabled(_) => None,
        }
    }

    pub fn phrase_count(&self) -> usize {
        self.manifest().map_or(0, |m| m.phrases.len())
    }
}

/// Drill outcomes for the whole curriculum
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillReport {
    pub days: std::collections::BTreeMap<Day, DrillOutcome>,
    pub total_phrases_needed: usize,
    pub days_with_drills: usize,
    pub unlock_day: Day,
}

/// Generates drill manifests from the shadowing configuration
pub struct DrillGenerator<'a> {
    config: &'a ShadowingConfig,
}

impl<'a> DrillGenerator<'a> {
    pub fn new(config: &'a ShadowingConfig) -> Self {
        Self { config }
    }

    /// Drill outcome for one day
    pub fn generate(&self, day: Day, theme: &str) -> EngineResult<DrillOutcome> {
        if day < self.config.unlock_day {
            return Ok(DrillOutcome::Disabled(DisabledMarker {
                enabled: false,
                unlock_day: self.config.unlock_day,
                reason: format!(
                    "Shadowing mode unlocks on Day {}. {}",
                    self.config.unlock_day, self.config.rationale
                ),
            }));
        }

        let tier = self
            .config
            .tier_for(day)
            .ok_or_else(|| EngineError::config("no difficulty tiers configured"))?;

        let phrases = (0..self.config.phrases_per_session)
            .map(|index| phrase(day, theme, tier, index))
            .collect();

        debug!(day, tier = %tier.key(), "Generated drill manifest");

        Ok(DrillOutcome::Enabled(DrillManifest {
            enabled: true,
            day,
            tier: tier.key(),
            max_words: tier.max_words,
            speed_multiplier: tier.speed_multiplier,
            primary_focus: tier.primary_focus.clone(),
            secondary_focus: tier.secondary_focus.clone(),
            session_duration_minutes: self.config.session_duration_minutes,
            phrases,
            instructions: DrillInstructions {
                intro: "Listen to each phrase, then repeat it immediately after.".to_string(),
                focus: format!("Focus on matching the {} of the speaker.", tier.primary_focus),
                tip: "Don't worry about perfect pronunciation - focus on the rhythm and flow!"
                    .to_string(),
            },
            feedback: DrillFeedback {
                primary_metric: format!("{}_match", tier.primary_focus),
                encouragement: self.config.encouragement.clone(),
            },
        }))
    }

    /// Drill outcomes for every unit in the registry
    pub fn generate_all(&self, units: &UnitRegistry) -> EngineResult<DrillReport> {
        info!("Generating drills (unlock day {})", self.config.unlock_day);

        let mut days = std::collections::BTreeMap::new();
        for unit in units.iter() {
            days.insert(unit.day, self.generate(unit.day, &unit.theme)?);
        }

        let total_phrases_needed = days.values().map(DrillOutcome::phrase_count).sum();
        let days_with_drills = days.values().filter(|o| o.is_enabled()).count();

        info!(
            "Drills: {} days unlocked, {} phrases to record",
            days_with_drills, total_phrases_needed
        );

        Ok(DrillReport {
            days,
            total_phrases_needed,
            days_with_drills,
            unlock_day: self.config.unlock_day,
        })
    }
}

fn phrase(day: Day, theme: &str, tier: &TierConfig, index: usize) -> PhraseSpec {
    let (source_type, slot) = PHRASE_TEMPLATE[index % PHRASE_TEMPLATE.len()];
    let position = index + 1;
    let id = format!("day{}_shadow_{:02}", day, position);

    let focus = match slot {
        FocusSlot::Primary => tier.primary_focus.clone(),
        FocusSlot::Secondary => tier.secondary_focus.clone(),
        FocusSlot::Fixed(focus) => focus.to_string(),
    };

    PhraseSpec {
        audio_file: format!("{}.mp3", id),
        placeholder_text: format!("[{} - {} phrase {}]", theme, source_type.as_str(), position),
        id,
        source_type,
        focus,
        max_words: tier.max_words,
        speed_multiplier: tier.speed_multiplier,
        duration_estimate_s: 3.0 + tier.max_words as f64 * 0.3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_day_seven_food() {
        let config = ShadowingConfig::default();
        let outcome = DrillGenerator::new(&config).generate(7, "Food").unwrap();
        let manifest = outcome.manifest().unwrap();

        assert_eq!(manifest.tier, "day_7_10");
        assert_eq!(manifest.max_words, 5);
        assert!((manifest.speed_multiplier - 0.8).abs() < 1e-9);
        let ids: Vec<&str> = manifest.phrases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "day7_shadow_01", "day7_shadow_02", "day7_shadow_03", "day7_shadow_04",
                "day7_shadow_05", "day7_shadow_06", "day7_shadow_07",
            ]
        );
        assert_eq!(manifest.phrases[0].placeholder_text, "[Food - grammar phrase 1]");
        assert_eq!(manifest.phrases[0].audio_file, "day7_shadow_01.mp3");
        assert!((manifest.phrases[0].duration_estimate_s - 4.5).abs() < 1e-9);
        assert_eq!(manifest.phrases[1].focus, "stress");
        assert_eq!(manifest.phrases[6].focus, "intonation");
        assert_eq!(manifest.phrases[6].source_type, SourceType::Review);
        assert_eq!(manifest.feedback.primary_metric, "rhythm_match");
    }

    #[test]
    fn test_locked_days_get_marker() {
        let config = ShadowingConfig::default();
        let generator = DrillGenerator::new(&config);
        for day in 1..7 {
            match generator.generate(day, "Theme").unwrap() {
                DrillOutcome::Disabled(marker) => {
                    assert!(!marker.enabled);
                    assert_eq!(marker.unlock_day, 7);
                }
                DrillOutcome::Enabled(_) => panic!("day {} should be locked", day),
            }
        }
    }

    #[test]
    fn test_custom_unlock_and_count() {
        let mut config = ShadowingConfig::default();
        config.unlock_day = 3;
        config.phrases_per_session = 9;
        config.rationale = "Numbers and greetings come first".to_string();
        let generator = DrillGenerator::new(&config);

        let manifest = generator.generate(3, "Family").unwrap();
        let phrases = &manifest.manifest().unwrap().phrases;
        assert_eq!(phrases.len(), 9);
        assert_eq!(phrases[7].source_type, SourceType::Grammar);
        assert_eq!(phrases[8].id, "day3_shadow_09");

        let locked = generator.generate(2, "Numbers").unwrap();
        assert_eq!(
            locked,
            DrillOutcome::Disabled(DisabledMarker {
                enabled: false,
                unlock_day: 3,
                reason: "Shadowing mode unlocks on Day 3. Numbers and greetings come first"
                    .to_string(),
            })
        );
    }

    #[test]
    fn test_ids_unique_across_curriculum() {
        let config = ShadowingConfig::default();
        let report = DrillGenerator::new(&config)
            .generate_all(&UnitRegistry::builtin())
            .unwrap();

        let mut seen = HashSet::new();
        for outcome in report.days.values() {
            for phrase in outcome.manifest().map(|m| m.phrases.as_slice()).unwrap_or(&[]) {
                assert!(seen.insert(phrase.id.clone()), "duplicate id {}", phrase.id);
            }
        }
        assert_eq!(report.days_with_drills, 24);
        assert_eq!(report.total_phrases_needed, 24 * 7);
        assert_eq!(seen.len(), 24 * 7);
    }

    #[test]
    fn test_tiers_follow_breakpoints() {
        let config = ShadowingConfig::default();
        let generator = DrillGenerator::new(&config);
        let tier = |day| generator.generate(day, "T").unwrap().manifest().unwrap().tier.clone();
        assert_eq!(tier(10), "day_7_10");
        assert_eq!(tier(11), "day_11_15");
        assert_eq!(tier(20), "day_16_20");
        assert_eq!(tier(25), "day_21_25");
        assert_eq!(tier(30), "day_26_30");
    }

    #[test]
    fn test_serialized_forms_carry_enabled_flag() {
        let config = ShadowingConfig::default();
        let generator = DrillGenerator::new(&config);
        let locked = serde_json::to_value(generator.generate(1, "Hi").unwrap()).unwrap();
        assert_eq!(locked["enabled"], false);
        assert_eq!(locked["unlockDay"], 7);

        let open = serde_json::to_value(generator.generate(8, "Restaurant").unwrap()).unwrap();
        assert_eq!(open["enabled"], true);
        assert_eq!(open["phrases"][0]["sourceType"], "grammar");
    }

    #[test]
    fn test_no_tiers_is_configuration_error() {
        let mut config = ShadowingConfig::default();
        config.tiers.clear();
        let err = DrillGenerator::new(&config).generate(8, "T").unwrap_err();
        assert!(err.is_fatal());
    }
}
