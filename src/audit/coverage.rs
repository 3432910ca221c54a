//! Coverage scorer
//!
//! Scores each (unit, topic) pair against the technique taxonomy and
//! collects a gap record for every technique a topic is missing.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::curriculum::UnitRegistry;
use crate::taxonomy::{ColorVariant, TechniqueKey, TechniqueTaxonomy};
use crate::types::{mean_percent, Day};

/// Techniques attributed to one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResult {
    pub day: Day,
    pub topic: String,
    pub applied_techniques: Vec<TechniqueKey>,
    pub color_variant: ColorVariant,
    pub coverage_percent: f64,
}

impl CoverageResult {
    pub fn has(&self, key: TechniqueKey) -> bool {
        self.applied_techniques.contains(&key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitCoverage {
    pub day: Day,
    pub theme: String,
    pub topics: Vec<CoverageResult>,
    /// Mean of the topic percentages
    pub coverage_percent: f64,
}

/// A technique a topic does not get yet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageGap {
    pub day: Day,
    pub topic: String,
    pub technique: TechniqueKey,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub days: BTreeMap<Day, UnitCoverage>,
    pub gaps: Vec<CoverageGap>,
    pub overall_coverage: f64,
}

impl CoverageReport {
    pub fn get(&self, day: Day) -> Option<&UnitCoverage> {
        self.days.get(&day)
    }

    pub fn gaps_for(&self, day: Day) -> impl Iterator<Item = &CoverageGap> {
        self.gaps.iter().filter(move |g| g.day == day)
    }
}

/// Score every unit's topics against the taxonomy
pub fn score(units: &UnitRegistry, taxonomy: &TechniqueTaxonomy) -> CoverageReport {
    info!("Scoring technique coverage for {} units", units.len());

    let total = taxonomy.len().max(1) as f64;
    let mut days = BTreeMap::new();
    let mut gaps = Vec::new();

    for unit in units.iter() {
        let mut topics = Vec::with_capacity(unit.topics.len());

        for topic in &unit.topics {
            let evaluated = taxonomy.evaluate(topic);
            let coverage_percent = evaluated.applied.len() as f64 / total * 100.0;

            let missing = taxonomy
                .rules()
                .iter()
                .filter(|rule| evaluated.missing.contains(&rule.key));
            for rule in missing {
                gaps.push(CoverageGap {
                    day: unit.day,
                    topic: topic.clone(),
                    technique: rule.key,
                    recommendation: rule.recommendation(topic),
                });
            }

            debug!(day = unit.day, topic = %topic, coverage_percent, "Scored topic");

            topics.push(CoverageResult {
                day: unit.day,
                topic: topic.clone(),
                applied_techniques: evaluated.applied,
                color_variant: evaluated.color_variant,
                coverage_percent,
            });
        }

        let coverage_percent = mean_percent(topics.iter().map(|t| t.coverage_percent));
        days.insert(
            unit.day,
            UnitCoverage {
                day: unit.day,
                theme: unit.theme.clone(),
                topics,
                coverage_percent,
            },
        );
    }

    let overall_coverage = mean_percent(days.values().map(|d: &UnitCoverage| d.coverage_percent));
    info!("Coverage: {:.1}% overall, {} gaps", overall_coverage, gaps.len());

    CoverageReport {
        days,
        gaps,
        overall_coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Unit;

    fn single(topics: &[&str]) -> UnitRegistry {
        UnitRegistry::new(vec![Unit::new(1, "Theme", topics, 1)]).unwrap()
    }

    #[test]
    fn test_greetings_is_half_covered() {
        let report = score(&single(&["greetings"]), &TechniqueTaxonomy::builtin());
        let unit = report.get(1).unwrap();
        assert!((unit.coverage_percent - 50.0).abs() < 1e-9);
        assert!(!unit.topics[0].has(TechniqueKey::ColorCoding));
        assert_eq!(report.gaps.len(), 3);
    }

    #[test]
    fn test_conjugation_topic() {
        let report = score(&single(&["-AR verb conjugation"]), &TechniqueTaxonomy::builtin());
        let topic = &report.get(1).unwrap().topics[0];
        assert_eq!(topic.color_variant, ColorVariant::VerbEndings);
        assert!(topic.has(TechniqueKey::TypographicSalience));
        assert!(topic.coverage_percent >= 66.6);
        assert!((topic.coverage_percent - 500.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_is_multiple_of_category_share() {
        let taxonomy = TechniqueTaxonomy::builtin();
        let report = score(&UnitRegistry::builtin(), &taxonomy);
        let step = 100.0 / taxonomy.len() as f64;
        for unit in report.days.values() {
            for topic in &unit.topics {
                assert!((0.0..=100.0).contains(&topic.coverage_percent));
                let ratio = topic.coverage_percent / step;
                assert!((ratio - ratio.round()).abs() < 1e-9, "{} not a multiple", topic.topic);
            }
        }
    }

    #[test]
    fn test_gap_recommendations_name_topic() {
        let report = score(&single(&["Negation"]), &TechniqueTaxonomy::builtin());
        let gaps: Vec<_> = report.gaps_for(1).collect();
        assert!(gaps
            .iter()
            .any(|g| g.recommendation == "Add color coding to highlight Negation patterns"));
        assert!(gaps.iter().all(|g| g.topic == "Negation"));
    }

    #[test]
    fn test_gaps_use_rule_recommendations() {
        let taxonomy = TechniqueTaxonomy::builtin();
        let report = score(&single(&["greetings"]), &taxonomy);
        let gaps: Vec<_> = report.gaps_for(1).collect();

        let expected: Vec<_> = taxonomy
            .rules()
            .iter()
            .filter(|rule| !rule.applies_to("greetings"))
            .collect();
        assert_eq!(gaps.len(), expected.len());
        for (gap, rule) in gaps.iter().zip(expected) {
            assert_eq!(gap.technique, rule.key);
            assert_eq!(gap.recommendation, rule.recommendation("greetings"));
        }
    }

    #[test]
    fn test_unit_coverage_is_topic_mean() {
        let report = score(&single(&["greetings", "-AR verb conjugation"]), &TechniqueTaxonomy::builtin());
        let unit = report.get(1).unwrap();
        let expected = (50.0 + 500.0 / 6.0) / 2.0;
        assert!((unit.coverage_percent - expected).abs() < 1e-9);
        assert!((report.overall_coverage - expected).abs() < 1e-9);
    }
}
