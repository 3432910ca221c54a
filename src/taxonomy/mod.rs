//! Instructional technique taxonomy
//!
//! Six noticing techniques, each with an applicability predicate over a
//! grammar topic label. Predicates are case-insensitive substring matches
//! against keyword sets taken from [`TechniqueKeywords`].
//!
//! Visual differentiation has several palette variants. They are tried in
//! priority order (verb endings, then gender) and at most one is attributed
//! to a topic. A topic that matches neither falls back to the parts-of-speech
//! palette, which is not counted as coverage.

pub mod callouts;
pub mod colors;

use serde::{Deserialize, Serialize};

use crate::config::TechniqueKeywords;

pub use callouts::{recommendation_for, Callout, CalloutBlock};
pub use colors::ColorVariant;

/// Technique category key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueKey {
    ColorCoding,
    PrePatternCallout,
    PostPatternCallout,
    InputFlooding,
    TypographicSalience,
    StructuralHighlighting,
}

impl TechniqueKey {
    pub const ALL: [TechniqueKey; 6] = [
        TechniqueKey::ColorCoding,
        TechniqueKey::PrePatternCallout,
        TechniqueKey::PostPatternCallout,
        TechniqueKey::InputFlooding,
        TechniqueKey::TypographicSalience,
        TechniqueKey::StructuralHighlighting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechniqueKey::ColorCoding => "color_coding",
            TechniqueKey::PrePatternCallout => "pre_pattern_callout",
            TechniqueKey::PostPatternCallout => "post_pattern_callout",
            TechniqueKey::InputFlooding => "input_flooding",
            TechniqueKey::TypographicSalience => "typographic_salience",
            TechniqueKey::StructuralHighlighting => "structural_highlighting",
        }
    }
}

impl std::fmt::Display for TechniqueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A palette variant and the keywords that select it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantKeywords {
    pub variant: ColorVariant,
    pub keywords: Vec<String>,
}

/// When a technique applies to a topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Applicability {
    Always,
    Keywords { keywords: Vec<String> },
    /// First matching variant wins
    Variants { variants: Vec<VariantKeywords> },
}

impl Applicability {
    pub fn applies_to(&self, topic: &str) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::Keywords { keywords } => matches_any(topic, keywords),
            Applicability::Variants { variants } => variant_match(variants, topic).is_some(),
        }
    }
}

/// One technique category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueRule {
    pub key: TechniqueKey,
    pub category: String,
    pub description: String,
    pub applies_when: Applicability,
}

impl TechniqueRule {
    fn new(key: TechniqueKey, category: &str, description: &str, applies_when: Applicability) -> Self {
        Self {
            key,
            category: category.to_string(),
            description: description.to_string(),
            applies_when,
        }
    }

    pub fn applies_to(&self, topic: &str) -> bool {
        self.applies_when.applies_to(topic)
    }

    /// Recommendation shown when this technique is missing from a topic
    pub fn recommendation(&self, topic: &str) -> String {
        recommendation_for(self.key, topic)
    }
}

/// Techniques evaluated for one topic
#[derive(Debug, Clone, PartialEq)]
pub struct TopicTechniques {
    pub applied: Vec<TechniqueKey>,
    pub missing: Vec<TechniqueKey>,
    pub color_variant: ColorVariant,
}

/// The fixed table of technique rules
#[derive(Debug, Clone, Serialize)]
pub struct TechniqueTaxonomy {
    rules: Vec<TechniqueRule>,
    flood_min_examples: usize,
    flood_max_examples: usize,
}

impl TechniqueTaxonomy {
    pub fn new(keywords: &TechniqueKeywords) -> Self {
        let color_variants = vec![
            VariantKeywords {
                variant: ColorVariant::VerbEndings,
                keywords: keywords.verb_endings.clone(),
            },
            VariantKeywords {
                variant: ColorVariant::Gender,
                keywords: keywords.gender.clone(),
            },
        ];

        let rules = vec![
            TechniqueRule::new(
                TechniqueKey::ColorCoding,
                "visual differentiation",
                "Visual color differentiation for grammatical features",
                Applicability::Variants { variants: color_variants },
            ),
            TechniqueRule::new(
                TechniqueKey::PrePatternCallout,
                "pre-exposure prompt",
                "Prime attention before showing the pattern",
                Applicability::Always,
            ),
            TechniqueRule::new(
                TechniqueKey::PostPatternCallout,
                "confirmation prompt",
                "Confirm pattern recognition after the examples",
                Applicability::Always,
            ),
            TechniqueRule::new(
                TechniqueKey::InputFlooding,
                "repeated-example exposure",
                "Multiple examples of the same pattern to ensure noticing",
                Applicability::Always,
            ),
            TechniqueRule::new(
                TechniqueKey::TypographicSalience,
                "typographic emphasis",
                "Bold, underline and pipe markers on morpheme boundaries",
                Applicability::Keywords { keywords: keywords.typographic.clone() },
            ),
            TechniqueRule::new(
                TechniqueKey::StructuralHighlighting,
                "structural labeling",
                "[S][V][O] labels on sentence constituents",
                Applicability::Keywords { keywords: keywords.structural.clone() },
            ),
        ];

        Self {
            rules,
            flood_min_examples: keywords.input_flooding_min_examples,
            flood_max_examples: keywords.input_flooding_max_examples,
        }
    }

    pub fn builtin() -> Self {
        Self::new(&TechniqueKeywords::default())
    }

    pub fn rules(&self) -> &[TechniqueRule] {
        &self.rules
    }

    pub fn rule(&self, key: TechniqueKey) -> Option<&TechniqueRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn flood_examples(&self) -> (usize, usize) {
        (self.flood_min_examples, self.flood_max_examples)
    }

    /// Palette chosen for a topic, falling back to parts of speech
    pub fn color_variant(&self, topic: &str) -> ColorVariant {
        self.rule(TechniqueKey::ColorCoding)
            .and_then(|rule| match &rule.applies_when {
                Applicability::Variants { variants } => variant_match(variants, topic),
                _ => None,
            })
            .unwrap_or(ColorVariant::PartsOfSpeech)
    }

    /// Split the taxonomy into applied and missing techniques for a topic
    pub fn evaluate(&self, topic: &str) -> TopicTechniques {
        let (applied, missing) = self
            .rules
            .iter()
            .map(|rule| rule.key)
            .partition(|key| self.rule(*key).is_some_and(|r| r.applies_to(topic)));

        TopicTechniques {
            applied,
            missing,
            color_variant: self.color_variant(topic),
        }
    }
}

impl Default for TechniqueTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

fn matches_any(topic: &str, keywords: &[String]) -> bool {
    let topic = topic.to_lowercase();
    keywords.iter().any(|k| topic.contains(&k.to_lowercase()))
}

fn variant_match(variants: &[VariantKeywords], topic: &str) -> Option<ColorVariant> {
    variants
        .iter()
        .find(|v| matches_any(topic, &v.keywords))
        .map(|v| v.variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings_gets_always_on_only() {
        let taxonomy = TechniqueTaxonomy::builtin();
        let result = taxonomy.evaluate("greetings");
        assert_eq!(
            result.applied,
            vec![
                TechniqueKey::PrePatternCallout,
                TechniqueKey::PostPatternCallout,
                TechniqueKey::InputFlooding,
            ]
        );
        assert_eq!(result.missing.len(), 3);
        assert_eq!(result.color_variant, ColorVariant::PartsOfSpeech);
    }

    #[test]
    fn test_conjugation_wins_over_gender() {
        let taxonomy = TechniqueTaxonomy::builtin();
        assert_eq!(
            taxonomy.color_variant("Verb conjugation and gender"),
            ColorVariant::VerbEndings
        );
        assert_eq!(taxonomy.color_variant("Gender of nouns"), ColorVariant::Gender);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let taxonomy = TechniqueTaxonomy::builtin();
        let result = taxonomy.evaluate("-AR VERB CONJUGATION");
        assert!(result.applied.contains(&TechniqueKey::ColorCoding));
        assert!(result.applied.contains(&TechniqueKey::TypographicSalience));
        assert!(!result.applied.contains(&TechniqueKey::StructuralHighlighting));
    }

    #[test]
    fn test_structural_keywords() {
        let taxonomy = TechniqueTaxonomy::builtin();
        let result = taxonomy.evaluate("Question formation");
        assert!(result.applied.contains(&TechniqueKey::StructuralHighlighting));
    }

    #[test]
    fn test_custom_keywords() {
        let mut keywords = TechniqueKeywords::default();
        keywords.gender.push("noun class".into());
        let taxonomy = TechniqueTaxonomy::new(&keywords);
        assert_eq!(taxonomy.color_variant("Noun class basics"), ColorVariant::Gender);
    }

    #[test]
    fn test_six_categories() {
        let taxonomy = TechniqueTaxonomy::builtin();
        assert_eq!(taxonomy.len(), TechniqueKey::ALL.len());
        for key in TechniqueKey::ALL {
            assert!(taxonomy.rule(key).is_some());
        }
    }
}
