//! Color schemes for visual differentiation
//!
//! Fixed palettes keyed by grammatical feature. The verb-ending and gender
//! palettes are the ones a topic can be attributed; parts of speech is the
//! fallback palette and does not count as coverage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorVariant {
    VerbEndings,
    Gender,
    Tense,
    SentenceStructure,
    PartsOfSpeech,
}

impl ColorVariant {
    /// Palettes exported to records for the UI
    pub const REFERENCE: [ColorVariant; 4] = [
        ColorVariant::VerbEndings,
        ColorVariant::Gender,
        ColorVariant::Tense,
        ColorVariant::SentenceStructure,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ColorVariant::VerbEndings => "verb_endings",
            ColorVariant::Gender => "gender",
            ColorVariant::Tense => "tense",
            ColorVariant::SentenceStructure => "sentence_structure",
            ColorVariant::PartsOfSpeech => "parts_of_speech",
        }
    }

    /// `(label, hex)` pairs in display order
    pub fn codes(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ColorVariant::VerbEndings => &[
                ("yo", "#F44336"),
                ("tú", "#2196F3"),
                ("él_ella_usted", "#4CAF50"),
                ("nosotros", "#9C27B0"),
                ("vosotros", "#FF5722"),
                ("ellos_ustedes", "#FF9800"),
            ],
            ColorVariant::Gender => &[("masculine", "#2196F3"), ("feminine", "#E91E63")],
            ColorVariant::Tense => &[
                ("present", "#4CAF50"),
                ("preterite", "#F44336"),
                ("imperfect", "#FF9800"),
                ("future", "#2196F3"),
                ("conditional", "#9C27B0"),
                ("subjunctive", "#E91E63"),
            ],
            ColorVariant::SentenceStructure => &[
                ("subject", "#E3F2FD"),
                ("verb", "#E8F5E9"),
                ("object", "#FFF3E0"),
                ("complement", "#F3E5F5"),
            ],
            ColorVariant::PartsOfSpeech => &[
                ("noun", "#4CAF50"),
                ("verb", "#2196F3"),
                ("adjective", "#FF9800"),
                ("adverb", "#9C27B0"),
            ],
        }
    }

    /// Whether picking this palette counts as visual differentiation coverage
    pub fn is_attributed(&self) -> bool {
        matches!(self, ColorVariant::VerbEndings | ColorVariant::Gender)
    }

    /// Palette as an ordered JSON object
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .codes()
            .iter()
            .map(|(label, hex)| (label.to_string(), Value::String(hex.to_string())))
            .collect();
        Value::Object(map)
    }
}

impl std::fmt::Display for ColorVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The color-scheme reference block carried by every enriched record
pub fn reference_block() -> Value {
    let map: Map<String, Value> = ColorVariant::REFERENCE
        .iter()
        .map(|variant| (variant.key().to_string(), variant.to_value()))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_block_order() {
        let block = reference_block();
        let keys: Vec<&String> = block.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["verb_endings", "gender", "tense", "sentence_structure"]);
        assert_eq!(block["gender"]["feminine"], "#E91E63");
        assert_eq!(block["verb_endings"]["tú"], "#2196F3");
    }

    #[test]
    fn test_only_specialized_palettes_attributed() {
        assert!(ColorVariant::VerbEndings.is_attributed());
        assert!(ColorVariant::Gender.is_attributed());
        assert!(!ColorVariant::PartsOfSpeech.is_attributed());
    }
}
