//! Attention-directing callout and recommendation text
//!
//! Every template takes its arguments as typed fields, so a callout can't be
//! rendered with a missing or misspelled placeholder.

use serde::Serialize;

use super::TechniqueKey;

/// A noticing callout with its template arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Callout {
    /// Shown before the examples
    PrePattern { feature: String },
    /// Shown after the examples
    PostPattern { pattern_description: String },
    Comparison { form_a: String, form_b: String },
    RuleStatement { explicit_rule: String },
    ExceptionAlert { exception_description: String },
    MemoryHook { mnemonic: String },
}

impl Callout {
    pub fn kind(&self) -> &'static str {
        match self {
            Callout::PrePattern { .. } => "pre_pattern",
            Callout::PostPattern { .. } => "post_pattern",
            Callout::Comparison { .. } => "comparison",
            Callout::RuleStatement { .. } => "rule_statement",
            Callout::ExceptionAlert { .. } => "exception_alert",
            Callout::MemoryHook { .. } => "memory_hook",
        }
    }

    /// Where the callout sits relative to the lesson examples
    pub fn placement(&self) -> &'static str {
        match self {
            Callout::PrePattern { .. } => "before_examples",
            Callout::PostPattern { .. } | Callout::RuleStatement { .. } => "after_examples",
            Callout::Comparison { .. } => "during_contrast",
            Callout::ExceptionAlert { .. } => "after_rule",
            Callout::MemoryHook { .. } => "end_of_explanation",
        }
    }

    pub fn render(&self) -> String {
        match self {
            Callout::PrePattern { feature } => {
                format!("👀 Look at these examples. What do you notice about {}?", feature)
            }
            Callout::PostPattern { pattern_description } => {
                format!("💡 Did you notice? {}", pattern_description)
            }
            Callout::Comparison { form_a, form_b } => {
                format!("🔍 Notice how {} is different from {}", form_a, form_b)
            }
            Callout::RuleStatement { explicit_rule } => format!("📐 The pattern: {}", explicit_rule),
            Callout::ExceptionAlert { exception_description } => {
                format!("⚠️ Watch out: {}", exception_description)
            }
            Callout::MemoryHook { mnemonic } => format!("🧠 Remember: {}", mnemonic),
        }
    }

    /// Record form of the callout
    pub fn to_block(&self) -> CalloutBlock {
        CalloutBlock {
            kind: self.kind().to_string(),
            placement: self.placement().to_string(),
            text: self.render(),
        }
    }

    /// Standard pre/post/rule set for a grammar topic
    pub fn for_topic(topic: &str) -> Vec<Callout> {
        vec![
            Callout::PrePattern { feature: topic.to_string() },
            Callout::PostPattern {
                pattern_description: format!("The pattern for {}", topic),
            },
            Callout::RuleStatement {
                explicit_rule: format!("{} follows a regular pattern you can reuse", topic),
            },
        ]
    }
}

/// A rendered callout as stored in an enriched record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalloutBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub placement: String,
    pub text: String,
}

/// Recommendation for a technique missing from a topic
pub fn recommendation_for(key: TechniqueKey, topic: &str) -> String {
    match key {
        TechniqueKey::ColorCoding => format!("Add color coding to highlight {} patterns", topic),
        TechniqueKey::InputFlooding => format!("Add 5+ examples demonstrating {}", topic),
        TechniqueKey::PrePatternCallout => {
            format!("Add 'What do you notice about...' prompt before {}", topic)
        }
        TechniqueKey::PostPatternCallout => {
            format!("Add 'Did you notice?' confirmation after {}", topic)
        }
        TechniqueKey::TypographicSalience => {
            format!("Add bold/underline/pipe markers for {} morphemes", topic)
        }
        TechniqueKey::StructuralHighlighting => {
            format!("Add [S][V][O] structure markers for {}", topic)
        }
    }
}
