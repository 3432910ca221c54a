//! Configuration management
//!
//! Static tables that tune the engine: the drill unlock day, phrases per
//! session, difficulty tier breakpoints and the technique keyword sets.
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock curriculum settings. Files may be TOML or YAML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::types::{Day, DayRange};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Drill (shadowing) generation settings
    #[serde(default)]
    pub shadowing: ShadowingConfig,
    /// Keyword sets that drive technique applicability
    #[serde(default)]
    pub techniques: TechniqueKeywords,
    /// Output versioning
    #[serde(default)]
    pub output: OutputConfig,
}

/// Drill generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShadowingConfig {
    /// First day that receives a drill manifest
    #[serde(default = "default_unlock_day")]
    pub unlock_day: Day,
    /// Number of phrases per generated session
    #[serde(default = "default_phrases_per_session")]
    pub phrases_per_session: usize,
    /// Suggested session length
    #[serde(default = "default_session_minutes")]
    pub session_duration_minutes: u32,
    /// Reason shown on days before the unlock day
    #[serde(default = "default_rationale")]
    pub rationale: String,
    /// Difficulty tiers, ascending and contiguous
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,
    /// Feedback messages bundled into each manifest
    #[serde(default)]
    pub encouragement: EncouragementMessages,
}

fn default_unlock_day() -> Day {
    7
}

fn default_phrases_per_session() -> usize {
    7
}

fn default_session_minutes() -> u32 {
    4
}

fn default_rationale() -> String {
    "Basic vocabulary must be established before shadowing practice".to_string()
}

fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig::new(7, 10, 5, 0.8, "rhythm", "stress"),
        TierConfig::new(11, 15, 7, 0.9, "intonation", "rhythm"),
        TierConfig::new(16, 20, 10, 1.0, "stress", "intonation"),
        TierConfig::new(21, 25, 12, 1.0, "fluency", "naturalness"),
        TierConfig::new(26, 30, 15, 1.1, "naturalness", "expression"),
    ]
}

impl Default for ShadowingConfig {
    fn default() -> Self {
        Self {
            unlock_day: default_unlock_day(),
            phrases_per_session: default_phrases_per_session(),
            session_duration_minutes: default_session_minutes(),
            rationale: default_rationale(),
            tiers: default_tiers(),
            encouragement: EncouragementMessages::default(),
        }
    }
}

impl ShadowingConfig {
    /// Resolve the tier for a day.
    ///
    /// Days before the first breakpoint use the first tier and days after the
    /// last breakpoint use the last tier.
    pub fn tier_for(&self, day: Day) -> Option<&TierConfig> {
        if let Some(tier) = self.tiers.iter().find(|t| t.range().contains(day)) {
            return Some(tier);
        }
        let first = self.tiers.first()?;
        if day < first.first_day {
            Some(first)
        } else {
            self.tiers.last()
        }
    }
}

/// One difficulty tier owning a range of days
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierConfig {
    pub first_day: Day,
    pub last_day: Day,
    pub max_words: u32,
    pub speed_multiplier: f64,
    pub primary_focus: String,
    pub secondary_focus: String,
}

impl TierConfig {
    pub fn new(
        first_day: Day,
        last_day: Day,
        max_words: u32,
        speed_multiplier: f64,
        primary_focus: &str,
        secondary_focus: &str,
    ) -> Self {
        Self {
            first_day,
            last_day,
            max_words,
            speed_multiplier,
            primary_focus: primary_focus.to_string(),
            secondary_focus: secondary_focus.to_string(),
        }
    }

    pub fn range(&self) -> DayRange {
        DayRange::new(self.first_day, self.last_day)
    }

    /// Tier key, e.g. `day_7_10`
    pub fn key(&self) -> String {
        self.range().key()
    }
}

/// Encouragement messages grouped by score band
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncouragementMessages {
    #[serde(default = "default_excellent")]
    pub excellent: Vec<String>,
    #[serde(default = "default_good")]
    pub good: Vec<String>,
    #[serde(default = "default_improving")]
    pub improving: Vec<String>,
    #[serde(default = "default_needs_work")]
    pub needs_work: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_excellent() -> Vec<String> {
    strings(&["Perfect rhythm! 🎵", "Nailed it! 🎯", "Native-like! 🌟"])
}

fn default_good() -> Vec<String> {
    strings(&["Great flow! 👍", "Nice work!", "Getting better! 📈"])
}

fn default_improving() -> Vec<String> {
    strings(&["Good try! Keep going 💪", "Almost there!", "Practice makes perfect!"])
}

fn default_needs_work() -> Vec<String> {
    strings(&["Let's try again 🔄", "Listen once more", "Focus on the rhythm"])
}

impl Default for EncouragementMessages {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            improving: default_improving(),
            needs_work: default_needs_work(),
        }
    }
}

/// Keyword sets for technique applicability (matched case-insensitively as substrings)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechniqueKeywords {
    /// Activates the verb-ending color variant
    #[serde(default = "default_verb_ending_keywords")]
    pub verb_endings: Vec<String>,
    /// Activates the gender color variant
    #[serde(default = "default_gender_keywords")]
    pub gender: Vec<String>,
    /// Morphology keywords that activate typographic emphasis
    #[serde(default = "default_typographic_keywords")]
    pub typographic: Vec<String>,
    /// Sentence-structure keywords that activate structural labels
    #[serde(default = "default_structural_keywords")]
    pub structural: Vec<String>,
    /// Minimum examples per input flood
    #[serde(default = "default_flood_min")]
    pub input_flooding_min_examples: usize,
    /// Maximum examples per input flood
    #[serde(default = "default_flood_max")]
    pub input_flooding_max_examples: usize,
}

fn default_verb_ending_keywords() -> Vec<String> {
    strings(&["conjugation", "verb", "-ar", "-er", "-ir", "tense"])
}

fn default_gender_keywords() -> Vec<String> {
    strings(&["gender", "el/la", "masculine", "feminine"])
}

fn default_typographic_keywords() -> Vec<String> {
    strings(&["conjugation", "ending", "agreement", "plural"])
}

fn default_structural_keywords() -> Vec<String> {
    strings(&["order", "sentence", "svo", "question"])
}

fn default_flood_min() -> usize {
    5
}

fn default_flood_max() -> usize {
    8
}

impl Default for TechniqueKeywords {
    fn default() -> Self {
        Self {
            verb_endings: default_verb_ending_keywords(),
            gender: default_gender_keywords(),
            typographic: default_typographic_keywords(),
            structural: default_structural_keywords(),
            input_flooding_min_examples: default_flood_min(),
            input_flooding_max_examples: default_flood_max(),
        }
    }
}

/// Output versioning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Version string stamped into the consolidated manifest
    #[serde(default = "default_curriculum_version")]
    pub curriculum_version: String,
    /// Version string stamped into each record's enhancement marker
    #[serde(default = "default_enhancement_version")]
    pub enhancement_version: String,
}

fn default_curriculum_version() -> String {
    "2.0-PT-Noticing-Shadowing".to_string()
}

fn default_enhancement_version() -> String {
    "2.0".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            curriculum_version: default_curriculum_version(),
            enhancement_version: default_enhancement_version(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML or YAML file (chosen by extension)
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the user configuration if present, otherwise the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = config_path()?;
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid TOML configuration")
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("Invalid YAML configuration")
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Check the static tables for internal consistency
    pub fn validate(&self) -> EngineResult<()> {
        let shadowing = &self.shadowing;

        if shadowing.unlock_day == 0 {
            return Err(EngineError::config("unlock_day must be at least 1"));
        }
        if shadowing.phrases_per_session == 0 {
            return Err(EngineError::config("phrases_per_session must be at least 1"));
        }
        if shadowing.tiers.is_empty() {
            return Err(EngineError::config("at least one difficulty tier is required"));
        }

        for tier in &shadowing.tiers {
            if tier.first_day > tier.last_day {
                return Err(EngineError::config(format!(
                    "tier {} has first_day after last_day",
                    tier.key()
                )));
            }
            if tier.max_words == 0 || tier.speed_multiplier <= 0.0 {
                return Err(EngineError::config(format!(
                    "tier {} needs positive max_words and speed_multiplier",
                    tier.key()
                )));
            }
        }

        for pair in shadowing.tiers.windows(2) {
            if pair[1].first_day != pair[0].last_day + 1 {
                return Err(EngineError::config(format!(
                    "tiers {} and {} are not contiguous",
                    pair[0].key(),
                    pair[1].key()
                )));
            }
        }

        let keywords = &self.techniques;
        if keywords.input_flooding_min_examples > keywords.input_flooding_max_examples {
            return Err(EngineError::config(
                "input_flooding_min_examples exceeds input_flooding_max_examples",
            ));
        }

        Ok(())
    }
}

/// Get the default configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "curriculum-enricher", "curriculum-enricher")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = EngineConfig::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

/// Print the effective configuration
pub fn show_config(config: &EngineConfig) {
    let shadowing = &config.shadowing;

    println!("Drill generation:");
    println!("  unlock day:          {}", shadowing.unlock_day);
    println!("  phrases per session: {}", shadowing.phrases_per_session);
    println!("  session duration:    {} min", shadowing.session_duration_minutes);
    println!("\nDifficulty tiers:");
    for tier in &shadowing.tiers {
        println!(
            "  {:<10} max {:>2} words  {:.1}x  {} / {}",
            tier.key(),
            tier.max_words,
            tier.speed_multiplier,
            tier.primary_focus,
            tier.secondary_focus
        );
    }
    println!("\nTechnique keywords:");
    println!("  verb endings: {}", config.techniques.verb_endings.join(", "));
    println!("  gender:       {}", config.techniques.gender.join(", "));
    println!("  typographic:  {}", config.techniques.typographic.join(", "));
    println!("  structural:   {}", config.techniques.structural.join(", "));
}
