//! Unit registry
//!
//! The ordered 30-day curriculum. Each unit carries its theme, the grammar
//! topic labels it teaches and the stage it claims to belong to. A custom
//! curriculum can be loaded from TOML or YAML as a list of `[[units]]`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::types::{Day, StageId};

/// One curriculum day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub day: Day,
    pub theme: String,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Stage the unit declares it teaches at
    #[serde(alias = "stage")]
    pub declared_stage: StageId,
}

impl Unit {
    pub fn new(day: Day, theme: &str, topics: &[&str], declared_stage: StageId) -> Self {
        Self {
            day,
            theme: theme.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            declared_stage,
        }
    }
}

/// On-disk layout of a curriculum file
#[derive(Debug, Deserialize)]
struct UnitFile {
    units: Vec<Unit>,
}

/// Validated, day-ordered sequence of units
#[derive(Debug, Clone, Serialize)]
pub struct UnitRegistry {
    units: Vec<Unit>,
}

impl UnitRegistry {
    /// Build a registry. Days must be unique and contiguous starting at 1.
    pub fn new(mut units: Vec<Unit>) -> EngineResult<Self> {
        if units.is_empty() {
            return Err(EngineError::config("curriculum has no units"));
        }

        units.sort_by_key(|u| u.day);

        for (index, unit) in units.iter().enumerate() {
            let expected = index as Day + 1;
            if unit.day != expected {
                return Err(EngineError::config(format!(
                    "unit days must be contiguous from 1, found day {} where day {} was expected",
                    unit.day, expected
                )));
            }
        }

        Ok(Self { units })
    }

    /// The stock 30-day Spanish curriculum
    pub fn builtin() -> Self {
        Self { units: builtin_units() }
    }

    /// Load a curriculum file, TOML or YAML by extension
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curriculum file {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
        .with_context(|| format!("Failed to load curriculum file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: UnitFile = toml::from_str(s).context("Invalid TOML curriculum")?;
        Ok(Self::new(file.units)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let file: UnitFile = serde_yaml::from_str(s).context("Invalid YAML curriculum")?;
        Ok(Self::new(file.units)?)
    }

    pub fn get(&self, day: Day) -> Option<&Unit> {
        self.units.get(day.checked_sub(1)? as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Last day in the curriculum
    pub fn last_day(&self) -> Day {
        self.units.len() as Day
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_units() -> Vec<Unit> {
    vec![
        Unit::new(1, "Greetings & Introductions", &["Basic greetings", "Me llamo...", "Ser (yo soy)"], 1),
        Unit::new(2, "Numbers & Age", &["Numbers 1-20", "Tener (age)", "¿Cuántos años tienes?"], 1),
        Unit::new(3, "Family & Descriptions", &["Family vocabulary", "Gender of nouns", "Articles el/la"], 2),
        Unit::new(4, "Colors & Adjectives", &["Colors", "Adjective basics", "Plural nouns"], 2),
        Unit::new(5, "Home & Rooms", &["House vocabulary", "Hay (there is/are)", "Possessives mi/tu/su"], 2),
        Unit::new(6, "Daily Objects", &["Common objects", "Demonstratives este/esta", "Gender agreement"], 3),
        Unit::new(7, "Food & Drink", &["Food vocabulary", "Querer (to want)", "Adjective agreement"], 3),
        Unit::new(8, "Restaurant", &["Restaurant phrases", "-AR verb conjugation", "Me gustaría"], 4),
        Unit::new(9, "Time & Schedule", &["Time expressions", "Numbers 21-100", "-ER verb conjugation"], 4),
        Unit::new(10, "Days & Weather", &["Days of week", "Weather expressions", "-IR verb conjugation"], 4),
        Unit::new(11, "Clothing & Shopping", &["Clothing vocabulary", "Costar/Llevar", "Question formation"], 4),
        Unit::new(12, "Body & Health", &["Body parts", "Doler (to hurt)", "Negation"], 4),
        Unit::new(13, "Directions", &["Direction vocabulary", "Estar (location)", "Prepositions"], 4),
        Unit::new(14, "Transportation", &["Transport vocabulary", "Ir (to go)", "Ir + a + infinitive"], 4),
        Unit::new(15, "Daily Routine", &["Routine vocabulary", "Reflexive verbs", "Time expressions"], 5),
        Unit::new(16, "Work & Professions", &["Profession vocabulary", "Ser vs Estar review", "Direct object pronouns"], 5),
        Unit::new(17, "Hobbies & Free Time", &["Hobby vocabulary", "Gustar (full)", "Indirect object pronouns"], 5),
        Unit::new(18, "Past Events (I)", &["Time markers", "Preterite regular -AR", "Yesterday/last week"], 5),
        Unit::new(19, "Past Events (II)", &["Preterite regular -ER/-IR", "Sequencing words", "Common irregulars"], 5),
        Unit::new(20, "Childhood Memories", &["Imperfect tense intro", "Cuando era niño...", "Descriptions in past"], 5),
        Unit::new(21, "Travel Planning", &["Travel vocabulary", "Future with ir a", "Pronoun placement"], 5),
        Unit::new(22, "At the Hotel", &["Hotel vocabulary", "Conditional basics", "Polite requests"], 6),
        Unit::new(23, "Sightseeing", &["Tourism vocabulary", "Comparatives", "Relative clauses (que)"], 6),
        Unit::new(24, "Emergencies", &["Emergency vocabulary", "Commands (informal)", "Deber/Tener que"], 6),
        Unit::new(25, "Phone & Technology", &["Tech vocabulary", "Present perfect intro", "He/Has/Ha + participle"], 6),
        Unit::new(26, "Expressing Opinions", &["Opinion phrases", "Subjunctive intro", "Creo que vs No creo que"], 6),
        Unit::new(27, "Making Plans", &["Planning vocabulary", "Subjunctive with desires", "Quiero que + subjunctive"], 6),
        Unit::new(28, "Hypotheticals", &["Si clauses (present)", "Conditional review", "If I had..."], 6),
        Unit::new(29, "Storytelling", &["Narrative vocabulary", "Preterite vs Imperfect", "Sequencing a story"], 6),
        Unit::new(30, "Review & Conversation", &["All tenses review", "Conversation strategies", "Fluency practice"], 6),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CURRICULUM_DAYS;

    #[test]
    fn test_builtin_is_contiguous() {
        let registry = UnitRegistry::builtin();
        assert_eq!(registry.len(), CURRICULUM_DAYS as usize);
        let checked = UnitRegistry::new(registry.units().to_vec()).unwrap();
        assert_eq!(checked.last_day(), 30);
        assert_eq!(checked.get(8).unwrap().theme, "Restaurant");
        assert!(checked.get(0).is_none());
        assert!(checked.get(31).is_none());
    }

    #[test]
    fn test_missing_day_rejected() {
        let units = vec![Unit::new(1, "A", &[], 1), Unit::new(3, "C", &[], 1)];
        let err = UnitRegistry::new(units).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_duplicate_day_rejected() {
        let units = vec![Unit::new(1, "A", &[], 1), Unit::new(1, "B", &[], 1)];
        assert!(UnitRegistry::new(units).is_err());
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let units = vec![Unit::new(2, "B", &[], 2), Unit::new(1, "A", &[], 1)];
        let registry = UnitRegistry::new(units).unwrap();
        assert_eq!(registry.get(1).unwrap().theme, "A");
    }

    #[test]
    fn test_toml_curriculum() {
        let registry = UnitRegistry::from_toml_str(
            r#"
            [[units]]
            day = 1
            theme = "Greetings"
            topics = ["greetings"]
            declaredStage = 1

            [[units]]
            day = 2
            theme = "Articles"
            topics = ["Articles el/la"]
            stage = 2
            "#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(2).unwrap().declared_stage, 2);
    }

    #[test]
    fn test_yaml_curriculum() {
        let yaml = "units:\n  - day: 1\n    theme: Greetings\n    topics: [greetings]\n    declaredStage: 1\n";
        let registry = UnitRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.get(1).unwrap().topics, vec!["greetings"]);
    }
}
