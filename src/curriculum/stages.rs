//! Competency stage model
//!
//! Six ordered processing stages, from single words and formulas up to
//! complex subordination. Each stage above the first names the stage it
//! builds on; the alignment validator checks units against that chain.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::{Day, StageId};

/// A single competency stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub description: String,
    /// Stage that must be taught before this one
    #[serde(default)]
    pub prerequisite: Option<StageId>,
    #[serde(default)]
    pub structures: Vec<String>,
    #[serde(default)]
    pub example_forms: Vec<String>,
    #[serde(default)]
    pub typical_days: Vec<Day>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Immutable, validated table of stages
#[derive(Debug, Clone, Serialize)]
pub struct StageModel {
    stages: Vec<Stage>,
}

impl StageModel {
    /// Build a stage model, checking the ordering and prerequisite invariants
    pub fn new(mut stages: Vec<Stage>) -> EngineResult<Self> {
        if stages.is_empty() {
            return Err(EngineError::config("stage model is empty"));
        }

        stages.sort_by_key(|s| s.id);

        for (index, stage) in stages.iter().enumerate() {
            let expected = index as StageId + 1;
            if stage.id != expected {
                return Err(EngineError::config(format!(
                    "stage ids must be contiguous from 1, found {} where {} was expected",
                    stage.id, expected
                )));
            }

            match (stage.id, stage.prerequisite) {
                (1, Some(p)) => {
                    return Err(EngineError::config(format!(
                        "stage 1 cannot have a prerequisite (found {})",
                        p
                    )));
                }
                (1, None) => {}
                (id, None) => {
                    return Err(EngineError::config(format!(
                        "stage {} has no prerequisite",
                        id
                    )));
                }
                (id, Some(p)) if p == 0 || p >= id => {
                    return Err(EngineError::config(format!(
                        "stage {} references unknown or later prerequisite {}",
                        id, p
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { stages })
    }

    /// The six-stage processability hierarchy for Spanish
    pub fn builtin() -> Self {
        Self { stages: builtin_stages() }
    }

    /// Look up a stage by id
    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Whether a stage with this id exists
    pub fn contains(&self, id: StageId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.id).collect()
    }
}

impl Default for StageModel {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_stages() -> Vec<Stage> {
    vec![
        Stage {
            id: 1,
            name: "Lemma Access (Words/Formulas)".to_string(),
            description: "Single words and memorized chunks - no grammatical processing".to_string(),
            prerequisite: None,
            structures: strings(&[
                "Single vocabulary words",
                "Memorized phrases/chunks",
                "Formulaic expressions",
                "Greetings and farewells",
                "Numbers and colors",
                "Basic nouns (no modification)",
            ]),
            example_forms: strings(&[
                "Hola", "Gracias", "Por favor", "Buenos días", "Me llamo...",
                "¿Cómo estás?", "Muy bien", "uno, dos, tres", "rojo, azul, verde",
            ]),
            typical_days: vec![1, 2, 3],
            keywords: strings(&["greetings", "numbers", "colors", "basics", "phrases", "vocabulary", "words"]),
        },
        Stage {
            id: 2,
            name: "Category Procedure (Lexical Morphology)".to_string(),
            description: "Word-level grammatical marking - gender, number on single words".to_string(),
            prerequisite: Some(1),
            structures: strings(&[
                "Plural marking (-s/-es)",
                "Gender marking (el/la, un/una)",
                "Definite articles",
                "Indefinite articles",
                "Possessive adjectives (mi, tu, su)",
                "Basic demonstratives",
            ]),
            example_forms: strings(&[
                "el libro / los libros",
                "la mesa / las mesas",
                "un coche / una casa",
                "mi hermano / tu hermana / su libro",
            ]),
            typical_days: vec![3, 4, 5, 6, 7],
            keywords: strings(&["articles", "el", "la", "plural", "gender", "possessive", "mi", "tu", "su"]),
        },
        Stage {
            id: 3,
            name: "Phrasal Procedure (Phrase-level Agreement)".to_string(),
            description: "Agreement within phrases - adjective-noun agreement".to_string(),
            prerequisite: Some(2),
            structures: strings(&[
                "Adjective-noun gender agreement",
                "Adjective-noun number agreement",
                "Adjective position (post-nominal)",
                "Demonstrative agreement (este/esta/estos/estas)",
                "Quantifier agreement",
            ]),
            example_forms: strings(&[
                "el coche rojo / la casa roja",
                "los coches rojos / las casas rojas",
                "este libro / esta mesa",
                "estos libros / estas mesas",
                "mucho trabajo / mucha agua",
            ]),
            typical_days: vec![5, 6, 7, 8, 9, 10],
            keywords: strings(&["adjective", "agreement", "este", "esta", "position", "noun phrase"]),
        },
        Stage {
            id: 4,
            name: "Sentence Procedure (S-V Agreement)".to_string(),
            description: "Sentence-level processing - subject-verb agreement, word order".to_string(),
            prerequisite: Some(3),
            structures: strings(&[
                "Present tense conjugation (-AR, -ER, -IR)",
                "Subject-verb agreement",
                "Basic SVO word order",
                "Negation (no + verb)",
                "Yes/no question formation",
                "Basic ser/estar distinction",
                "Ir + a + infinitive (near future)",
            ]),
            example_forms: strings(&[
                "Yo hablo español", "Tú comes pizza", "Él vive en Madrid",
                "No hablo francés", "¿Hablas inglés?",
                "Soy estudiante / Estoy cansado", "Voy a comer",
            ]),
            typical_days: vec![8, 9, 10, 11, 12, 13, 14, 15],
            keywords: strings(&[
                "conjugation", "present tense", "-ar", "-er", "-ir", "verb", "ser", "estar", "negation",
            ]),
        },
        Stage {
            id: 5,
            name: "S-Procedure (Subordinate Clause)".to_string(),
            description: "Inter-phrasal processing - pronouns, reflexives, basic subordination".to_string(),
            prerequisite: Some(4),
            structures: strings(&[
                "Direct object pronouns (lo, la, los, las)",
                "Indirect object pronouns (le, les)",
                "Reflexive verbs (me levanto, se llama)",
                "Que-clauses (Creo que..., Pienso que...)",
                "Preterite tense (basic regular)",
                "Imperfect tense (basic)",
                "Pronoun placement with infinitives",
            ]),
            example_forms: strings(&[
                "Lo quiero", "La veo", "Les doy el libro", "Me levanto a las siete",
                "Creo que es importante", "Ayer comí pizza", "Cuando era niño...",
                "Quiero verlo / Lo quiero ver",
            ]),
            typical_days: vec![15, 16, 17, 18, 19, 20, 21, 22],
            keywords: strings(&[
                "pronoun", "lo", "la", "le", "reflexive", "preterite", "past", "imperfect", "que clause",
            ]),
        },
        Stage {
            id: 6,
            name: "S'-Procedure (Complex Subordination)".to_string(),
            description: "Complex inter-clausal processing - subjunctive, conditionals".to_string(),
            prerequisite: Some(5),
            structures: strings(&[
                "Present subjunctive (basic)",
                "Subjunctive with desire/emotion (quiero que...)",
                "Conditional mood (me gustaría)",
                "If-clauses (si + present)",
                "Relative clauses (que, quien, donde)",
                "Reported speech",
                "Perfect tenses (he comido)",
            ]),
            example_forms: strings(&[
                "Quiero que vengas", "Espero que estés bien", "Me gustaría viajar",
                "Si tengo tiempo, voy", "El libro que leí", "La persona que conocí",
                "He comido ya",
            ]),
            typical_days: vec![22, 23, 24, 25, 26, 27, 28, 29, 30],
            keywords: strings(&[
                "subjunctive", "conditional", "si clause", "relative", "perfect", "he", "has", "ha",
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(id: StageId, prerequisite: Option<StageId>) -> Stage {
        Stage {
            id,
            name: format!("Stage {}", id),
            description: String::new(),
            prerequisite,
            structures: vec![],
            example_forms: vec![],
            typical_days: vec![],
            keywords: vec![],
        }
    }

    #[test]
    fn test_builtin_passes_validation() {
        let builtin = StageModel::builtin();
        let checked = StageModel::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(checked.len(), 6);
        assert_eq!(checked.ids(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_prerequisite_chain() {
        let model = StageModel::builtin();
        assert_eq!(model.get(1).unwrap().prerequisite, None);
        for id in 2..=6 {
            assert_eq!(model.get(id).unwrap().prerequisite, Some(id - 1));
        }
    }

    #[test]
    fn test_unknown_prerequisite_rejected() {
        let err = StageModel::new(vec![stage(1, None), stage(2, Some(3))]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_first_stage_with_prerequisite_rejected() {
        assert!(StageModel::new(vec![stage(1, Some(1))]).is_err());
    }

    #[test]
    fn test_gap_in_ids_rejected() {
        assert!(StageModel::new(vec![stage(1, None), stage(3, Some(1))]).is_err());
    }

    #[test]
    fn test_non_adjacent_prerequisite_allowed() {
        let model = StageModel::new(vec![stage(1, None), stage(2, Some(1)), stage(3, Some(1))]).unwrap();
        assert_eq!(model.get(3).unwrap().prerequisite, Some(1));
    }
}
