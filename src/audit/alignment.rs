//! Alignment validator
//!
//! Checks that every unit's declared stage has its prerequisite stage taught
//! on some earlier day. Only direct presence of the prerequisite counts: a
//! prerequisite day that is itself misaligned still satisfies later units.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::curriculum::{StageModel, UnitRegistry};
use crate::error::{EngineError, EngineResult};
use crate::types::{Day, StageId};

/// Alignment verdict for one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentResult {
    pub day: Day,
    pub declared_stage: StageId,
    pub stage_name: String,
    pub prerequisite_stage: Option<StageId>,
    pub prerequisite_satisfied: bool,
    /// Currently the same as `prerequisite_satisfied`
    pub aligned: bool,
}

/// A unit whose stage arrives before its foundation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentViolation {
    pub day: Day,
    pub issue: String,
    pub topics: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    pub results: BTreeMap<Day, AlignmentResult>,
    pub violations: Vec<AlignmentViolation>,
    pub aligned_days: usize,
    pub total_days: usize,
    /// Percentage of aligned days
    pub score: f64,
}

impl AlignmentReport {
    pub fn get(&self, day: Day) -> Option<&AlignmentResult> {
        self.results.get(&day)
    }

    pub fn is_fully_aligned(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate every unit against the stage prerequisite chain.
///
/// An unknown declared stage is a configuration error and nothing is
/// returned for any unit.
pub fn validate(units: &UnitRegistry, stages: &StageModel) -> EngineResult<AlignmentReport> {
    info!("Validating stage alignment for {} units", units.len());

    for unit in units.iter() {
        if !stages.contains(unit.declared_stage) {
            return Err(EngineError::config(format!(
                "day {} declares unknown stage {}",
                unit.day, unit.declared_stage
            )));
        }
    }

    let mut results = BTreeMap::new();
    let mut violations = Vec::new();

    for unit in units.iter() {
        let Some(stage) = stages.get(unit.declared_stage) else {
            continue;
        };

        let satisfied = match stage.prerequisite {
            None => true,
            Some(prerequisite) => units
                .iter()
                .take_while(|earlier| earlier.day < unit.day)
                .any(|earlier| earlier.declared_stage == prerequisite),
        };

        debug!(
            day = unit.day,
            stage = unit.declared_stage,
            satisfied,
            "Checked prerequisite"
        );

        if let (false, Some(prerequisite)) = (satisfied, stage.prerequisite) {
            warn!(
                "Day {}: stage {} introduced before stage {}",
                unit.day, stage.id, prerequisite
            );
            violations.push(AlignmentViolation {
                day: unit.day,
                issue: format!(
                    "Stage {} introduced without Stage {} foundation",
                    stage.id, prerequisite
                ),
                topics: unit.topics.clone(),
                recommendation: format!(
                    "Ensure Stage {} content precedes Day {}",
                    prerequisite, unit.day
                ),
            });
        }

        results.insert(
            unit.day,
            AlignmentResult {
                day: unit.day,
                declared_stage: unit.declared_stage,
                stage_name: stage.name.clone(),
                prerequisite_stage: stage.prerequisite,
                prerequisite_satisfied: satisfied,
                aligned: satisfied,
            },
        );
    }

    let aligned_days = results.values().filter(|r| r.aligned).count();
    let total_days = results.len();
    let score = if total_days == 0 {
        0.0
    } else {
        aligned_days as f64 / total_days as f64 * 100.0
    };

    info!("Alignment: {}/{} days aligned ({:.1}%)", aligned_days, total_days, score);

    Ok(AlignmentReport {
        results,
        violations,
        aligned_days,
        total_days,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{Stage, Unit};

    fn registry(stages: &[StageId]) -> UnitRegistry {
        let units = stages
            .iter()
            .enumerate()
            .map(|(i, s)| Unit::new(i as Day + 1, "Theme", &["topic"], *s))
            .collect();
        UnitRegistry::new(units).unwrap()
    }

    #[test]
    fn test_builtin_curriculum_is_aligned() {
        let report = validate(&UnitRegistry::builtin(), &StageModel::builtin()).unwrap();
        assert_eq!(report.total_days, 30);
        assert_eq!(report.aligned_days, 30);
        assert!((report.score - 100.0).abs() < 1e-9);
        assert!(report.is_fully_aligned());
    }

    #[test]
    fn test_stage_one_always_satisfied() {
        let report = validate(&registry(&[1, 1, 1]), &StageModel::builtin()).unwrap();
        assert!(report.results.values().all(|r| r.prerequisite_satisfied && r.aligned));
    }

    #[test]
    fn test_skipped_stage_is_violation() {
        let report = validate(&registry(&[1, 3]), &StageModel::builtin()).unwrap();
        let day2 = report.get(2).unwrap();
        assert!(!day2.prerequisite_satisfied);
        assert!(!day2.aligned);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].issue, "Stage 3 introduced without Stage 2 foundation");
        assert_eq!(report.violations[0].recommendation, "Ensure Stage 2 content precedes Day 2");
        assert!((report.score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_prerequisite_must_come_earlier() {
        // stage 2 on day 1 is not satisfied by stage 1 on day 2
        let report = validate(&registry(&[2, 1]), &StageModel::builtin()).unwrap();
        assert!(!report.get(1).unwrap().aligned);
        assert!(report.get(2).unwrap().aligned);
    }

    #[test]
    fn test_taint_is_not_propagated() {
        // day 2 is misaligned but still satisfies day 3
        let report = validate(&registry(&[1, 3, 4]), &StageModel::builtin()).unwrap();
        assert!(!report.get(2).unwrap().aligned);
        assert!(report.get(3).unwrap().aligned);
    }

    fn branching_model() -> StageModel {
        let stage = |id: StageId, prerequisite: Option<StageId>| Stage {
            id,
            name: format!("Stage {}", id),
            description: String::new(),
            prerequisite,
            structures: vec![],
            example_forms: vec![],
            typical_days: vec![],
            keywords: vec![],
        };
        StageModel::new(vec![stage(1, None), stage(2, Some(1)), stage(3, Some(1))]).unwrap()
    }

    #[test]
    fn test_configured_prerequisite_is_checked() {
        // stage 3 builds on stage 1 directly
        let report = validate(&registry(&[1, 3]), &branching_model()).unwrap();
        let day2 = report.get(2).unwrap();
        assert_eq!(day2.prerequisite_stage, Some(1));
        assert!(day2.prerequisite_satisfied);
        assert!(report.violations.is_empty());

        // an earlier stage 2 day alone does not count
        let report = validate(&registry(&[2, 3]), &branching_model()).unwrap();
        assert!(!report.get(1).unwrap().prerequisite_satisfied);
        assert!(!report.get(2).unwrap().prerequisite_satisfied);
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn test_unknown_stage_is_fatal() {
        let err = validate(&registry(&[1, 7]), &StageModel::builtin()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("unknown stage 7"));
    }
}
