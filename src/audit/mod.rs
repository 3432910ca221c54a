//! Curriculum audit
//!
//! Runs the three audit phases in order (alignment, coverage, drills) over
//! the unit registry and rolls the results into a summary. A configuration
//! error in any phase aborts the audit.

pub mod alignment;
pub mod coverage;
pub mod drills;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::curriculum::{StageModel, UnitRegistry};
use crate::error::EngineResult;
use crate::taxonomy::TechniqueTaxonomy;
use crate::types::Day;

pub use alignment::{validate, AlignmentReport, AlignmentResult, AlignmentViolation};
pub use coverage::{score, CoverageGap, CoverageReport, CoverageResult, UnitCoverage};
pub use drills::{
    DisabledMarker, DrillGenerator, DrillManifest, DrillOutcome, DrillReport, PhraseSpec,
    SourceType,
};

/// Headline numbers of an audit run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub generated_at: DateTime<Utc>,
    pub alignment_score: f64,
    pub coverage_score: f64,
    /// Share of drill-eligible days that received a manifest
    pub drill_readiness: f64,
    pub violation_count: usize,
    pub gap_count: usize,
    pub phrases_to_create: usize,
    pub preservation_mode: bool,
}

/// Everything one audit run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResults {
    pub alignment: AlignmentReport,
    pub coverage: CoverageReport,
    pub drills: DrillReport,
    pub summary: AuditSummary,
}

/// Runs the audit phases against a fixed set of tables
pub struct Auditor<'a> {
    units: &'a UnitRegistry,
    stages: &'a StageModel,
    taxonomy: &'a TechniqueTaxonomy,
    config: &'a EngineConfig,
}

impl<'a> Auditor<'a> {
    pub fn new(
        units: &'a UnitRegistry,
        stages: &'a StageModel,
        taxonomy: &'a TechniqueTaxonomy,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            units,
            stages,
            taxonomy,
            config,
        }
    }

    pub fn run(&self) -> EngineResult<AuditResults> {
        self.run_at(Utc::now())
    }

    /// Run the audit with a fixed timestamp
    pub fn run_at(&self, generated_at: DateTime<Utc>) -> EngineResult<AuditResults> {
        self.config.validate()?;

        info!("Phase 1: stage alignment");
        let alignment = validate(self.units, self.stages)?;

        info!("Phase 2: technique coverage");
        let coverage = score(self.units, self.taxonomy);

        info!("Phase 3: drill generation");
        let drills = DrillGenerator::new(&self.config.shadowing).generate_all(self.units)?;

        let summary = AuditSummary {
            generated_at,
            alignment_score: alignment.score,
            coverage_score: coverage.overall_coverage,
            drill_readiness: drill_readiness(&drills, self.units.last_day()),
            violation_count: alignment.violations.len(),
            gap_count: coverage.gaps.len(),
            phrases_to_create: drills.total_phrases_needed,
            preservation_mode: true,
        };

        Ok(AuditResults {
            alignment,
            coverage,
            drills,
            summary,
        })
    }
}

fn drill_readiness(drills: &DrillReport, last_day: Day) -> f64 {
    if drills.unlock_day > last_day {
        return 0.0;
    }
    let eligible = (last_day - drills.unlock_day.max(1) + 1) as f64;
    drills.days_with_drills as f64 / eligible * 100.0
}
