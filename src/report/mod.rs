//! Audit reports
//!
//! Renders a finished audit as a Markdown document. The consolidated JSON
//! manifest lives in [`manifest`].

pub mod manifest;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::audit::AuditResults;
use crate::config::ShadowingConfig;
use crate::curriculum::{StageModel, UnitRegistry};
use crate::taxonomy::TechniqueTaxonomy;

pub use manifest::Manifest;

/// Gaps listed individually before the rest are summarized
const GAPS_SHOWN: usize = 10;

/// Status band for a headline score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStatus {
    Good,
    NeedsAttention,
}

impl ScoreStatus {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            ScoreStatus::Good
        } else {
            ScoreStatus::NeedsAttention
        }
    }
}

/// Markdown rendering of an audit
pub struct AuditReport<'a> {
    audit: &'a AuditResults,
    units: &'a UnitRegistry,
    stages: &'a StageModel,
    taxonomy: &'a TechniqueTaxonomy,
    shadowing: &'a ShadowingConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> AuditReport<'a> {
    pub fn new(
        audit: &'a AuditResults,
        units: &'a UnitRegistry,
        stages: &'a StageModel,
        taxonomy: &'a TechniqueTaxonomy,
        shadowing: &'a ShadowingConfig,
    ) -> Self {
        Self {
            audit,
            units,
            stages,
            taxonomy,
            shadowing,
            generated_at: audit.summary.generated_at,
        }
    }

    /// Write the report to a file
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_string())
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Wrote audit report to {}", path.display());
        Ok(())
    }

    fn write_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.audit.summary;

        let alignment = match ScoreStatus::from_score(summary.alignment_score, 90.0) {
            ScoreStatus::Good => "✅ Good",
            ScoreStatus::NeedsAttention => "⚠️ Review needed",
        };
        let coverage = match ScoreStatus::from_score(summary.coverage_score, 80.0) {
            ScoreStatus::Good => "✅ Good",
            ScoreStatus::NeedsAttention => "⚠️ Gaps to fill",
        };
        let readiness = match ScoreStatus::from_score(summary.drill_readiness, 90.0) {
            ScoreStatus::Good => "✅ Ready",
            ScoreStatus::NeedsAttention => "⚠️ Content needed",
        };

        writeln!(f, "## Executive Summary")?;
        writeln!(f)?;
        writeln!(f, "| Area | Score | Status |")?;
        writeln!(f, "|------|-------|--------|")?;
        writeln!(f, "| Stage alignment | {:.1}% | {} |", summary.alignment_score, alignment)?;
        writeln!(f, "| Technique coverage | {:.1}% | {} |", summary.coverage_score, coverage)?;
        writeln!(f, "| Drill readiness | {:.1}% | {} |", summary.drill_readiness, readiness)?;
        writeln!(f)?;
        writeln!(f, "### Action Items")?;
        writeln!(f, "- **Alignment violations to review:** {}", summary.violation_count)?;
        writeln!(f, "- **Coverage gaps to fill:** {}", summary.gap_count)?;
        writeln!(f, "- **Drill phrases to record:** {}", summary.phrases_to_create)?;
        writeln!(f)
    }

    fn write_alignment(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alignment = &self.audit.alignment;

        writeln!(f, "## 1. Stage Alignment")?;
        writeln!(f)?;
        writeln!(f, "| Day | Theme | Stage | Aligned |")?;
        writeln!(f, "|-----|-------|-------|---------|")?;
        for unit in self.units.iter() {
            let aligned = alignment.get(unit.day).is_some_and(|r| r.aligned);
            writeln!(
                f,
                "| {} | {} | Stage {} | {} |",
                unit.day,
                unit.theme,
                unit.declared_stage,
                if aligned { "✅" } else { "⚠️" }
            )?;
        }
        writeln!(f)?;

        writeln!(f, "### Violations Found: {}", alignment.violations.len())?;
        writeln!(f)?;
        if alignment.violations.is_empty() {
            writeln!(f, "*No violations found. Grammar is introduced in stage order.*")?;
        } else {
            for violation in &alignment.violations {
                writeln!(f, "- **Day {}:** {}", violation.day, violation.issue)?;
                writeln!(f, "  - Topics: {}", violation.topics.join(", "))?;
                writeln!(f, "  - Recommendation: {}", violation.recommendation)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "### Stage Reference")?;
        writeln!(f)?;
        writeln!(f, "| Stage | Name | Typical Days |")?;
        writeln!(f, "|-------|------|--------------|")?;
        for stage in self.stages.iter() {
            let days: Vec<String> = stage.typical_days.iter().map(|d| d.to_string()).collect();
            writeln!(f, "| {} | {} | {} |", stage.id, stage.name, days.join(", "))?;
        }
        writeln!(f)
    }

    fn write_coverage(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coverage = &self.audit.coverage;

        writeln!(f, "## 2. Technique Coverage")?;
        writeln!(f)?;
        writeln!(f, "### Techniques Checked")?;
        for (index, rule) in self.taxonomy.rules().iter().enumerate() {
            writeln!(f, "{}. {} (`{}`)", index + 1, rule.category, rule.key)?;
        }
        writeln!(f)?;

        writeln!(f, "| Day | Topics | Coverage |")?;
        writeln!(f, "|-----|--------|----------|")?;
        for unit in coverage.days.values() {
            writeln!(f, "| {} | {} | {:.0}% |", unit.day, unit.topics.len(), unit.coverage_percent)?;
        }
        writeln!(f)?;

        writeln!(f, "### Gaps Found: {}", coverage.gaps.len())?;
        writeln!(f)?;
        if coverage.gaps.is_empty() {
            writeln!(f, "*No gaps found.*")?;
        } else {
            for gap in coverage.gaps.iter().take(GAPS_SHOWN) {
                writeln!(f, "- **Day {}, {}:** missing {}", gap.day, gap.topic, gap.technique)?;
                writeln!(f, "  - {}", gap.recommendation)?;
            }
            if coverage.gaps.len() > GAPS_SHOWN {
                writeln!(f)?;
                writeln!(f, "*...and {} more gaps*", coverage.gaps.len() - GAPS_SHOWN)?;
            }
        }
        writeln!(f)
    }

    fn write_drills(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let drills = &self.audit.drills;

        writeln!(f, "## 3. Drill Generation")?;
        writeln!(f)?;
        writeln!(f, "### Configuration")?;
        writeln!(f, "- **Unlock Day:** {}", self.shadowing.unlock_day)?;
        writeln!(f, "- **Phrases per Session:** {}", self.shadowing.phrases_per_session)?;
        writeln!(f, "- **Session Duration:** {} minutes", self.shadowing.session_duration_minutes)?;
        writeln!(f, "- **Rationale:** {}", self.shadowing.rationale)?;
        writeln!(f)?;

        writeln!(f, "### Difficulty Tiers")?;
        writeln!(f)?;
        writeln!(f, "| Day Range | Max Words | Speed | Primary Focus | Secondary Focus |")?;
        writeln!(f, "|-----------|-----------|-------|---------------|-----------------|")?;
        for tier in &self.shadowing.tiers {
            writeln!(
                f,
                "| {} | {} | {}x | {} | {} |",
                tier.range(),
                tier.max_words,
                tier.speed_multiplier,
                tier.primary_focus,
                tier.secondary_focus
            )?;
        }
        writeln!(f)?;

        writeln!(f, "### Content Requirements")?;
        writeln!(f, "- **Days with Drills:** {}", drills.days_with_drills)?;
        writeln!(f, "- **Total Phrases Needed:** {}", drills.total_phrases_needed)?;
        writeln!(f)
    }
}

impl fmt::Display for AuditReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Curriculum Audit Report")?;
        writeln!(f)?;
        writeln!(f, "**Generated:** {}  ", self.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(
            f,
            "**Preservation Mode:** {}",
            if self.audit.summary.preservation_mode {
                "ENABLED - Only additions, no modifications"
            } else {
                "DISABLED"
            }
        )?;
        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;

        self.write_summary(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        self.write_alignment(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        self.write_coverage(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        self.write_drills(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Auditor;
    use crate::config::EngineConfig;
    use crate::curriculum::Unit;

    fn render(units: &UnitRegistry) -> String {
        let stages = StageModel::builtin();
        let taxonomy = TechniqueTaxonomy::builtin();
        let config = EngineConfig::default();
        let audit = Auditor::new(units, &stages, &taxonomy, &config).run().unwrap();
        AuditReport::new(&audit, units, &stages, &taxonomy, &config.shadowing).to_string()
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(ScoreStatus::from_score(90.0, 90.0), ScoreStatus::Good);
        assert_eq!(ScoreStatus::from_score(89.9, 90.0), ScoreStatus::NeedsAttention);
    }

    #[test]
    fn test_builtin_report_sections() {
        let text = render(&UnitRegistry::builtin());
        assert!(text.starts_with("# Curriculum Audit Report"));
        assert!(text.contains("| Stage alignment | 100.0% | ✅ Good |"));
        assert!(text.contains("| Drill readiness | 100.0% | ✅ Ready |"));
        assert!(text.contains("*No violations found."));
        assert!(text.contains("| Days 7-10 | 5 | 0.8x | rhythm | stress |"));
        assert!(text.contains("- **Total Phrases Needed:** 168"));
        assert!(text.contains("more gaps*"));
    }

    #[test]
    fn test_violations_are_listed() {
        let units = UnitRegistry::new(vec![
            Unit::new(1, "Hi", &["greetings"], 1),
            Unit::new(2, "Verbs", &["-AR verb conjugation"], 4),
        ])
        .unwrap();
        let text = render(&units);
        assert!(text.contains("- **Day 2:** Stage 4 introduced without Stage 3 foundation"));
        assert!(text.contains("  - Topics: -AR verb conjugation"));
        assert!(text.contains("⚠️ Review needed"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let units = UnitRegistry::builtin();
        let stages = StageModel::builtin();
        let taxonomy = TechniqueTaxonomy::builtin();
        let config = EngineConfig::default();
        let audit = Auditor::new(&units, &stages, &taxonomy, &config).run().unwrap();

        let path = dir.path().join("reports").join("audit.md");
        AuditReport::new(&audit, &units, &stages, &taxonomy, &config.shadowing)
            .write(&path)
            .unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("## 3. Drill Generation"));
    }
}
