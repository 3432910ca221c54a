//! Enrichment pipeline
//!
//! One batch pass over the curriculum: audit first, then load, merge and
//! write each unit's record in day order. Only configuration errors stop a
//! run, and they are raised before any record is written. Everything else is
//! recorded per unit in the [`RunSummary`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::audit::{AuditResults, Auditor};
use crate::config::EngineConfig;
use crate::curriculum::{StageModel, UnitRegistry};
use crate::error::{EngineError, EngineResult};
use crate::taxonomy::TechniqueTaxonomy;
use crate::types::Day;

use super::merge::{merge, Enrichment};
use super::store::RecordStore;

/// Outcome category of one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Succeeded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    pub day: Day,
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregated per-unit results of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub enhanced_at: DateTime<Utc>,
    pub outcomes: Vec<UnitOutcome>,
}

impl RunSummary {
    fn new(dry_run: bool, enhanced_at: DateTime<Utc>) -> Self {
        Self {
            succeeded: 0,
            skipped: 0,
            failed: 0,
            dry_run,
            enhanced_at,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, day: Day, status: UnitStatus, message: Option<String>) {
        match status {
            UnitStatus::Succeeded => self.succeeded += 1,
            UnitStatus::Skipped => self.skipped += 1,
            UnitStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(UnitOutcome { day, status, message });
    }

    fn record_error(&mut self, error: &EngineError) {
        let (day, status) = match error {
            EngineError::MissingInput { day } => (*day, UnitStatus::Skipped),
            EngineError::MergeConflict { day, .. } | EngineError::Serialization { day, .. } => {
                (*day, UnitStatus::Failed)
            }
            EngineError::Configuration(_) => {
                warn!("Not recorded against a unit: {}", error);
                return;
            }
        };
        warn!("{}", error);
        self.record(day, status, Some(error.to_string()));
    }

    /// Whether every unit either succeeded or was skipped
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    pub fn with_status(&self, status: UnitStatus) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "Enrichment results{}:", mode)?;
        writeln!(f, "  ✅ Succeeded: {}", self.succeeded)?;
        writeln!(f, "  ⏭️  Skipped:   {}", self.skipped)?;
        writeln!(f, "  ❌ Failed:    {}", self.failed)?;

        for outcome in &self.outcomes {
            if let Some(message) = &outcome.message {
                writeln!(f, "     - {}", message)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Compute everything but leave the store untouched
    pub dry_run: bool,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub audit: AuditResults,
    pub summary: RunSummary,
    /// Enriched records of the units that succeeded
    pub records: BTreeMap<Day, Value>,
}

/// Audits the curriculum and merges the results into a record store
pub struct EnrichmentPipeline<'a> {
    units: &'a UnitRegistry,
    stages: &'a StageModel,
    taxonomy: &'a TechniqueTaxonomy,
    config: &'a EngineConfig,
}

impl<'a> EnrichmentPipeline<'a> {
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

    pub fn audit(&self, generated_at: DateTime<Utc>) -> EngineResult<AuditResults> {
        Auditor::new(self.units, self.stages, self.taxonomy, self.config).run_at(generated_at)
    }

    pub fn run(&self, store: &dyn RecordStore, options: PipelineOptions) -> EngineResult<PipelineRun> {
        self.run_at(store, options, Utc::now())
    }

    /// Run the full pipeline with a fixed enhancement timestamp
    pub fn run_at(
        &self,
        store: &dyn RecordStore,
        options: PipelineOptions,
        enhanced_at: DateTime<Utc>,
    ) -> EngineResult<PipelineRun> {
        let audit = self.audit(enhanced_at)?;
        let enrichments = self.enrichments(&audit)?;

        info!(
            "Enriching {} units{}",
            enrichments.len(),
            if options.dry_run { " (dry run)" } else { "" }
        );

        let mut summary = RunSummary::new(options.dry_run, enhanced_at);
        let mut records = BTreeMap::new();

        for enrichment in &enrichments {
            let day = enrichment.day;
            match self.enrich_unit(store, enrichment, enhanced_at, options) {
                Ok(record) => {
                    info!("Day {}: enriched", day);
                    summary.record(day, UnitStatus::Succeeded, None);
                    records.insert(day, record);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => summary.record_error(&error),
            }
        }

        info!(
            "Run complete: {} succeeded, {} skipped, {} failed",
            summary.succeeded, summary.skipped, summary.failed
        );

        Ok(PipelineRun {
            audit,
            summary,
            records,
        })
    }

    /// Enriched records built over empty author records, without a store
    pub fn preview(
        &self,
        audit: &AuditResults,
        enhanced_at: DateTime<Utc>,
    ) -> EngineResult<BTreeMap<Day, Value>> {
        self.enrichments(audit)?
            .iter()
            .map(|e| Ok((e.day, merge(Value::Object(Map::new()), e, enhanced_at)?)))
            .collect()
    }

    fn enrichments(&self, audit: &AuditResults) -> EngineResult<Vec<Enrichment>> {
        self.units
            .iter()
            .map(|unit| {
                Enrichment::from_audit(
                    unit.day,
                    audit,
                    self.stages,
                    self.taxonomy,
                    &self.config.output,
                )
                .ok_or_else(|| {
                    EngineError::config(format!("audit produced no results for day {}", unit.day))
                })
            })
            .collect()
    }

    fn enrich_unit(
        &self,
        store: &dyn RecordStore,
        enrichment: &Enrichment,
        enhanced_at: DateTime<Utc>,
        options: PipelineOptions,
    ) -> EngineResult<Value> {
        let day = enrichment.day;
        let existing = store.load(day)?.ok_or(EngineError::MissingInput { day })?;
        let enriched = merge(existing, enrichment, enhanced_at)?;

        if !options.dry_run {
            store.write(day, &enriched)?;
        }

        Ok(enriched)
    }
}
