//! Curriculum Enricher - Stage Alignment & Enrichment Engine
//!
//! Audits a fixed 30-day Spanish curriculum and enriches its unit records:
//! - Stage alignment against a six-stage prerequisite chain
//! - Coverage scoring against six noticing techniques
//! - Deterministic shadowing drill manifests, unlocked from day 7
//! - Additive, idempotent merge into author-owned JSON records
//! - Markdown audit report and consolidated JSON manifest
//!
//! # Example
//!
//! ```ignore
//! use curriculum_enricher::{EngineConfig, StageModel, TechniqueTaxonomy, UnitRegistry};
//! use curriculum_enricher::audit::Auditor;
//!
//! let units = UnitRegistry::builtin();
//! let stages = StageModel::builtin();
//! let taxonomy = TechniqueTaxonomy::builtin();
//! let config = EngineConfig::default();
//!
//! let results = Auditor::new(&units, &stages, &taxonomy, &config).run()?;
//! println!("alignment {:.1}%", results.summary.alignment_score);
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod error;
pub mod config;
pub mod curriculum;
pub mod taxonomy;
pub mod cli;

// Engine phases
pub mod audit;    // Alignment, coverage and drill generation
pub mod enrich;   // Merge, record store and batch pipeline
pub mod report;   // Markdown report and JSON manifest

// Re-export commonly used types for convenience
pub use config::EngineConfig;

pub use curriculum::{
    Stage,
    StageModel,
    Unit,
    UnitRegistry,
};

pub use error::{EngineError, EngineResult};

pub use taxonomy::{TechniqueKey, TechniqueTaxonomy};

pub use audit::{AuditResults, Auditor, DrillGenerator, DrillOutcome};

pub use enrich::{
    DayStore,
    EnrichmentPipeline,
    PipelineOptions,
    RecordStore,
    RunSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Curriculum Alignment & Enrichment Engine", NAME, VERSION)
}
