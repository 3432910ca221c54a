//! Record enrichment
//!
//! - `merge` - additive, idempotent merge of engine blocks into a record
//! - `store` - the record store trait and the `dayNN.json` directory store
//! - `pipeline` - batch run over all units with a per-unit run summary

pub mod merge;
pub mod pipeline;
pub mod store;

pub use merge::{is_enriched, merge, Enrichment, ENGINE_KEYS};
pub use pipeline::{EnrichmentPipeline, PipelineOptions, PipelineRun, RunSummary, UnitOutcome, UnitStatus};
pub use store::{BackupOutcome, DayStore, RecordStore};
