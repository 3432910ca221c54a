//! Engine error taxonomy
//!
//! `Configuration` is fatal and aborts a run before anything is written.
//! The other variants are per-unit: the pipeline records them in the run
//! summary and moves on to the next unit.

use thiserror::Error;

use crate::types::Day;

/// Errors raised by the alignment/enrichment engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed static tables (unknown stage, broken prerequisite chain, bad tiers)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A unit's source record is absent from the record store
    #[error("Day {day}: source record not found")]
    MissingInput { day: Day },

    /// The record already carries an engine-owned key that was not written by the engine
    #[error("Day {day}: refusing to overwrite author field '{key}'")]
    MergeConflict { day: Day, key: String },

    /// Reading, parsing or writing a record failed
    #[error("Day {day}: {message}")]
    Serialization { day: Day, message: String },
}

impl EngineError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }

    /// Shorthand for a serialization error on a given day
    pub fn serialization(day: Day, message: impl Into<String>) -> Self {
        EngineError::Serialization {
            day,
            message: message.into(),
        }
    }

    /// Whether the error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }
}

/// Engine result alias
pub type EngineResult<T> = std::result::Result<T, EngineError>;
