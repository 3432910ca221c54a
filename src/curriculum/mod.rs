//! Curriculum tables
//!
//! The static inputs the engine audits: the competency stage model and the
//! ordered unit registry.

pub mod stages;
pub mod units;

pub use stages::{Stage, StageModel};
pub use units::{Unit, UnitRegistry};
