//! Shared types used across modules
//!
//! Small value types shared by the curriculum tables, the audit phases and
//! the enrichment pipeline.

use serde::{Deserialize, Serialize};

/// A curriculum day (unit position, 1-based)
pub type Day = u32;

/// Stage identifier in the competency stage model (1-based)
pub type StageId = u32;

/// Number of units in the fixed curriculum
pub const CURRICULUM_DAYS: Day = 30;

/// Inclusive range of curriculum days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRange {
    pub first_day: Day,
    pub last_day: Day,
}

impl DayRange {
    pub fn new(first_day: Day, last_day: Day) -> Self {
        Self { first_day, last_day }
    }

    /// Whether the day falls inside the range
    pub fn contains(&self, day: Day) -> bool {
        day >= self.first_day && day <= self.last_day
    }

    /// Key used for tier naming, e.g. `day_7_10`
    pub fn key(&self) -> String {
        format!("day_{}_{}", self.first_day, self.last_day)
    }
}

impl std::fmt::Display for DayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Days {}-{}", self.first_day, self.last_day)
    }
}

/// Mean of a sequence of percentages, 0 when empty
pub fn mean_percent(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
