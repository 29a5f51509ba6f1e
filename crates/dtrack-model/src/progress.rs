//! Progress entries and the per-deliverable progress context

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential reporting period (e.g. month number since project start)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub u32);

impl Period {
    /// Create period from its index
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Effort units reported against a deliverable for one period
///
/// At most one entry per (deliverable, period) is expected; callers are
/// trusted to uphold that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Period the units were reported in
    pub period: Period,
    /// Reported effort units (hours)
    pub units: f64,
}

impl ProgressEntry {
    /// Create entry
    #[inline]
    #[must_use]
    pub const fn new(period: u32, units: f64) -> Self {
        Self {
            period: Period(period),
            units,
        }
    }
}

/// Inputs the progress bounds are derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableProgressContext {
    /// Total committed effort of the deliverable
    pub total_hours: f64,
    /// Ceiling from the deliverable's current gate (fraction 0..1)
    pub current_gate_max_percentage: f64,
    /// Active reporting period
    pub current_period: Period,
    /// Already recorded entries for the deliverable
    pub progress_entries: Vec<ProgressEntry>,
}

impl DeliverableProgressContext {
    /// Sum of units reported strictly before the current period
    #[must_use]
    pub fn units_before(&self) -> f64 {
        self.progress_entries
            .iter()
            .filter(|e| e.period < self.current_period)
            .map(|e| e.units)
            .sum()
    }

    /// Sum of units reported strictly after the current period
    #[must_use]
    pub fn units_after(&self) -> f64 {
        self.progress_entries
            .iter()
            .filter(|e| e.period > self.current_period)
            .map(|e| e.units)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(entries: Vec<ProgressEntry>) -> DeliverableProgressContext {
        DeliverableProgressContext {
            total_hours: 100.0,
            current_gate_max_percentage: 1.0,
            current_period: Period(5),
            progress_entries: entries,
        }
    }

    #[test]
    fn current_period_units_are_neither_past_nor_future() {
        let ctx = context(vec![
            ProgressEntry::new(3, 10.0),
            ProgressEntry::new(4, 15.0),
            ProgressEntry::new(5, 30.0),
            ProgressEntry::new(7, 5.0),
        ]);

        assert_eq!(ctx.units_before(), 25.0);
        assert_eq!(ctx.units_after(), 5.0);
    }

    #[test]
    fn empty_entries_sum_to_zero() {
        let ctx = context(Vec::new());
        assert_eq!(ctx.units_before(), 0.0);
        assert_eq!(ctx.units_after(), 0.0);
    }

    #[test]
    fn period_display() {
        assert_eq!(Period::new(12).to_string(), "P12");
    }
}
