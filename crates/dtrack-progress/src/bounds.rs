//! Legal range of the earned percentage in the current period

use dtrack_model::{format_percentage, DeliverableProgressContext};
use serde::Serialize;

/// Slack allowed when comparing against a bound
pub const TOLERANCE: f64 = 1e-9;

fn pct(fraction: &f64) -> String {
    format_percentage(*fraction)
}

/// Why a proposed percentage falls outside [`ProgressBounds`]
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BoundViolation {
    /// Lower than what earlier periods already reported
    #[error(
        "Total earned percentage ({}) cannot be less than what's already reported in previous periods ({}).",
        pct(.proposed),
        pct(.minimum)
    )]
    BelowReported { proposed: f64, minimum: f64 },

    /// Higher than the gate ceiling or the room left by later periods
    #[error(
        "Total earned percentage ({}) exceeds the maximum allowed ({}) for this gate.",
        pct(.proposed),
        pct(.maximum)
    )]
    AboveMaximum { proposed: f64, maximum: f64 },
}

/// `[min, max]` a deliverable's earned percentage may be set to
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressBounds {
    /// Share already reported in earlier periods
    pub min: f64,
    /// Gate ceiling, tightened by effort committed to later periods
    pub max: f64,
}

impl ProgressBounds {
    /// Derive bounds; `None` when `total_hours` is not positive
    #[must_use]
    pub fn from_context(ctx: &DeliverableProgressContext) -> Option<Self> {
        // also rejects NaN
        if !(ctx.total_hours > 0.0) {
            return None;
        }
        let min = ctx.units_before() / ctx.total_hours;
        let future_ceiling = 1.0 - ctx.units_after() / ctx.total_hours;
        Some(Self {
            min,
            max: ctx.current_gate_max_percentage.min(future_ceiling),
        })
    }

    /// Check a normalized percentage; the lower bound is reported first
    ///
    /// # Errors
    /// Returns the violated bound.
    pub fn check(&self, proposed: f64) -> Result<(), BoundViolation> {
        if proposed < self.min - TOLERANCE {
            return Err(BoundViolation::BelowReported {
                proposed,
                minimum: self.min,
            });
        }
        if proposed > self.max + TOLERANCE {
            return Err(BoundViolation::AboveMaximum {
                proposed,
                maximum: self.max,
            });
        }
        Ok(())
    }

    /// Check if no value satisfies both bounds
    #[inline]
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        self.min > self.max + TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtrack_model::{Period, ProgressEntry};

    fn ctx(total_hours: f64, gate_max: f64, entries: Vec<ProgressEntry>) -> DeliverableProgressContext {
        DeliverableProgressContext {
            total_hours,
            current_gate_max_percentage: gate_max,
            current_period: Period::new(5),
            progress_entries: entries,
        }
    }

    #[test]
    fn past_entries_raise_floor() {
        let bounds = ProgressBounds::from_context(&ctx(
            100.0,
            1.0,
            vec![ProgressEntry::new(1, 15.0), ProgressEntry::new(4, 25.0)],
        ))
        .unwrap();
        assert_eq!(bounds.min, 0.4);
        assert_eq!(bounds.max, 1.0);
    }

    #[test]
    fn future_entries_lower_ceiling_below_gate() {
        let bounds =
            ProgressBounds::from_context(&ctx(100.0, 0.9, vec![ProgressEntry::new(6, 20.0)]))
                .unwrap();
        assert_eq!(bounds.min, 0.0);
        assert!((bounds.max - 0.8).abs() < TOLERANCE);
    }

    #[test]
    fn current_period_entry_is_ignored() {
        let bounds =
            ProgressBounds::from_context(&ctx(100.0, 0.7, vec![ProgressEntry::new(5, 50.0)]))
                .unwrap();
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 0.7);
    }

    #[test]
    fn no_denominator_no_bounds() {
        assert!(ProgressBounds::from_context(&ctx(0.0, 0.5, Vec::new())).is_none());
        assert!(ProgressBounds::from_context(&ctx(-4.0, 0.5, Vec::new())).is_none());
        assert!(ProgressBounds::from_context(&ctx(f64::NAN, 0.5, Vec::new())).is_none());
    }

    #[test]
    fn boundaries_are_inclusive() {
        let bounds = ProgressBounds { min: 0.4, max: 0.8 };
        assert!(bounds.check(0.4).is_ok());
        assert!(bounds.check(0.8).is_ok());
        // 0.1 + 0.2 + 0.1 is not exactly 0.4 in binary
        assert!(bounds.check(0.1 + 0.2 + 0.1).is_ok());
    }

    #[test]
    fn violation_messages() {
        let bounds = ProgressBounds { min: 0.4, max: 0.8 };
        assert_eq!(
            bounds.check(0.3).unwrap_err().to_string(),
            "Total earned percentage (30.00%) cannot be less than what's already reported in previous periods (40.00%)."
        );
        assert_eq!(
            bounds.check(0.9).unwrap_err().to_string(),
            "Total earned percentage (90.00%) exceeds the maximum allowed (80.00%) for this gate."
        );
    }

    #[test]
    fn infeasible_range_reports_floor() {
        let bounds = ProgressBounds { min: 0.6, max: 0.5 };
        assert!(bounds.is_infeasible());
        assert!(matches!(
            bounds.check(0.55),
            Err(BoundViolation::BelowReported { .. })
        ));
    }
}
