//! Accept or reject a proposed deliverable edit
//!
//! The validator is synchronous and side-effect free: it never mutates the
//! entries it is given and performs no I/O, so it can run on every keystroke.
//! Callers persist accepted values and re-fetch progress entries afterwards.

use crate::bounds::{BoundViolation, ProgressBounds};
use crate::edit::ProgressEdit;
use dtrack_model::{
    normalize_percentage, DeliverablePatch, DeliverableProgressContext, DeliverableRecord, Gate,
    GateSet, Period, ProgressEntry,
};
use serde::{Deserialize, Serialize};

/// Everything needed to judge one edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Stored deliverable before the edit
    pub original: DeliverableRecord,
    /// Proposed changes
    #[serde(default)]
    pub patch: DeliverablePatch,
    /// The deliverable's recorded progress, fetched just before validating
    #[serde(default)]
    pub entries: Vec<ProgressEntry>,
    /// Active reporting period
    pub current_period: Period,
}

impl ValidationRequest {
    /// Create request
    #[must_use]
    pub fn new(
        original: DeliverableRecord,
        patch: DeliverablePatch,
        entries: Vec<ProgressEntry>,
        current_period: Period,
    ) -> Self {
        Self {
            original,
            patch,
            entries,
            current_period,
        }
    }

    /// Stored record overlaid with the patch
    #[must_use]
    pub fn merged(&self) -> DeliverableRecord {
        self.original.merged(&self.patch)
    }
}

/// Verdict on one edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    /// Whether the edit may be saved
    pub valid: bool,
    /// Message for display next to the edited field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    /// Earned percentage to store: the normalized typed value or a gate's
    /// automatic percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl ValidationOutcome {
    /// Accepted, nothing to apply
    #[inline]
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error_text: None,
            percentage: None,
        }
    }

    /// Rejected with a display message
    #[inline]
    #[must_use]
    pub fn rejected(error_text: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_text: Some(error_text.into()),
            percentage: None,
        }
    }
}

impl From<BoundViolation> for ValidationOutcome {
    fn from(violation: BoundViolation) -> Self {
        Self::rejected(violation.to_string())
    }
}

/// Period-scoped earned-percentage validator
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressValidator;

impl ProgressValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Assemble the bounds inputs for a deliverable sitting at `gate`
    #[must_use]
    pub fn context_for(
        record: &DeliverableRecord,
        gate: &Gate,
        entries: &[ProgressEntry],
        current_period: Period,
    ) -> DeliverableProgressContext {
        DeliverableProgressContext {
            total_hours: record.total_hours,
            current_gate_max_percentage: gate.max_percentage,
            current_period,
            progress_entries: entries.to_vec(),
        }
    }

    /// Normalize `proposed` and check it against the context's bounds
    ///
    /// Returns the normalized fraction.
    ///
    /// # Errors
    /// Returns the violated bound.
    pub fn check_context(
        &self,
        ctx: &DeliverableProgressContext,
        proposed: f64,
    ) -> Result<f64, BoundViolation> {
        let normalized = normalize_percentage(proposed);
        if let Some(bounds) = ProgressBounds::from_context(ctx) {
            if bounds.is_infeasible() {
                tracing::warn!(
                    min = bounds.min,
                    max = bounds.max,
                    period = %ctx.current_period,
                    "no percentage satisfies both bounds"
                );
            }
            bounds.check(normalized)?;
        }
        Ok(normalized)
    }

    /// Judge the progress-relevant parts of an edit
    ///
    /// A typed percentage is checked against the gate of the merged record. A
    /// gate change is checked only when the target gate carries an automatic
    /// percentage, as if that value had been typed. A gate missing from
    /// `gates` is logged and the affected edit is let through unvalidated.
    #[must_use]
    pub fn validate(&self, request: &ValidationRequest, gates: &GateSet) -> ValidationOutcome {
        let merged = request.merged();
        let mut outcome = ValidationOutcome::accepted();

        for edit in ProgressEdit::from_patch(&request.patch) {
            let (gate_id, proposed) = match &edit {
                ProgressEdit::TotalPercentageEarned { value } => (&merged.gate_id, *value),
                ProgressEdit::Gate { gate_id } => match gates.get(gate_id) {
                    Some(gate) => match gate.auto_percentage {
                        Some(auto) => (gate_id, auto),
                        None => continue,
                    },
                    None => {
                        tracing::warn!(
                            deliverable = %merged.id,
                            gate = %gate_id,
                            "gate not found, accepting gate change unvalidated"
                        );
                        continue;
                    }
                },
            };

            let Some(gate) = gates.get(gate_id) else {
                tracing::warn!(
                    deliverable = %merged.id,
                    gate = %gate_id,
                    "gate not found, accepting percentage unvalidated"
                );
                outcome.percentage = Some(normalize_percentage(proposed));
                continue;
            };

            let ctx = Self::context_for(&merged, gate, &request.entries, request.current_period);
            match self.check_context(&ctx, proposed) {
                Ok(normalized) => outcome.percentage = Some(normalized),
                Err(violation) => return violation.into(),
            }
        }

        outcome
    }
}
