//! Which progress-relevant field an edit touches

use dtrack_model::{DeliverablePatch, GateId};
use serde::{Deserialize, Serialize};

/// A progress-relevant change carried by a [`DeliverablePatch`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum ProgressEdit {
    /// Earned percentage typed directly, in either scale
    #[serde(rename_all = "camelCase")]
    TotalPercentageEarned {
        /// Raw value as entered
        value: f64,
    },
    /// Deliverable moved to another gate
    #[serde(rename_all = "camelCase")]
    Gate {
        /// Target gate
        gate_id: GateId,
    },
}

impl ProgressEdit {
    /// Edits in the order they are validated: direct percentage, then gate
    #[must_use]
    pub fn from_patch(patch: &DeliverablePatch) -> Vec<Self> {
        let mut edits = Vec::with_capacity(2);
        if let Some(value) = patch.total_percentage_earned {
            edits.push(Self::TotalPercentageEarned { value });
        }
        if let Some(gate_id) = &patch.gate_id {
            edits.push(Self::Gate {
                gate_id: gate_id.clone(),
            });
        }
        edits
    }
}
