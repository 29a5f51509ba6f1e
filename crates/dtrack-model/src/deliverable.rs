//! Deliverable rows and proposed edits

use crate::ids::{DeliverableId, GateId};
use serde::{Deserialize, Serialize};

/// Stored deliverable, limited to the fields progress tracking reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableRecord {
    /// Backend key
    pub id: DeliverableId,
    /// Human-readable sequence number
    #[serde(default)]
    pub number: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Gate the deliverable currently sits at
    pub gate_id: GateId,
    /// Total committed effort
    pub total_hours: f64,
    /// Cumulative earned percentage (fraction 0..1)
    #[serde(default)]
    pub total_percentage_earned: f64,
}

impl DeliverableRecord {
    /// Create record with no progress
    #[must_use]
    pub fn new(id: impl Into<String>, gate_id: impl Into<String>, total_hours: f64) -> Self {
        Self {
            id: DeliverableId::new(id),
            number: String::new(),
            title: String::new(),
            gate_id: GateId::new(gate_id),
            total_hours,
            total_percentage_earned: 0.0,
        }
    }

    /// With earned percentage
    #[inline]
    #[must_use]
    pub fn with_percentage(mut self, earned: f64) -> Self {
        self.total_percentage_earned = earned;
        self
    }

    /// With sequence number
    #[inline]
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Overlay the fields present in `patch` onto a copy of this record
    #[must_use]
    pub fn merged(&self, patch: &DeliverablePatch) -> Self {
        let mut merged = self.clone();
        if let Some(number) = &patch.number {
            merged.number.clone_from(number);
        }
        if let Some(title) = &patch.title {
            merged.title.clone_from(title);
        }
        if let Some(gate_id) = &patch.gate_id {
            merged.gate_id = gate_id.clone();
        }
        if let Some(hours) = patch.total_hours {
            merged.total_hours = hours;
        }
        if let Some(earned) = patch.total_percentage_earned {
            merged.total_percentage_earned = earned;
        }
        merged
    }
}

/// Proposed edit to a deliverable; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverablePatch {
    /// New sequence number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New gate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_id: Option<GateId>,
    /// New total hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<f64>,
    /// New earned percentage, in either 0..1 or 0..100 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_percentage_earned: Option<f64>,
}

impl DeliverablePatch {
    /// Patch that only sets the earned percentage
    #[inline]
    #[must_use]
    pub fn percentage(value: f64) -> Self {
        Self {
            total_percentage_earned: Some(value),
            ..Self::default()
        }
    }

    /// Patch that only moves the deliverable to another gate
    #[inline]
    #[must_use]
    pub fn gate(gate_id: impl Into<String>) -> Self {
        Self {
            gate_id: Some(GateId::new(gate_id)),
            ..Self::default()
        }
    }

    /// Check if nothing is changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overlays_present_fields_only() {
        let record = DeliverableRecord::new("D1", "G1", 100.0)
            .with_number("001")
            .with_percentage(0.2);
        let patch = DeliverablePatch {
            total_hours: Some(120.0),
            gate_id: Some(GateId::new("G2")),
            ..DeliverablePatch::default()
        };

        let merged = record.merged(&patch);
        assert_eq!(merged.total_hours, 120.0);
        assert_eq!(merged.gate_id, GateId::new("G2"));
        assert_eq!(merged.number, "001");
        assert_eq!(merged.total_percentage_earned, 0.2);
        // original untouched
        assert_eq!(record.total_hours, 100.0);
    }

    #[test]
    fn empty_patch_detection() {
        assert!(DeliverablePatch::default().is_empty());
        assert!(!DeliverablePatch::percentage(0.5).is_empty());
        assert!(!DeliverablePatch::gate("G2").is_empty());
    }

    #[test]
    fn patch_json_uses_camel_case() {
        let patch: DeliverablePatch =
            serde_json::from_str(r#"{"totalPercentageEarned": 75}"#).unwrap();
        assert_eq!(patch.total_percentage_earned, Some(75.0));
        assert_eq!(
            serde_json::to_string(&DeliverablePatch::gate("G4")).unwrap(),
            r#"{"gateId":"G4"}"#
        );
    }
}
