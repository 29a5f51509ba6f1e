//! Workflow gates
//!
//! A [`Gate`] caps how much of a deliverable may be claimed as earned while the
//! deliverable sits at that checkpoint. Some gates also imply a fixed earned
//! percentage that is applied automatically when the deliverable moves there.

use crate::ids::GateId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named checkpoint in a deliverable's approval workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    /// Gate key
    pub id: GateId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Ceiling on the cumulative earned percentage (fraction 0..1)
    pub max_percentage: f64,
    /// Percentage applied automatically when a deliverable enters this gate
    #[serde(default)]
    pub auto_percentage: Option<f64>,
}

impl Gate {
    /// Create gate with a ceiling and no automatic percentage
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, max_percentage: f64) -> Self {
        Self {
            id: GateId::new(id),
            name: String::new(),
            max_percentage,
            auto_percentage: None,
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With automatic percentage
    #[inline]
    #[must_use]
    pub fn with_auto_percentage(mut self, auto: f64) -> Self {
        self.auto_percentage = Some(auto);
        self
    }
}

/// Known gates indexed by id
#[derive(Debug, Clone, Default)]
pub struct GateSet {
    gates: HashMap<GateId, Gate>,
}

impl GateSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a gate
    pub fn insert(&mut self, gate: Gate) {
        self.gates.insert(gate.id.clone(), gate);
    }

    /// Look up a gate
    #[inline]
    #[must_use]
    pub fn get(&self, id: &GateId) -> Option<&Gate> {
        self.gates.get(id)
    }

    /// Number of gates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Iterate gates in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }
}

impl FromIterator<Gate> for GateSet {
    fn from_iter<I: IntoIterator<Item = Gate>>(iter: I) -> Self {
        let mut set = Self::new();
        for gate in iter {
            set.insert(gate);
        }
        set
    }
}

impl From<Vec<Gate>> for GateSet {
    fn from(gates: Vec<Gate>) -> Self {
        gates.into_iter().collect()
    }
}
