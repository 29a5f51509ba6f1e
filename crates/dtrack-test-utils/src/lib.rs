//! Testing utilities for dtrack workspace
//!
//! Shared fixtures for gates, deliverables and sequence collections.

#![allow(missing_docs)]

use dtrack_model::{
    DeliverableProgressContext, DeliverableRecord, Gate, GateSet, Period, ProgressEntry, Record,
};
use dtrack_sequence::InMemorySequenceSource;
use serde_json::Value;
use std::sync::Arc;

pub fn row(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

pub fn sequence_source_with(collection: &str, field: &str, values: &[&str]) -> Arc<InMemorySequenceSource> {
    let source = InMemorySequenceSource::new();
    source.create_collection(collection);
    for value in values {
        let mut record = Record::new();
        record.insert(field.to_string(), Value::String((*value).to_string()));
        source.insert(collection, record);
    }
    Arc::new(source)
}

/// IFR 80%, IFC 90%, HOLD 50% with auto 50%, AFC 100%
pub fn standard_gates() -> GateSet {
    vec![
        Gate::new("IFR", 0.8).with_name("Issued for review"),
        Gate::new("IFC", 0.9).with_name("Issued for construction"),
        Gate::new("HOLD", 0.5)
            .with_name("On hold")
            .with_auto_percentage(0.5),
        Gate::new("AFC", 1.0)
            .with_name("Approved for construction")
            .with_auto_percentage(1.0),
    ]
    .into()
}

pub fn deliverable(id: &str, gate: &str, total_hours: f64) -> DeliverableRecord {
    DeliverableRecord::new(id, gate, total_hours)
}

pub fn progress_context(
    total_hours: f64,
    gate_max: f64,
    current_period: u32,
    entries: &[(u32, f64)],
) -> DeliverableProgressContext {
    DeliverableProgressContext {
        total_hours,
        current_gate_max_percentage: gate_max,
        current_period: Period::new(current_period),
        progress_entries: entries
            .iter()
            .map(|&(period, units)| ProgressEntry::new(period, units))
            .collect(),
    }
}
