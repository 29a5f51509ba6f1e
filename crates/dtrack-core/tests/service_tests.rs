//! End-to-end grid flows against the in-memory store

use dtrack_core::prelude::*;
use dtrack_core::{ResourceKey, SequenceConfig};
use dtrack_model::ProgressEntry;
use dtrack_test_utils::{deliverable, row, standard_gates};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn seeded(current_period: u32) -> (TrackerService, Arc<InMemoryStore>) {
    let config = TrackerConfig::default().with_current_period(current_period);
    let (service, store) = TrackerService::in_memory(config);
    store.set_gates(standard_gates().iter().cloned());
    (service, store)
}

fn record_hours(store: &InMemoryStore, id: &str, entries: &[(u32, f64)]) {
    let id = DeliverableId::new(id);
    for &(period, units) in entries {
        store.record_progress(&id, ProgressEntry::new(period, units));
    }
}

#[tokio::test]
async fn rejects_less_than_previously_reported() {
    let (service, store) = seeded(3);
    store.put_deliverable(deliverable("D-1", "IFR", 100.0));
    record_hours(&store, "D-1", &[(1, 10.0), (2, 15.0)]);

    let response = service
        .handle(GridRequest::Update {
            deliverable_id: DeliverableId::new("D-1"),
            patch: DeliverablePatch::percentage(20.0),
        })
        .await
        .unwrap();

    assert_eq!(
        response,
        GridResponse::Rejected {
            error_text: "Total earned percentage (20.00%) cannot be less than what's already \
                         reported in previous periods (25.00%)."
                .to_string(),
        }
    );
    let stored = store.deliverable(&DeliverableId::new("D-1")).unwrap();
    assert_eq!(stored.total_percentage_earned, 0.0);
}

#[tokio::test]
async fn accepted_percentage_is_normalized_and_saved() {
    let (service, store) = seeded(3);
    store.put_deliverable(deliverable("D-1", "IFR", 100.0));
    record_hours(&store, "D-1", &[(1, 10.0), (2, 15.0)]);

    let response = service
        .update_deliverable(&DeliverableId::new("D-1"), &DeliverablePatch::percentage(30.0))
        .await
        .unwrap();

    let GridResponse::Updated { record } = response else {
        panic!("expected update, got {response:?}");
    };
    assert!((record.total_percentage_earned - 0.3).abs() < 1e-12);
    let stored = store.deliverable(&DeliverableId::new("D-1")).unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn later_periods_tighten_the_ceiling() {
    let (service, store) = seeded(3);
    store.put_deliverable(deliverable("D-2", "IFC", 100.0));
    record_hours(&store, "D-2", &[(5, 30.0)]);

    let outcome = service
        .validate_edit(&DeliverableId::new("D-2"), &DeliverablePatch::percentage(0.75))
        .await
        .unwrap();

    assert!(!outcome.valid);
    assert_eq!(
        outcome.error_text.as_deref(),
        Some("Total earned percentage (75.00%) exceeds the maximum allowed (70.00%) for this gate.")
    );
}

#[tokio::test]
async fn gate_change_applies_automatic_percentage() {
    let (service, store) = seeded(2);
    store.put_deliverable(deliverable("D-3", "IFC", 40.0).with_percentage(0.6));

    let response = service
        .handle(GridRequest::Update {
            deliverable_id: DeliverableId::new("D-3"),
            patch: DeliverablePatch::gate("AFC"),
        })
        .await
        .unwrap();

    let GridResponse::Updated { record } = response else {
        panic!("expected update, got {response:?}");
    };
    assert_eq!(record.gate_id.as_str(), "AFC");
    assert_eq!(record.total_percentage_earned, 1.0);
}

#[tokio::test]
async fn gate_change_blocked_by_later_periods() {
    let (service, store) = seeded(2);
    store.put_deliverable(deliverable("D-4", "IFC", 100.0));
    record_hours(&store, "D-4", &[(4, 20.0)]);

    let outcome = service
        .validate_edit(&DeliverableId::new("D-4"), &DeliverablePatch::gate("AFC"))
        .await
        .unwrap();

    assert!(!outcome.valid);
    assert!(outcome
        .error_text
        .unwrap()
        .contains("exceeds the maximum allowed (80.00%)"));
}

#[tokio::test]
async fn unknown_gate_lets_edit_through() {
    let (service, store) = seeded(1);
    store.put_deliverable(deliverable("D-5", "RETIRED", 10.0));

    let response = service
        .update_deliverable(&DeliverableId::new("D-5"), &DeliverablePatch::percentage(40.0))
        .await
        .unwrap();

    let GridResponse::Updated { record } = response else {
        panic!("expected update, got {response:?}");
    };
    assert!((record.total_percentage_earned - 0.4).abs() < 1e-12);
}

#[tokio::test]
async fn gates_are_loaded_once_until_refreshed() {
    let (service, store) = seeded(1);
    store.put_deliverable(deliverable("D-6", "IFR", 10.0));
    let id = DeliverableId::new("D-6");
    let patch = DeliverablePatch::percentage(0.5);

    service.validate_edit(&id, &patch).await.unwrap();
    service.validate_edit(&id, &patch).await.unwrap();
    assert_eq!(store.gate_load_count(), 1);
    assert!(service.cache().contains(&ResourceKey::collection("gates")).await);

    // tighten IFR; the cached copy still applies until refreshed
    store.set_gates(vec![Gate::new("IFR", 0.4)]);
    assert!(service.validate_edit(&id, &patch).await.unwrap().valid);

    service.refresh_reference_data().await;
    let outcome = service.validate_edit(&id, &patch).await.unwrap();
    assert!(!outcome.valid);
    assert_eq!(store.gate_load_count(), 2);
}

#[tokio::test]
async fn concurrent_validations_share_one_gate_load() {
    let (service, store) = seeded(1);
    store.put_deliverable(deliverable("D-7", "IFR", 10.0));

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .validate_edit(
                    &DeliverableId::new("D-7"),
                    &DeliverablePatch::percentage(f64::from(i) * 10.0),
                )
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().valid);
    }
    assert_eq!(store.gate_load_count(), 1);
}

#[tokio::test]
async fn insert_and_remove_refresh_the_suggestion() {
    let (service, store) = seeded(1);
    let init = GridRequest::Init {
        sequence: "areas".to_string(),
        scope: Some("P1".to_string()),
    };

    assert_eq!(
        service.handle(init.clone()).await.unwrap(),
        GridResponse::Defaults {
            number: "01".to_string()
        }
    );

    let inserted = service
        .insert("areas", Some("P1"), row(json!({ "name": "North yard" })))
        .await
        .unwrap();
    assert_eq!(
        inserted,
        GridResponse::Inserted {
            number: "01".to_string(),
            next_number: "02".to_string(),
        }
    );
    let rows = store.rows("Areas");
    assert_eq!(rows[0]["areaNumber"], "01");
    assert_eq!(rows[0]["projectId"], "P1");

    let inserted = service
        .insert("areas", Some("P1"), row(json!({ "areaNumber": "A-07" })))
        .await
        .unwrap();
    assert_eq!(
        inserted,
        GridResponse::Inserted {
            number: "A-07".to_string(),
            next_number: "08".to_string(),
        }
    );

    // another project starts its own sequence
    assert_eq!(
        service.suggest_number("areas", Some("P2")).await.unwrap(),
        "01"
    );

    let removed = service.remove("areas", Some("P1"), "A-07").await.unwrap();
    assert_eq!(
        removed,
        GridResponse::Removed {
            removed: 1,
            next_number: "02".to_string(),
        }
    );
}

#[tokio::test]
async fn remove_is_limited_to_scope() {
    let (service, store) = seeded(1);
    service
        .insert("areas", Some("P1"), row(json!({ "areaNumber": "03" })))
        .await
        .unwrap();
    service
        .insert("areas", Some("P2"), row(json!({ "areaNumber": "03" })))
        .await
        .unwrap();

    let removed = service.remove("areas", Some("P2"), "03").await.unwrap();
    assert_eq!(
        removed,
        GridResponse::Removed {
            removed: 1,
            next_number: "01".to_string(),
        }
    );
    assert_eq!(store.rows("Areas").len(), 1);
    assert_eq!(service.suggest_number("areas", Some("P1")).await.unwrap(), "04");
}

#[tokio::test]
async fn json_requests_drive_the_service() {
    let config = TrackerConfig::default().with_sequence(
        "documents",
        SequenceConfig::new("Documents", "docNumber").with_pad_length(4),
    );
    let (service, store) = TrackerService::in_memory(config);
    store.insert_record("Documents", row(json!({ "docNumber": "DOC-0099" })))
        .await
        .unwrap();

    let request: GridRequest =
        serde_json::from_value(json!({ "op": "init", "sequence": "documents" })).unwrap();
    let response = service.handle(request).await.unwrap();

    assert_eq!(
        serde_json::to_value(response).unwrap(),
        json!({ "kind": "defaults", "number": "0100" })
    );
}

#[tokio::test]
async fn errors_surface_as_tracker_errors() {
    let (service, _) = seeded(1);

    let err = service
        .handle(GridRequest::Init {
            sequence: "areas".to_string(),
            scope: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::ScopeRequired(_)));

    let err = service
        .handle(GridRequest::Validate {
            deliverable_id: DeliverableId::new("missing"),
            patch: DeliverablePatch::percentage(0.1),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "deliverable not found: missing");
}

#[tokio::test]
async fn insert_stores_row_under_request_scope() {
    let (service, store) = seeded(1);

    let inserted = service
        .insert(
            "areas",
            Some("P1"),
            row(json!({ "areaNumber": "05", "projectId": "P9" })),
        )
        .await
        .unwrap();
    assert_eq!(
        inserted,
        GridResponse::Inserted {
            number: "05".to_string(),
            next_number: "06".to_string(),
        }
    );
    assert_eq!(store.rows("Areas")[0]["projectId"], "P1");
    assert_eq!(service.suggest_number("areas", Some("P9")).await.unwrap(), "01");
}

#[tokio::test]
async fn suggestions_pass_the_pad_width() {
    let (service, _) = seeded(1);
    for number in ["98", "99", "100"] {
        service
            .insert("projects", None, row(json!({ "projectNumber": number })))
            .await
            .unwrap();
    }

    assert_eq!(service.suggest_number("projects", None).await.unwrap(), "101");
    let inserted = service.insert("projects", None, row(json!({}))).await.unwrap();
    assert_eq!(
        inserted,
        GridResponse::Inserted {
            number: "101".to_string(),
            next_number: "102".to_string(),
        }
    );
}
