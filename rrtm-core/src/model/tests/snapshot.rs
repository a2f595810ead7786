//! Snapshot persistence and table round trips.

use super::{reach_builder, NO3_CELL};
use crate::config::ModelConfig;
use crate::errors::RRTMError;
use crate::example_kinetics::{ConstantFraction, FailAbove};
use crate::model::{Model, ModelBuilder, ModelStatus};
use serde_json::{json, Value};
use std::sync::Arc;

/// Snapshot of the reach after one iteration, edited by `edit`
fn edited_snapshot(edit: impl FnOnce(&mut Value)) -> String {
    let mut model = reach_builder(Arc::new(ConstantFraction { fraction: 0.2 }))
        .build()
        .unwrap();
    model.iterate().unwrap();
    let mut snapshot: Value = serde_json::from_str(&model.to_snapshot().unwrap()).unwrap();
    edit(&mut snapshot);
    snapshot.to_string()
}

fn configuration_issues(snapshot: &str) -> Vec<String> {
    match Model::from_snapshot(snapshot) {
        Err(RRTMError::Configuration { issues }) => issues,
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn snapshot_resumes_identically() {
    let mut model = reach_builder(Arc::new(ConstantFraction { fraction: 0.2 }))
        .build()
        .unwrap();
    model.iterate_n(3).unwrap();

    let snapshot = model.to_snapshot().unwrap();
    let mut restored = Model::from_snapshot(&snapshot).unwrap();

    assert_eq!(restored.iterations(), 3);
    assert_eq!(restored.current_time(), model.current_time());
    assert_eq!(restored.cells(), model.cells());
    assert_eq!(restored.ledger(), model.ledger());
    assert_eq!(
        restored.reactions()[0].state(),
        model.reactions()[0].state()
    );

    model.iterate_n(5).unwrap();
    restored.iterate_n(5).unwrap();
    assert_eq!(restored.cells(), model.cells());
    assert_eq!(restored.transport(), model.transport());
    assert_eq!(
        restored.cell(NO3_CELL).unwrap().amount(),
        model.cell(NO3_CELL).unwrap().amount()
    );
}

#[test]
fn snapshot_names_kinetics_by_type() {
    let model = reach_builder(Arc::new(ConstantFraction { fraction: 0.2 }))
        .build()
        .unwrap();
    let snapshot = model.to_snapshot().unwrap();
    assert!(snapshot.contains(r#""type": "ConstantFraction""#));
    assert!(snapshot.contains(r#""status": "ready""#));
}

#[test]
fn faulted_status_survives_snapshot() {
    let mut model = reach_builder(Arc::new(FailAbove { limit: 0.0 }))
        .build()
        .unwrap();
    assert!(model.iterate().is_err());

    let restored = Model::from_snapshot(&model.to_snapshot().unwrap()).unwrap();
    assert!(matches!(restored.status(), ModelStatus::Faulted { .. }));
    assert_eq!(restored.iterations(), 0);
}

#[test]
fn snapshot_file_round_trip() {
    let mut model = reach_builder(Arc::new(ConstantFraction { fraction: 0.2 }))
        .build()
        .unwrap();
    model.iterate().unwrap();

    let path = std::env::temp_dir().join(format!("rrtm-snapshot-{}.json", std::process::id()));
    model.save_snapshot(&path).unwrap();
    let restored = Model::load_snapshot(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored.cells(), model.cells());
}

#[test]
fn malformed_snapshot_is_an_error() {
    assert!(matches!(
        Model::from_snapshot("{\"cells\": 3}"),
        Err(RRTMError::Snapshot(_))
    ));
}

#[test]
fn restored_references_are_checked() {
    let snapshot = edited_snapshot(|s| s["reactions"][0]["cell"] = json!(99));
    let issues = configuration_issues(&snapshot);
    assert_eq!(issues, vec!["reaction 0: cell 99 does not exist".to_string()]);

    let snapshot = edited_snapshot(|s| {
        s["cells"][1]["kind"]["linked_cell"] = json!(5);
        s["transport"][2]["to"] = json!(8);
    });
    let issues = configuration_issues(&snapshot);
    assert!(issues.iter().any(|i| i.contains("cell 1: linked cell 5 does not exist")));
    assert!(issues.iter().any(|i| i.contains("transport 2")), "{:?}", issues);
}

#[test]
fn restored_ids_must_match_positions() {
    let snapshot = edited_snapshot(|s| s["cells"][1]["id"] = json!(0));
    let issues = configuration_issues(&snapshot);
    assert_eq!(issues, vec!["cell 1: recorded with id 0".to_string()]);
}

#[test]
fn restored_kinetics_are_validated() {
    let snapshot = edited_snapshot(|s| s["reactions"][0]["kinetics"]["fraction"] = json!(2.0));
    match Model::from_snapshot(&snapshot) {
        Err(RRTMError::NumericDomain { entity, .. }) => {
            assert_eq!(entity, "reaction 0 (ConstantFraction)")
        }
        other => panic!("expected a domain error, got {:?}", other),
    }
}

#[test]
fn committed_state_as_tables() {
    let mut model = reach_builder(Arc::new(ConstantFraction { fraction: 0.2 }))
        .build()
        .unwrap();
    model.iterate_n(3).unwrap();

    let mut fresh = ModelBuilder::from_config(model.to_config()).build().unwrap();
    assert_eq!(fresh.current_time(), model.current_time());
    assert_eq!(fresh.iterations(), 0);
    assert_eq!(fresh.cells(), model.cells());

    model.iterate_n(2).unwrap();
    fresh.iterate_n(2).unwrap();
    assert_eq!(fresh.cells(), model.cells());
}

#[test]
fn tables_round_trip_through_toml() {
    let builder = reach_builder(Arc::new(ConstantFraction { fraction: 0.2 }));
    let config = builder.to_config();

    let text = toml::to_string(&config).unwrap();
    let parsed = ModelConfig::from_toml_str(&text).unwrap();

    let mut a = builder.build().unwrap();
    let mut b = ModelBuilder::from_config(parsed).build().unwrap();
    a.iterate_n(4).unwrap();
    b.iterate_n(4).unwrap();
    assert_eq!(a.cells(), b.cells());
}
