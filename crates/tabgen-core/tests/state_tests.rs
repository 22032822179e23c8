use std::collections::BTreeSet;

use serde_json::json;
use tabgen_core::{Action, AppState, BatchResult, Column, DatasetSpec, Row, Status};

fn batch(names: &[&str], urls: &[&str]) -> BatchResult {
    let rows = names
        .iter()
        .map(|name| {
            let mut row = Row::new();
            row.insert("Company".to_string(), json!(name));
            row
        })
        .collect();
    let sources: BTreeSet<String> = urls.iter().map(|u| u.to_string()).collect();
    BatchResult::new(rows, sources)
}

#[test]
fn test_reduce_does_not_mutate_previous_state() {
    let before = AppState::default();
    let after = before.reduce(Action::SetTopic("Largest lakes".to_string()));

    assert_ne!(before.topic, after.topic);
    assert_eq!(after.topic, "Largest lakes");
}

#[test]
fn test_column_editing() {
    let state = AppState::empty()
        .reduce(Action::AddColumn(Column::new("A")))
        .reduce(Action::AddColumn(Column::new("B")))
        .reduce(Action::UpdateColumn {
            index: 0,
            column: Column::new("Alpha").with_description("first"),
        })
        .reduce(Action::RemoveColumn(1));

    assert_eq!(state.columns, vec![Column::new("Alpha").with_description("first")]);
}

#[test]
fn test_only_one_request_in_flight() {
    let state = AppState::default().reduce(Action::GenerationStarted);
    assert!(state.is_generating());
    assert!(!state.can_generate());

    // A second start while generating changes nothing.
    assert_eq!(state.reduce(Action::GenerationStarted), state);
}

#[test]
fn test_cannot_start_without_topic_or_columns() {
    let state = AppState::empty();
    assert!(!state.can_generate());
    assert_eq!(state.reduce(Action::GenerationStarted).status, Status::Idle);

    let state = state.reduce(Action::SetTopic("Moons".to_string()));
    assert!(!state.can_generate());

    let state = state.reduce(Action::AddColumn(Column::new("Name")));
    assert!(state.can_generate());
}

#[test]
fn test_success_accumulates() {
    let state = AppState::default()
        .reduce(Action::GenerationStarted)
        .reduce(Action::GenerationSucceeded(batch(&["Apple"], &["https://a.com"])))
        .reduce(Action::GenerationStarted)
        .reduce(Action::GenerationSucceeded(batch(&["Nvidia"], &["https://a.com", "https://b.com"])));

    assert_eq!(state.status, Status::Idle);
    assert_eq!(state.dataset.len(), 2);
    assert_eq!(state.dataset.rows[0]["Company"], json!("Apple"));
    assert_eq!(state.dataset.rows[1]["Company"], json!("Nvidia"));
    assert_eq!(state.dataset.sources.len(), 2);
}

#[test]
fn test_failure_keeps_data_and_message() {
    let state = AppState::default()
        .reduce(Action::GenerationSucceeded(batch(&["Apple"], &["https://a.com"])))
        .reduce(Action::GenerationStarted)
        .reduce(Action::GenerationFailed("Rate limited. Try again later.".to_string()));

    assert_eq!(state.dataset.len(), 1);
    assert_eq!(state.dataset.sources.len(), 1);
    assert_eq!(state.error(), Some("Rate limited. Try again later."));
    assert!(state.can_generate());
}

#[test]
fn test_clear_data_keeps_form() {
    let state = AppState::default()
        .reduce(Action::GenerationSucceeded(batch(&["Apple"], &[])))
        .reduce(Action::ClearData);

    assert!(state.dataset.is_empty());
    assert_eq!(state.topic, AppState::default().topic);
}

#[test]
fn test_from_spec_snapshot() {
    let spec = DatasetSpec {
        topic: "Volcanoes".to_string(),
        columns: vec![Column::new("Name"), Column::new("Country")],
        row_count: None,
        context: Some("Active only".to_string()),
    };

    let config = AppState::from_spec(&spec, 4).generator_config();
    assert_eq!(config.topic, "Volcanoes");
    assert_eq!(config.row_count, 4);
    assert_eq!(config.context.as_deref(), Some("Active only"));
    assert_eq!(config.column_names(), vec!["Name", "Country"]);
}
