//! End-to-end widget verifications driven by the canned scenario files

mod common;

use std::sync::Arc;

use veristep::scenario::{ScenarioRunner, StepOutcome};
use veristep::session::mock::FakePage;
use veristep::Scenario;

use common::{
    calendar_page, chore_page, scenario_path, shopping_page, test_config, FakePageProvider,
};

async fn run_file(
    page: Arc<FakePage>,
    file: &str,
    artifact_dir: &std::path::Path,
) -> veristep::ExecutionResult {
    let scenario = Scenario::from_path(scenario_path(file)).expect("scenario file parses");
    let mut runner = ScenarioRunner::new(
        FakePageProvider::new(page),
        test_config(artifact_dir),
    );
    runner.run(&scenario).await
}

#[test]
fn test_every_canned_scenario_parses() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    let mut seen = 0;
    for entry in std::fs::read_dir(dir).expect("scenarios directory") {
        let path = entry.expect("directory entry").path();
        if path.extension().is_some_and(|ext| ext == "json") {
            let scenario = Scenario::from_path(&path)
                .unwrap_or_else(|e| panic!("{} failed to parse: {}", path.display(), e));
            assert!(!scenario.steps.is_empty(), "{} has no steps", path.display());
            seen += 1;
        }
    }
    assert!(seen >= 5, "expected the canned scenarios, found {}", seen);
}

#[tokio::test]
async fn test_input_length_cap_is_observed() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let result = run_file(page, "shopping_fill_limit.json", dir.path()).await;

    assert!(result.is_completed(), "outcome: {:?}", result.outcome);

    // The read_value step observed the capped value, not the 60 typed chars
    let observed = result
        .steps
        .iter()
        .find(|s| s.label.starts_with("read_value"))
        .and_then(|s| s.observed.as_deref())
        .expect("read_value observation");
    assert_eq!(observed.chars().count(), 50);

    assert!(dir.path().join("verification_shopping_list_input.png").exists());
}

#[tokio::test]
async fn test_full_list_disables_adding() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let result = run_file(page.clone(), "shopping_full_list.json", dir.path()).await;

    assert!(result.is_completed(), "outcome: {:?}", result.outcome);

    // The seeded storage survived the reload and rendered 100 items
    let model = page.model().await;
    let stored = model.storage.get("shopping-list").expect("seeded storage");
    let records: Vec<serde_json::Value> = serde_json::from_str(stored).unwrap();
    assert_eq!(records.len(), 100);
    drop(model);

    assert!(dir.path().join("verification_shopping_list_full.png").exists());
}

#[tokio::test]
async fn test_duplicate_entry_shows_warning() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let result = run_file(page.clone(), "shopping_duplicate.json", dir.path()).await;

    assert!(result.is_completed(), "outcome: {:?}", result.outcome);
    assert!(result
        .steps
        .iter()
        .all(|s| s.outcome == StepOutcome::Passed));

    // No second "Milk" row was added
    let model = page.model().await;
    let milk_rows = model
        .elements
        .iter()
        .filter(|el| el.role.as_deref() == Some("listitem") && el.text == "Milk")
        .count();
    assert_eq!(milk_rows, 1);
}

#[tokio::test]
async fn test_calendar_dialog_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(calendar_page());
    let result = run_file(page.clone(), "calendar_dialog.json", dir.path()).await;

    assert!(result.is_completed(), "outcome: {:?}", result.outcome);

    // The accessible label was observed before expanding
    let label = result
        .steps
        .iter()
        .find(|s| s.label.starts_with("read_attribute"))
        .and_then(|s| s.observed.as_deref())
        .expect("aria-label observation");
    assert!(label.starts_with("Next event:"), "label: {}", label);

    // The dialog was gone again when the run finished
    let model = page.model().await;
    assert!(!model.elements.iter().any(|el| el.id == "agenda"));
    drop(model);

    // Both captures landed, the expanded one clipped to the dialog
    assert!(dir.path().join("verification_calendar_focused.png").exists());
    assert!(dir.path().join("verification_calendar_expanded.png").exists());
    assert!(page
        .calls()
        .await
        .contains(&"screenshot clipped".to_string()));
}

#[tokio::test]
async fn test_enter_without_focus_leaves_dialog_closed() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(calendar_page());

    let scenario = Scenario::from_json(
        r#"{
            "name": "enter with nothing focused",
            "steps": [
                { "type": "navigate", "url": "/" },
                { "type": "press_key", "key": "Enter" },
                {
                    "type": "wait_for",
                    "target": { "kind": "role", "role": "dialog", "name": "Family Agenda" },
                    "until": { "state": "visible" },
                    "timeout_ms": 200
                }
            ]
        }"#,
    )
    .unwrap();

    let mut runner = ScenarioRunner::new(
        FakePageProvider::new(page),
        test_config(dir.path()),
    );
    let result = runner.run(&scenario).await;

    // Without focus the key press is inert, so the wait times out
    assert_eq!(result.exit_code(), 1);
    let failed = result.steps.last().unwrap();
    match &failed.outcome {
        StepOutcome::Failed { kind, message } => {
            assert_eq!(kind, "timeout");
            assert!(message.contains("0 matching elements"), "message: {}", message);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chore_toggle_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(chore_page());
    let result = run_file(page.clone(), "chore_toggle.json", dir.path()).await;

    assert!(result.is_completed(), "outcome: {:?}", result.outcome);

    // Initial state was observed before the first toggle
    let observed = result
        .steps
        .iter()
        .find(|s| s.label.starts_with("read_attribute"))
        .and_then(|s| s.observed.as_deref());
    assert_eq!(observed, Some("false"));

    // Only the targeted chore was ever clicked, twice
    let clicks: Vec<_> = page
        .calls()
        .await
        .into_iter()
        .filter(|c| c.starts_with("click"))
        .collect();
    assert_eq!(clicks, vec!["click chore-dogs", "click chore-dogs"]);

    // The other chores kept their state
    let model = page.model().await;
    for id in ["chore-cats", "chore-trash"] {
        let el = model.elements.iter().find(|el| el.id == id).unwrap();
        assert_eq!(el.attributes.get("aria-pressed").map(String::as_str), Some("false"));
    }
}
