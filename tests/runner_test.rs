//! Execution-order and lifecycle properties of the scenario runner

mod common;

use std::sync::Arc;

use veristep::engine::query::ElementQuery;
use veristep::engine::wait::WaitUntil;
use veristep::scenario::{Outcome, RunState, ScenarioRunner, StepOutcome};
use veristep::session::mock::{FakeElement, FakePage};
use veristep::{Scenario, Step};

use common::{shopping_page, test_config, FakePageProvider};

fn runner_for(page: &Arc<FakePage>, artifact_dir: &std::path::Path) -> ScenarioRunner {
    ScenarioRunner::new(FakePageProvider::new(page.clone()), test_config(artifact_dir))
}

#[tokio::test]
async fn test_steps_run_in_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "add one item",
        vec![
            Step::Navigate {
                url: "/".to_string(),
                timeout_ms: None,
            },
            Step::Click {
                target: ElementQuery::role_with_name("button", "Add item"),
            },
            Step::Fill {
                target: ElementQuery::role_with_name("textbox", "New item name"),
                text: "Bread".to_string(),
            },
            Step::Click {
                target: ElementQuery::role_with_name("button", "Confirm add item"),
            },
            Step::Screenshot {
                path: "added.png".to_string(),
                scope: None,
            },
        ],
    );

    let result = runner.run(&scenario).await;
    assert!(result.is_completed(), "outcome: {:?}", result.outcome);

    let calls = page.calls().await;
    assert_eq!(
        calls,
        vec![
            "navigate http://localhost:5173/",
            "click add",
            "fill new-item-input=Bread",
            "click confirm",
            "screenshot",
            "close",
        ]
    );
}

#[tokio::test]
async fn test_teardown_happens_exactly_once_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "just navigate",
        vec![Step::Navigate {
            url: "/".to_string(),
            timeout_ms: None,
        }],
    );

    let result = runner.run(&scenario).await;
    assert!(result.is_completed());
    assert_eq!(page.close_count(), 1);
    assert_eq!(runner.state(), RunState::TornDown);
}

#[tokio::test]
async fn test_teardown_happens_exactly_once_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "click something that never appears",
        vec![
            Step::Navigate {
                url: "/".to_string(),
                timeout_ms: None,
            },
            Step::Click {
                target: ElementQuery::role_with_name("button", "Delete everything"),
            },
            Step::Screenshot {
                path: "never.png".to_string(),
                scope: None,
            },
        ],
    );

    let result = runner.run(&scenario).await;
    assert_eq!(result.exit_code(), 1);
    assert_eq!(page.close_count(), 1);
    assert_eq!(runner.state(), RunState::TornDown);
    // The screenshot after the failing click never ran
    assert!(!page.calls().await.iter().any(|c| c.starts_with("screenshot")));
    assert!(!dir.path().join("never.png").exists());
}

#[tokio::test]
async fn test_navigation_retries_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    page.fail_next_navigations(1);
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "flaky first load",
        vec![Step::Navigate {
            url: "/".to_string(),
            timeout_ms: None,
        }],
    );

    let result = runner.run(&scenario).await;
    assert!(result.is_completed(), "outcome: {:?}", result.outcome);

    let navigations: Vec<_> = page
        .calls()
        .await
        .into_iter()
        .filter(|c| c.starts_with("navigate"))
        .collect();
    assert_eq!(navigations.len(), 2);
}

#[tokio::test]
async fn test_navigation_never_retries_twice() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    page.fail_next_navigations(3);
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "target down",
        vec![Step::Navigate {
            url: "/".to_string(),
            timeout_ms: None,
        }],
    );

    let result = runner.run(&scenario).await;
    match &result.outcome {
        Outcome::Failed {
            step_index, kind, ..
        } => {
            assert_eq!(*step_index, Some(0));
            assert_eq!(kind, "navigation");
        }
        other => panic!("expected navigation failure, got {:?}", other),
    }

    let navigations: Vec<_> = page
        .calls()
        .await
        .into_iter()
        .filter(|c| c.starts_with("navigate"))
        .collect();
    assert_eq!(navigations.len(), 2, "one escalated retry, never a third");
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_ambiguous_target_fails_instead_of_picking_one() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(
        FakePage::new()
            .with_element(
                FakeElement::new("save-draft", "button")
                    .role("button")
                    .name("Save"),
            )
            .with_element(
                FakeElement::new("save-final", "button")
                    .role("button")
                    .name("Save"),
            ),
    );
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "two save buttons",
        vec![Step::Click {
            target: ElementQuery::role_with_name("button", "Save"),
        }],
    );

    let result = runner.run(&scenario).await;
    match &result.outcome {
        Outcome::Failed { kind, message, .. } => {
            assert_eq!(kind, "ambiguous_match");
            assert!(message.contains("2 elements"), "message: {}", message);
        }
        other => panic!("expected ambiguity failure, got {:?}", other),
    }
    // Neither candidate was clicked
    assert!(!page.calls().await.iter().any(|c| c.starts_with("click")));
}

#[tokio::test]
async fn test_explicit_ordinal_disambiguates() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(
        FakePage::new()
            .with_element(
                FakeElement::new("save-draft", "button")
                    .role("button")
                    .name("Save"),
            )
            .with_element(
                FakeElement::new("save-final", "button")
                    .role("button")
                    .name("Save"),
            ),
    );
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "second save button",
        vec![Step::Click {
            target: ElementQuery::role_with_name("button", "Save").nth(1),
        }],
    );

    let result = runner.run(&scenario).await;
    assert!(result.is_completed(), "outcome: {:?}", result.outcome);
    assert!(page
        .calls()
        .await
        .contains(&"click save-final".to_string()));
}

#[tokio::test]
async fn test_screenshot_rewrites_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "capture twice",
        vec![
            Step::Navigate {
                url: "/".to_string(),
                timeout_ms: None,
            },
            Step::Screenshot {
                path: "evidence.png".to_string(),
                scope: None,
            },
            Step::Screenshot {
                path: "evidence.png".to_string(),
                scope: None,
            },
        ],
    );

    let result = runner.run(&scenario).await;
    assert!(result.is_completed(), "outcome: {:?}", result.outcome);
    assert_eq!(result.artifacts.len(), 2);
    assert_eq!(result.artifacts[0], result.artifacts[1]);
    assert!(dir.path().join("evidence.png").exists());
}

#[tokio::test]
async fn test_artifacts_survive_a_later_failure() {
    let dir = tempfile::tempdir().unwrap();
    let page = Arc::new(shopping_page());
    let mut runner = runner_for(&page, dir.path());

    let scenario = Scenario::new(
        "evidence before failure",
        vec![
            Step::Navigate {
                url: "/".to_string(),
                timeout_ms: None,
            },
            Step::Screenshot {
                path: "before.png".to_string(),
                scope: None,
            },
            Step::WaitFor {
                target: ElementQuery::text("Never rendered"),
                until: WaitUntil::Visible,
                timeout_ms: Some(200),
            },
        ],
    );

    let result = runner.run(&scenario).await;
    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.artifacts.len(), 1);
    assert!(result.artifacts[0].exists());
    assert_eq!(result.steps.len(), 3);
    assert!(matches!(result.steps[2].outcome, StepOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_fresh_runner_state_per_run() {
    let dir = tempfile::tempdir().unwrap();

    // Two runs against two pages, one runner each: state always ends TornDown
    for _ in 0..2 {
        let page = Arc::new(shopping_page());
        let mut runner = runner_for(&page, dir.path());
        assert_eq!(runner.state(), RunState::Idle);

        let scenario = Scenario::new(
            "navigate only",
            vec![Step::Navigate {
                url: "/".to_string(),
                timeout_ms: None,
            }],
        );
        let result = runner.run(&scenario).await;
        assert!(result.is_completed());
        assert!(result.finished_at >= result.started_at);
        assert_eq!(runner.state(), RunState::TornDown);
    }
}
