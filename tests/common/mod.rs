//! Common test utilities
//!
//! Fake-page models of the three widgets the canned scenarios drive (a
//! shopping list, a calendar dialog, a chore-toggle grid), plus a session
//! provider that hands the runner sessions over those models.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use veristep::cdp::traits::EvaluationResult;
use veristep::config::Config;
use veristep::scenario::SessionProvider;
use veristep::session::launcher::Session;
use veristep::session::mock::{FakeElement, FakePage, PageModel};
use veristep::Result;

/// Session provider over one shared fake page
#[derive(Debug)]
pub struct FakePageProvider {
    page: Arc<FakePage>,
}

impl FakePageProvider {
    pub fn new(page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self { page })
    }
}

#[async_trait]
impl SessionProvider for FakePageProvider {
    async fn start(&self) -> Result<Session> {
        Ok(Session::with_driver(self.page.clone()))
    }
}

/// Test configuration with short waits and artifacts under `artifact_dir`
pub fn test_config(artifact_dir: &std::path::Path) -> Config {
    Config {
        default_timeout_ms: 500,
        artifact_dir: artifact_dir.display().to_string(),
        ..Config::default()
    }
}

const STORAGE_KEY: &str = "shopping-list";
const LIST_CAPACITY: usize = 100;

fn render_shopping(model: &mut PageModel) {
    model.elements.clear();
    model.focused = None;
    model.elements.push(
        FakeElement::new("header", "h2")
            .role("heading")
            .text("Shopping List"),
    );

    let records: Vec<serde_json::Value> = model
        .storage
        .get(STORAGE_KEY)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| {
            vec![serde_json::json!({"id": "0", "text": "Milk", "completed": false})]
        });

    for (i, record) in records.iter().enumerate() {
        if let Some(text) = record.get("text").and_then(|t| t.as_str()) {
            model.elements.push(
                FakeElement::new(format!("item-{}", i), "li")
                    .role("listitem")
                    .text(text),
            );
        }
    }

    if records.len() >= LIST_CAPACITY {
        model.elements.push(
            FakeElement::new("add", "button")
                .role("button")
                .name("List full")
                .disabled(),
        );
    } else {
        model.elements.push(
            FakeElement::new("add", "button")
                .role("button")
                .name("Add item")
                .text("+"),
        );
    }
}

/// Shopping list widget: add flow, duplicate warning, 50-char input cap,
/// and a "List full" state once storage reaches capacity
pub fn shopping_page() -> FakePage {
    FakePage::new()
        .on_navigate(|model, _url| render_shopping(model))
        .on_click(|model, id| match id {
            "add" => {
                model.elements.push(
                    FakeElement::new("new-item-input", "input")
                        .role("textbox")
                        .name("New item name")
                        .max_len(50),
                );
                model.elements.push(
                    FakeElement::new("confirm", "button")
                        .role("button")
                        .name("Confirm add item"),
                );
            }
            "confirm" => {
                let value = model
                    .element_mut("new-item-input")
                    .and_then(|el| el.value.clone())
                    .unwrap_or_default();
                let duplicate = model.elements.iter().any(|el| {
                    el.role.as_deref() == Some("listitem") && el.text == value
                });
                if duplicate {
                    if model.element_mut("dup-error").is_none() {
                        model.elements.push(
                            FakeElement::new("dup-error", "p").text("Already on your list!"),
                        );
                    }
                } else if !value.is_empty() {
                    let index = model
                        .elements
                        .iter()
                        .filter(|el| el.role.as_deref() == Some("listitem"))
                        .count();
                    model.elements.push(
                        FakeElement::new(format!("item-{}", index), "li")
                            .role("listitem")
                            .text(value),
                    );
                    if let Some(input) = model.element_mut("new-item-input") {
                        input.value = Some(String::new());
                    }
                }
            }
            _ => {}
        })
        .on_fill(|model, id| {
            // Typing clears a previous duplicate warning
            if id == "new-item-input" {
                model.remove_element("dup-error");
            }
        })
        .on_script(|model, script| {
            if script.contains("localStorage.setItem") && script.contains(STORAGE_KEY) {
                let records: Vec<serde_json::Value> = (0..LIST_CAPACITY)
                    .map(|i| {
                        serde_json::json!({
                            "id": i.to_string(),
                            "text": format!("Item {}", i),
                            "completed": false,
                        })
                    })
                    .collect();
                let serialized =
                    serde_json::to_string(&records).expect("serializable records");
                model.storage.insert(STORAGE_KEY.to_string(), serialized);
            }
            EvaluationResult::Null
        })
}

/// Calendar widget: a focusable button that expands a "Family Agenda"
/// dialog on Enter and closes it on Escape
pub fn calendar_page() -> FakePage {
    FakePage::new()
        .on_navigate(|model, _url| {
            model.elements.clear();
            model.focused = None;
            model.elements.push(
                FakeElement::new("calendar", "div")
                    .role("button")
                    .name("Next event: Dentist appointment, Tuesday 10am")
                    .text("Next Event Dentist appointment Tuesday 10am")
                    .attr("aria-label", "Next event: Dentist appointment, Tuesday 10am")
                    .matching_css("div[role='button']"),
            );
        })
        .on_key(|model, key| match key {
            "Enter" if model.focused.as_deref() == Some("calendar") => {
                if model.element_mut("agenda").is_none() {
                    model.elements.push(
                        FakeElement::new("agenda", "div")
                            .role("dialog")
                            .name("Family Agenda")
                            .text("Family Agenda Dentist appointment Tuesday 10am")
                            .matching_css("div[role='dialog'][aria-label='Family Agenda']"),
                    );
                }
            }
            "Escape" => model.remove_element("agenda"),
            _ => {}
        })
}

/// Chore grid: pressable chore buttons whose `aria-pressed` flips on click
pub fn chore_page() -> FakePage {
    FakePage::new()
        .on_navigate(|model, _url| {
            model.elements.clear();
            model.focused = None;
            model.elements.push(
                FakeElement::new("header", "h2")
                    .role("heading")
                    .text("Family Chores"),
            );
            for (id, name) in [
                ("chore-dogs", "Feed Dogs"),
                ("chore-cats", "Feed Cats"),
                ("chore-trash", "Take Out Trash"),
            ] {
                model.elements.push(
                    FakeElement::new(id, "div")
                        .role("button")
                        .name(name)
                        .text(name)
                        .attr("aria-pressed", "false"),
                );
            }
        })
        .on_click(|model, id| {
            if let Some(el) = model.element_mut(id) {
                if let Some(pressed) = el.attributes.get_mut("aria-pressed") {
                    *pressed = if pressed.as_str() == "true" {
                        "false".to_string()
                    } else {
                        "true".to_string()
                    };
                }
            }
        })
}

/// Path to a canned scenario file
pub fn scenario_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}
