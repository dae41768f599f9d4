//! Scenario data model
//!
//! A scenario is an ordered list of data-described steps plus a name. Steps
//! are pure data; the runner interprets them. Scenario files are JSON
//! documents; malformed step types fail at load time, before any session
//! starts.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::assertions::Condition;
use crate::engine::query::ElementQuery;
use crate::engine::wait::WaitUntil;
use crate::Result;

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Load a URL (relative URLs resolve against the configured base)
    Navigate {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Wait until a condition holds for the target
    WaitFor {
        target: ElementQuery,
        #[serde(default)]
        until: WaitUntil,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    Click {
        target: ElementQuery,
    },
    Fill {
        target: ElementQuery,
        text: String,
    },
    Focus {
        target: ElementQuery,
    },
    PressKey {
        key: String,
    },
    /// Observe an attribute; the value lands in the step report
    ReadAttribute {
        target: ElementQuery,
        name: String,
    },
    /// Observe an input value; the value lands in the step report
    ReadValue {
        target: ElementQuery,
    },
    Assert {
        condition: Condition,
        message: String,
    },
    /// Capture a screenshot, full-page or scoped to a query
    Screenshot {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<ElementQuery>,
    },
    /// Run a script in the page; with args it must be a function expression
    Evaluate {
        script: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<serde_json::Value>,
    },
    Sleep {
        duration_ms: u64,
    },
}

impl Step {
    /// Short human-readable form for logs and reports
    pub fn label(&self) -> String {
        match self {
            Step::Navigate { url, .. } => format!("navigate {}", url),
            Step::WaitFor { target, until, .. } => format!("wait_for {} {}", until, target),
            Step::Click { target } => format!("click {}", target),
            Step::Fill { target, text } => format!("fill {} ({} chars)", target, text.chars().count()),
            Step::Focus { target } => format!("focus {}", target),
            Step::PressKey { key } => format!("press_key {}", key),
            Step::ReadAttribute { target, name } => format!("read_attribute {} {}", name, target),
            Step::ReadValue { target } => format!("read_value {}", target),
            Step::Assert { condition, .. } => format!("assert {}", condition),
            Step::Screenshot { path, .. } => format!("screenshot {}", path),
            Step::Evaluate { .. } => "evaluate".to_string(),
            Step::Sleep { duration_ms } => format!("sleep {}ms", duration_ms),
        }
    }
}

/// A named, ordered list of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Parse a scenario from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scenario from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_json_round_trip() {
        let json = serde_json::json!({
            "name": "shopping duplicate entry",
            "steps": [
                {"type": "navigate", "url": "/"},
                {"type": "wait_for",
                 "target": {"kind": "text", "text": "Shopping List"}},
                {"type": "click",
                 "target": {"kind": "role", "role": "button", "name": "Add item"}},
                {"type": "fill",
                 "target": {"kind": "role", "role": "textbox", "name": "New item name"},
                 "text": "Milk"},
                {"type": "wait_for",
                 "target": {"kind": "text", "text": "Already on your list!"},
                 "until": {"state": "visible"},
                 "timeout_ms": 5000},
                {"type": "screenshot", "path": "verification_shopping_list.png"}
            ]
        });

        let scenario = Scenario::from_json(&json.to_string()).unwrap();
        assert_eq!(scenario.name, "shopping duplicate entry");
        assert_eq!(scenario.steps.len(), 6);

        // Omitted `until` defaults to visible
        assert_eq!(
            scenario.steps[1],
            Step::WaitFor {
                target: ElementQuery::text("Shopping List"),
                until: WaitUntil::Visible,
                timeout_ms: None,
            }
        );

        let back = serde_json::to_string(&scenario).unwrap();
        assert_eq!(Scenario::from_json(&back).unwrap(), scenario);
    }

    #[test]
    fn test_unknown_step_type_is_rejected_at_load() {
        let json = r#"{"name": "bad", "steps": [{"type": "teleport", "url": "/"}]}"#;
        let err = Scenario::from_json(json).unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }

    #[test]
    fn test_assert_step_parses_condition() {
        let json = serde_json::json!({
            "name": "length cap",
            "steps": [{
                "type": "assert",
                "condition": {
                    "kind": "value_length",
                    "target": {"kind": "role", "role": "textbox", "name": "New item name"},
                    "length": 50
                },
                "message": "application caps the value at 50"
            }]
        });

        let scenario = Scenario::from_json(&json.to_string()).unwrap();
        match &scenario.steps[0] {
            Step::Assert { condition, message } => {
                assert_eq!(
                    *condition,
                    Condition::ValueLength {
                        target: ElementQuery::role_with_name("textbox", "New item name"),
                        length: 50,
                    }
                );
                assert!(message.contains("50"));
            }
            other => panic!("expected assert step, got {:?}", other),
        }
    }

    #[test]
    fn test_labels_name_the_operation() {
        let step = Step::Fill {
            target: ElementQuery::role_with_name("textbox", "New item name"),
            text: "A".repeat(60),
        };
        let label = step.label();
        assert!(label.starts_with("fill"));
        assert!(label.contains("60 chars"));
    }
}
