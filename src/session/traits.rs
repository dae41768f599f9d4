//! Session layer traits
//!
//! This module defines the page driver abstraction the verification engine
//! runs against, plus the snapshot types it observes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::cdp::traits::EvaluationResult;
use crate::engine::query::ElementQuery;

/// Viewport-relative bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Center point, where clicks land
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Observed state of one element at query time
///
/// Snapshots are values, not handles. They describe what the page showed at
/// the moment the query ran; re-running the query is the only way to refresh
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Lowercase tag name
    pub tag: String,
    /// Computed accessible role
    pub role: Option<String>,
    /// Computed accessible name
    pub name: Option<String>,
    /// Whitespace-normalized text content
    pub text: String,
    /// Current value, for form controls
    pub value: Option<String>,
    /// Whether the element is rendered and takes up space
    pub visible: bool,
    /// Whether the element is disabled
    pub disabled: bool,
    /// All attributes present on the element
    pub attributes: BTreeMap<String, String>,
    /// Bounding box in viewport coordinates
    pub rect: Rect,
}

impl ElementSnapshot {
    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Short description for candidate listings and diagnostics
    pub fn describe(&self) -> String {
        let label = match (&self.role, &self.name) {
            (Some(role), Some(name)) => format!("{} {:?}", role, name),
            (Some(role), None) => role.clone(),
            (None, _) => format!("<{}>", self.tag),
        };
        let mut flags = Vec::new();
        if !self.visible {
            flags.push("hidden");
        }
        if self.disabled {
            flags.push("disabled");
        }
        if flags.is_empty() {
            label
        } else {
            format!("{} [{}]", label, flags.join(", "))
        }
    }
}

/// Page driver trait
///
/// One driver instance is bound to one page for the lifetime of a session.
/// Element operations take a query plus a match index so the driver can
/// re-locate the element in the live DOM at dispatch time.
#[async_trait]
pub trait PageDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to a URL and wait for document readiness within `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), crate::Error>;

    /// Evaluate all elements matching a query, in document order
    async fn find_all(&self, query: &ElementQuery) -> Result<Vec<ElementSnapshot>, crate::Error>;

    /// Click the center of the element at `index` among the query's matches
    async fn click(&self, query: &ElementQuery, index: usize) -> Result<(), crate::Error>;

    /// Focus the element at `index` among the query's matches
    async fn focus(&self, query: &ElementQuery, index: usize) -> Result<(), crate::Error>;

    /// Replace the element's content with `text` through the editing
    /// pipeline, so page-side input constraints apply
    async fn fill(&self, query: &ElementQuery, index: usize, text: &str)
        -> Result<(), crate::Error>;

    /// Dispatch a key press to the focused element
    async fn press_key(&self, key: &str) -> Result<(), crate::Error>;

    /// Evaluate JavaScript in the page
    async fn evaluate(
        &self,
        script: &str,
        await_promise: bool,
    ) -> Result<EvaluationResult, crate::Error>;

    /// Capture a PNG screenshot, optionally clipped to a region
    async fn screenshot(&self, clip: Option<Rect>) -> Result<Vec<u8>, crate::Error>;

    /// Close the page
    async fn close(&self) -> Result<(), crate::Error>;

    /// Whether the page is still usable
    fn is_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ElementSnapshot {
        ElementSnapshot {
            tag: "button".to_string(),
            role: Some("button".to_string()),
            name: Some("Add Item".to_string()),
            text: "Add Item".to_string(),
            value: None,
            visible: true,
            disabled: false,
            attributes: BTreeMap::new(),
            rect: Rect {
                x: 10.0,
                y: 20.0,
                width: 80.0,
                height: 30.0,
            },
        }
    }

    #[test]
    fn test_rect_center() {
        let (x, y) = snapshot().rect.center();
        assert_eq!(x, 50.0);
        assert_eq!(y, 35.0);
    }

    #[test]
    fn test_describe_flags_state() {
        let mut snap = snapshot();
        assert_eq!(snap.describe(), "button \"Add Item\"");

        snap.visible = false;
        snap.disabled = true;
        assert_eq!(snap.describe(), "button \"Add Item\" [hidden, disabled]");
    }
}
