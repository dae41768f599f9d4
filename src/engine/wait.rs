//! Condition waiting
//!
//! Polls a condition on a fixed short interval until it holds or a deadline
//! elapses. Every timeout carries the last-observed state so a failure is
//! diagnosable without re-running the scenario.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::engine::query::ElementQuery;
use crate::engine::resolver::{resolve_optional, ResolvedElement};
use crate::session::traits::PageDriver;
use crate::{Error, Result};

/// Interval between condition checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a `WaitFor` step waits for
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WaitUntil {
    /// The element exists in the tree
    Attached,
    /// The element exists and renders with a non-zero box
    #[default]
    Visible,
    /// The element is detached or not visible
    Hidden,
    /// The element's attribute equals a literal value
    AttributeEquals { name: String, value: String },
    /// The element's visible text contains a fragment
    TextPresent { text: String },
}

impl std::fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitUntil::Attached => f.write_str("attached"),
            WaitUntil::Visible => f.write_str("visible"),
            WaitUntil::Hidden => f.write_str("hidden"),
            WaitUntil::AttributeEquals { name, value } => {
                write!(f, "attribute {}={:?}", name, value)
            }
            WaitUntil::TextPresent { text } => write!(f, "text {:?} present", text),
        }
    }
}

/// Truncate observed text for diagnostics
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// One condition check; `Ok((false, state))` describes what was observed
async fn check_condition(
    driver: &dyn PageDriver,
    query: &ElementQuery,
    until: &WaitUntil,
) -> Result<(bool, String)> {
    let resolved = resolve_optional(driver, query).await?;
    let state = match (until, &resolved) {
        (WaitUntil::Hidden, None) => return Ok((true, String::new())),
        (_, None) => "0 matching elements".to_string(),

        (WaitUntil::Attached, Some(_)) => return Ok((true, String::new())),

        (WaitUntil::Visible, Some(found)) if found.snapshot.visible => {
            return Ok((true, String::new()))
        }
        (WaitUntil::Visible, Some(_)) => "element found but not visible".to_string(),

        (WaitUntil::Hidden, Some(found)) if !found.snapshot.visible => {
            return Ok((true, String::new()))
        }
        (WaitUntil::Hidden, Some(found)) => {
            format!("element still visible: {}", found.snapshot.describe())
        }

        (WaitUntil::AttributeEquals { name, value }, Some(found)) => {
            match found.snapshot.attribute(name) {
                Some(observed) if observed == value => return Ok((true, String::new())),
                Some(observed) => format!("attribute {}={:?}", name, observed),
                None => format!("attribute {} missing", name),
            }
        }

        (WaitUntil::TextPresent { text }, Some(found)) => {
            if found.snapshot.text.contains(text.as_str()) {
                return Ok((true, String::new()));
            }
            format!("visible text: {:?}", excerpt(&found.snapshot.text, 80))
        }
    };
    Ok((false, state))
}

/// The wait engine
///
/// Shared by explicit `WaitFor` steps and the implicit actionability wait
/// that precedes every element action.
#[derive(Debug, Clone)]
pub struct Waiter {
    poll_interval: Duration,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Waiter {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// A waiter with a custom poll interval, for tests
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Wait until `until` holds for `query`, bounded by `timeout`
    pub async fn wait_for(
        &self,
        driver: &dyn PageDriver,
        query: &ElementQuery,
        until: &WaitUntil,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let (satisfied, last_state) = check_condition(driver, query, until).await?;
            if satisfied {
                debug!("Condition {} met for {}", until, query);
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::timeout(format!(
                    "condition {} not met for {} after {}ms; last state: {}",
                    until,
                    query,
                    timeout.as_millis(),
                    last_state
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Wait until the element is attached, visible, and enabled.
    ///
    /// Returns the resolved element so the caller can act on the same match
    /// index the wait settled on.
    pub async fn wait_actionable(
        &self,
        driver: &dyn PageDriver,
        query: &ElementQuery,
        timeout: Duration,
    ) -> Result<ResolvedElement> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let last_state = match resolve_optional(driver, query).await? {
                Some(found) if found.snapshot.visible && !found.snapshot.disabled => {
                    return Ok(found)
                }
                Some(found) if !found.snapshot.visible => {
                    "element found but not visible".to_string()
                }
                Some(_) => "element visible but disabled".to_string(),
                None => "0 matching elements".to_string(),
            };
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::timeout(format!(
                    "{} not actionable after {}ms; last state: {}",
                    query,
                    timeout.as_millis(),
                    last_state
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
