//! Assertion checking
//!
//! Single-shot, side-effect-free evaluation of a condition against the
//! page. A failed assertion carries a diagnostic snapshot of what was
//! actually observed, so the failure is self-documenting.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::query::ElementQuery;
use crate::engine::resolver::{describe_candidates, resolve_one, resolve_optional};
use crate::session::traits::PageDriver;
use crate::{Error, Result};

/// An assertable condition about the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// The target resolves to a visible element
    Visible { target: ElementQuery },
    /// The target is detached or not visible
    Hidden { target: ElementQuery },
    /// Text is present, in the given scope or anywhere on the page
    TextPresent {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<ElementQuery>,
    },
    /// An attribute equals a literal value
    AttributeEquals {
        target: ElementQuery,
        name: String,
        value: String,
    },
    /// An input's value equals a literal
    ValueEquals { target: ElementQuery, value: String },
    /// An input's value has exactly this many characters
    ValueLength { target: ElementQuery, length: usize },
    /// The query matches exactly this many elements
    Count { target: ElementQuery, count: usize },
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Visible { target } => write!(f, "visible({})", target),
            Condition::Hidden { target } => write!(f, "hidden({})", target),
            Condition::TextPresent { text, within: None } => {
                write!(f, "text {:?} present", text)
            }
            Condition::TextPresent {
                text,
                within: Some(within),
            } => write!(f, "text {:?} present within {}", text, within),
            Condition::AttributeEquals {
                target,
                name,
                value,
            } => write!(f, "{} attribute {}={:?}", target, name, value),
            Condition::ValueEquals { target, value } => {
                write!(f, "{} value == {:?}", target, value)
            }
            Condition::ValueLength { target, length } => {
                write!(f, "{} value length == {}", target, length)
            }
            Condition::Count { target, count } => write!(f, "count({}) == {}", target, count),
        }
    }
}

fn failed(message: &str, diagnostic: String) -> Error {
    Error::assertion_failed(message, diagnostic)
}

/// Check a condition once.
///
/// Resolution errors where a value had to be read (attribute, input value)
/// propagate as their own kind; existence-shaped conditions fold "not
/// found" into the assertion outcome instead.
pub async fn check(driver: &dyn PageDriver, condition: &Condition, message: &str) -> Result<()> {
    debug!("Asserting {}", condition);
    match condition {
        Condition::Visible { target } => match resolve_optional(driver, target).await? {
            Some(found) if found.snapshot.visible => Ok(()),
            Some(found) => Err(failed(
                message,
                format!("element found but not visible: {}", found.snapshot.describe()),
            )),
            None => Err(failed(message, format!("0 elements matching {}", target))),
        },

        Condition::Hidden { target } => match resolve_optional(driver, target).await? {
            None => Ok(()),
            Some(found) if !found.snapshot.visible => Ok(()),
            Some(found) => Err(failed(
                message,
                format!("element still visible: {}", found.snapshot.describe()),
            )),
        },

        Condition::TextPresent { text, within } => match within {
            Some(scope) => match resolve_optional(driver, scope).await? {
                Some(found) if found.snapshot.text.contains(text.as_str()) => Ok(()),
                Some(found) => Err(failed(
                    message,
                    format!("visible text: {:?}", found.snapshot.text),
                )),
                None => Err(failed(message, format!("0 elements matching {}", scope))),
            },
            None => {
                let matches = driver
                    .find_all(&ElementQuery::text_contains(text.clone()))
                    .await?;
                if matches.iter().any(|m| m.visible) {
                    Ok(())
                } else if matches.is_empty() {
                    Err(failed(message, format!("text {:?} not found on page", text)))
                } else {
                    Err(failed(
                        message,
                        format!(
                            "text {:?} present but hidden: {}",
                            text,
                            describe_candidates(&matches)
                        ),
                    ))
                }
            }
        },

        Condition::AttributeEquals {
            target,
            name,
            value,
        } => {
            let found = resolve_one(driver, target).await?;
            match found.snapshot.attribute(name) {
                Some(observed) if observed == value => Ok(()),
                Some(observed) => Err(failed(
                    message,
                    format!("observed {}={:?}", name, observed),
                )),
                None => Err(failed(message, format!("attribute {} missing", name))),
            }
        }

        Condition::ValueEquals { target, value } => {
            let found = resolve_one(driver, target).await?;
            match found.snapshot.value.as_deref() {
                Some(observed) if observed == value => Ok(()),
                observed => Err(failed(message, format!("observed value {:?}", observed))),
            }
        }

        Condition::ValueLength { target, length } => {
            let found = resolve_one(driver, target).await?;
            let observed = found.snapshot.value.as_deref().unwrap_or("");
            let observed_len = observed.chars().count();
            if observed_len == *length {
                Ok(())
            } else {
                Err(failed(
                    message,
                    format!("observed value of length {}: {:?}", observed_len, observed),
                ))
            }
        }

        Condition::Count { target, count } => {
            let matches = driver.find_all(target).await?;
            if matches.len() == *count {
                Ok(())
            } else {
                Err(failed(
                    message,
                    format!(
                        "observed {} matching elements: {}",
                        matches.len(),
                        describe_candidates(&matches)
                    ),
                ))
            }
        }
    }
}
