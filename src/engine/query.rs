//! Element query vocabulary
//!
//! A query names the element a step acts on. Queries are data, not live
//! handles: each use re-evaluates against the current DOM, so a query built
//! once stays meaningful across re-renders and navigations.

use serde::{Deserialize, Serialize};

/// How candidates are collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryKind {
    /// Match by accessible role, optionally constrained by accessible name.
    ///
    /// Without `exact`, names compare case-insensitively after whitespace
    /// normalization; with `exact`, the comparison is case-sensitive.
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        exact: bool,
    },
    /// Match elements whose normalized text equals `text`
    Text { text: String },
    /// Match elements whose normalized text contains `text`
    TextContains { text: String },
    /// Match by CSS selector
    Css { selector: String },
}

/// A declarative element query
///
/// `has_text` narrows candidates to those containing the given text.
/// `nth` picks one candidate by document order instead of requiring the
/// query to be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementQuery {
    #[serde(flatten)]
    pub kind: QueryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

impl ElementQuery {
    /// Query by accessible role
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Role {
                role: role.into(),
                name: None,
                exact: false,
            },
            has_text: None,
            nth: None,
        }
    }

    /// Query by accessible role and name
    pub fn role_with_name(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Role {
                role: role.into(),
                name: Some(name.into()),
                exact: false,
            },
            has_text: None,
            nth: None,
        }
    }

    /// Query by exact text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Text { text: text.into() },
            has_text: None,
            nth: None,
        }
    }

    /// Query by text fragment
    pub fn text_contains(text: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::TextContains { text: text.into() },
            has_text: None,
            nth: None,
        }
    }

    /// Query by CSS selector
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Css {
                selector: selector.into(),
            },
            has_text: None,
            nth: None,
        }
    }

    /// Require the matched element to contain `text`
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    /// Pick the element at `index` (document order) from the matches
    pub fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    /// Pick the first matching element
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Human-readable form for error messages and reports
    pub fn describe(&self) -> String {
        let mut out = match &self.kind {
            QueryKind::Role { role, name, exact } => match name {
                Some(name) if *exact => format!("role={} name={:?} (exact)", role, name),
                Some(name) => format!("role={} name={:?}", role, name),
                None => format!("role={}", role),
            },
            QueryKind::Text { text } => format!("text={:?}", text),
            QueryKind::TextContains { text } => format!("text~={:?}", text),
            QueryKind::Css { selector } => format!("css={:?}", selector),
        };
        if let Some(has_text) = &self.has_text {
            out.push_str(&format!(" has_text={:?}", has_text));
        }
        if let Some(nth) = self.nth {
            out.push_str(&format!(" nth={}", nth));
        }
        out
    }
}

impl std::fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
