//! Selector resolution
//!
//! Classifies the live candidate set of a query into exactly one element,
//! zero elements, or an explicit ambiguity. Resolution never caches: every
//! call re-queries the page, so the answer always reflects the current tree.

use crate::engine::query::ElementQuery;
use crate::session::traits::{ElementSnapshot, PageDriver};
use crate::{Error, Result};

/// A resolved match: position in the candidate set plus the observation
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    /// Index into the query's matches, passed back to the driver so it can
    /// re-locate the element at dispatch time
    pub index: usize,
    pub snapshot: ElementSnapshot,
}

/// Short listing of candidates for ambiguity and assertion diagnostics
pub fn describe_candidates(matches: &[ElementSnapshot]) -> String {
    const LISTED: usize = 5;
    let mut parts: Vec<String> = matches
        .iter()
        .take(LISTED)
        .map(ElementSnapshot::describe)
        .collect();
    if matches.len() > LISTED {
        parts.push(format!("... {} more", matches.len() - LISTED));
    }
    parts.join("; ")
}

fn ambiguous(query: &ElementQuery, matches: &[ElementSnapshot]) -> Error {
    Error::ambiguous_match(format!(
        "{} elements match {} and no ordinal was given: {}",
        matches.len(),
        query,
        describe_candidates(matches)
    ))
}

/// Resolve zero-or-one element for a wait condition.
///
/// Zero matches (or an out-of-range ordinal) is `Ok(None)`; two or more
/// matches without an ordinal is `AmbiguousMatch` — a wait must not settle
/// on an arbitrary element any more than an action may.
pub async fn resolve_optional(
    driver: &dyn PageDriver,
    query: &ElementQuery,
) -> Result<Option<ResolvedElement>> {
    let matches = driver.find_all(query).await?;
    if query.nth.is_none() && matches.len() > 1 {
        return Err(ambiguous(query, &matches));
    }
    let index = query.nth.unwrap_or(0);
    Ok(matches
        .into_iter()
        .nth(index)
        .map(|snapshot| ResolvedElement { index, snapshot }))
}

/// Resolve exactly one element for an action or a value read
pub async fn resolve_one(
    driver: &dyn PageDriver,
    query: &ElementQuery,
) -> Result<ResolvedElement> {
    let matches = driver.find_all(query).await?;
    if query.nth.is_none() && matches.len() > 1 {
        return Err(ambiguous(query, &matches));
    }
    let count = matches.len();
    let index = query.nth.unwrap_or(0);
    matches
        .into_iter()
        .nth(index)
        .map(|snapshot| ResolvedElement { index, snapshot })
        .ok_or_else(|| match query.nth {
            Some(nth) => Error::element_not_found(format!(
                "index {} out of range: {} matches for {}",
                nth, count, query
            )),
            None => Error::element_not_found(format!("0 elements matching {}", query)),
        })
}
