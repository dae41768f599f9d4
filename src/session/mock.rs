//! Fake page driver for testing
//!
//! An in-memory page model implementing `PageDriver`. Tests describe the
//! page as a set of `FakeElement`s plus a string-keyed storage map, and
//! script reactions to actions through hooks. Every action is appended to a
//! call log so tests can assert on execution order.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::cdp::mock::MOCK_SCREENSHOT_B64;
use crate::cdp::traits::EvaluationResult;
use crate::engine::query::{ElementQuery, QueryKind};
use crate::session::traits::{ElementSnapshot, PageDriver, Rect};
use crate::Error;

/// One element in the fake page model
#[derive(Debug, Clone)]
pub struct FakeElement {
    /// Stable ID hooks use to address the element
    pub id: String,
    pub tag: String,
    pub role: Option<String>,
    pub name: Option<String>,
    pub text: String,
    pub value: Option<String>,
    /// Application-enforced value length cap, applied on fill
    pub max_len: Option<usize>,
    pub visible: bool,
    pub disabled: bool,
    pub attributes: BTreeMap<String, String>,
    /// CSS selectors this element claims to match
    pub css_matches: Vec<String>,
    pub rect: Rect,
}

impl FakeElement {
    /// Create a visible, enabled element
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            role: None,
            name: None,
            text: String::new(),
            value: None,
            max_len: None,
            visible: true,
            disabled: false,
            attributes: BTreeMap::new(),
            css_matches: Vec::new(),
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 30.0,
            },
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn matching_css(mut self, selector: impl Into<String>) -> Self {
        self.css_matches.push(selector.into());
        self
    }

    /// Whether this element matches `query`, ignoring the ordinal
    fn matches(&self, query: &ElementQuery) -> bool {
        let base = match &query.kind {
            QueryKind::Role { role, name, exact } => {
                self.role.as_deref() == Some(role.as_str())
                    && match name {
                        Some(wanted) if *exact => self.name.as_deref() == Some(wanted.as_str()),
                        Some(wanted) => self
                            .name
                            .as_deref()
                            .is_some_and(|n| n.eq_ignore_ascii_case(wanted)),
                        None => true,
                    }
            }
            QueryKind::Text { text } => self.text == *text,
            QueryKind::TextContains { text } => self.text.contains(text.as_str()),
            QueryKind::Css { selector } => self.css_matches.iter().any(|s| s == selector),
        };
        match &query.has_text {
            Some(has_text) => base && self.text.contains(has_text.as_str()),
            None => base,
        }
    }

    fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            tag: self.tag.clone(),
            role: self.role.clone(),
            name: self.name.clone(),
            text: self.text.clone(),
            value: self.value.clone(),
            visible: self.visible,
            disabled: self.disabled,
            attributes: self.attributes.clone(),
            rect: self.rect,
        }
    }
}

/// Mutable state of the fake page
#[derive(Debug, Default)]
pub struct PageModel {
    /// Elements in document order
    pub elements: Vec<FakeElement>,
    /// Client-side persisted storage (the localStorage stand-in)
    pub storage: HashMap<String, String>,
    /// ID of the currently focused element
    pub focused: Option<String>,
    /// Last navigated URL
    pub url: Option<String>,
}

impl PageModel {
    /// Element by ID, for hooks mutating state
    pub fn element_mut(&mut self, id: &str) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    /// Remove an element from the tree
    pub fn remove_element(&mut self, id: &str) {
        self.elements.retain(|el| el.id != id);
    }

    /// IDs of elements matching `query`, in document order
    fn match_ids(&self, query: &ElementQuery) -> Vec<String> {
        self.elements
            .iter()
            .filter(|el| el.matches(query))
            .map(|el| el.id.clone())
            .collect()
    }
}

type ModelHook = Box<dyn Fn(&mut PageModel, &str) + Send + Sync>;
type ScriptHook = Box<dyn Fn(&mut PageModel, &str) -> EvaluationResult + Send + Sync>;

/// Scripted in-memory page driver
///
/// Hooks receive the mutable page model plus a context string: the URL for
/// `on_navigate`, the element ID for `on_click`/`on_fill`, the key for
/// `on_key`, the full script for `on_script`.
pub struct FakePage {
    model: Mutex<PageModel>,
    calls: Mutex<Vec<String>>,
    on_navigate: Option<ModelHook>,
    on_click: Option<ModelHook>,
    on_fill: Option<ModelHook>,
    on_key: Option<ModelHook>,
    on_script: Option<ScriptHook>,
    fail_navigations: AtomicU64,
    close_count: AtomicU64,
    active: AtomicBool,
}

impl std::fmt::Debug for FakePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePage")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    /// Create an empty fake page
    pub fn new() -> Self {
        Self {
            model: Mutex::new(PageModel::default()),
            calls: Mutex::new(Vec::new()),
            on_navigate: None,
            on_click: None,
            on_fill: None,
            on_key: None,
            on_script: None,
            fail_navigations: AtomicU64::new(0),
            close_count: AtomicU64::new(0),
            active: AtomicBool::new(true),
        }
    }

    /// Add an element to the page
    pub fn with_element(self, element: FakeElement) -> Self {
        self.model
            .try_lock()
            .expect("builder used before sharing")
            .elements
            .push(element);
        self
    }

    /// Seed a storage entry
    pub fn with_storage(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.model
            .try_lock()
            .expect("builder used before sharing")
            .storage
            .insert(key.into(), value.into());
        self
    }

    /// React to a navigation; the hook renders the page for the URL
    pub fn on_navigate(
        mut self,
        hook: impl Fn(&mut PageModel, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_navigate = Some(Box::new(hook));
        self
    }

    /// React to a click on an element
    pub fn on_click(mut self, hook: impl Fn(&mut PageModel, &str) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Box::new(hook));
        self
    }

    /// React to a fill, after the value was applied
    pub fn on_fill(mut self, hook: impl Fn(&mut PageModel, &str) + Send + Sync + 'static) -> Self {
        self.on_fill = Some(Box::new(hook));
        self
    }

    /// React to a key press
    pub fn on_key(mut self, hook: impl Fn(&mut PageModel, &str) + Send + Sync + 'static) -> Self {
        self.on_key = Some(Box::new(hook));
        self
    }

    /// Handle an evaluated script; the default reply is `Null`
    pub fn on_script(
        mut self,
        hook: impl Fn(&mut PageModel, &str) -> EvaluationResult + Send + Sync + 'static,
    ) -> Self {
        self.on_script = Some(Box::new(hook));
        self
    }

    /// Make the next `count` navigations fail
    pub fn fail_next_navigations(&self, count: u64) {
        self.fail_navigations.store(count, Ordering::Relaxed);
    }

    /// Actions performed so far, in order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// How many times `close` was called
    pub fn close_count(&self) -> u64 {
        self.close_count.load(Ordering::Relaxed)
    }

    /// Direct access to the page model, for test setup and inspection
    pub async fn model(&self) -> MutexGuard<'_, PageModel> {
        self.model.lock().await
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.active.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(Error::session_closed("fake page is closed"))
        }
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }

    /// Resolve the element ID for `query` at `index`
    async fn resolve_id(&self, query: &ElementQuery, index: usize) -> Result<String, Error> {
        let model = self.model.lock().await;
        let ids = model.match_ids(query);
        ids.get(index).cloned().ok_or_else(|| {
            Error::element_not_found(format!(
                "index {} out of range: {} matches for {}",
                index,
                ids.len(),
                query
            ))
        })
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), Error> {
        self.ensure_active()?;
        self.record(format!("navigate {}", url)).await;

        let remaining = self.fail_navigations.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_navigations.store(remaining - 1, Ordering::Relaxed);
            return Err(Error::navigation_failed(format!(
                "{}: connection refused",
                url
            )));
        }

        let mut model = self.model.lock().await;
        model.url = Some(url.to_string());
        if let Some(hook) = &self.on_navigate {
            hook(&mut model, url);
        }
        Ok(())
    }

    async fn find_all(&self, query: &ElementQuery) -> Result<Vec<ElementSnapshot>, Error> {
        self.ensure_active()?;
        let model = self.model.lock().await;
        Ok(model
            .elements
            .iter()
            .filter(|el| el.matches(query))
            .map(FakeElement::snapshot)
            .collect())
    }

    async fn click(&self, query: &ElementQuery, index: usize) -> Result<(), Error> {
        self.ensure_active()?;
        let id = self.resolve_id(query, index).await?;
        self.record(format!("click {}", id)).await;

        let mut model = self.model.lock().await;
        if let Some(hook) = &self.on_click {
            hook(&mut model, &id);
        }
        Ok(())
    }

    async fn focus(&self, query: &ElementQuery, index: usize) -> Result<(), Error> {
        self.ensure_active()?;
        let id = self.resolve_id(query, index).await?;
        self.record(format!("focus {}", id)).await;

        self.model.lock().await.focused = Some(id);
        Ok(())
    }

    async fn fill(&self, query: &ElementQuery, index: usize, text: &str) -> Result<(), Error> {
        self.ensure_active()?;
        let id = self.resolve_id(query, index).await?;

        let mut model = self.model.lock().await;
        model.focused = Some(id.clone());
        let element = model
            .element_mut(&id)
            .ok_or_else(|| Error::internal("resolved element vanished"))?;

        // The model enforces the application's length cap, like a real
        // maxlength attribute under the editing pipeline
        let applied: String = match element.max_len {
            Some(max_len) => text.chars().take(max_len).collect(),
            None => text.to_string(),
        };
        element.value = Some(applied.clone());
        if let Some(hook) = &self.on_fill {
            hook(&mut model, &id);
        }
        drop(model);

        self.record(format!("fill {}={}", id, applied)).await;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), Error> {
        self.ensure_active()?;
        self.record(format!("press_key {}", key)).await;

        let mut model = self.model.lock().await;
        if let Some(hook) = &self.on_key {
            hook(&mut model, key);
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        script: &str,
        _await_promise: bool,
    ) -> Result<EvaluationResult, Error> {
        self.ensure_active()?;
        self.record("evaluate".to_string()).await;

        let mut model = self.model.lock().await;
        match &self.on_script {
            Some(hook) => Ok(hook(&mut model, script)),
            None => Ok(EvaluationResult::Null),
        }
    }

    async fn screenshot(&self, clip: Option<Rect>) -> Result<Vec<u8>, Error> {
        self.ensure_active()?;
        self.record(match clip {
            Some(_) => "screenshot clipped".to_string(),
            None => "screenshot".to_string(),
        })
        .await;

        BASE64
            .decode(MOCK_SCREENSHOT_B64)
            .map_err(|e| Error::internal(format!("Bad mock screenshot: {}", e)))
    }

    async fn close(&self) -> Result<(), Error> {
        self.record("close".to_string()).await;
        self.close_count.fetch_add(1, Ordering::Relaxed);
        self.active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}
