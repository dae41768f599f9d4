//! Mock CDP implementation for testing
//!
//! This module provides mock implementations of CDP traits for development and testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::cdp::traits::*;
use crate::cdp::types::Clip;
use crate::Error;

/// 1x1 transparent PNG, base64-encoded
pub const MOCK_SCREENSHOT_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// A scripted reply for one command
#[derive(Debug, Clone)]
enum Scripted {
    /// Successful result payload
    Result(serde_json::Value),
    /// CDP-level error (code, message)
    Error(i32, String),
}

/// Mock CDP connection
///
/// Replies with canned payloads per method. Tests can enqueue specific
/// results or errors for a method; queued entries are consumed in order
/// before the canned default applies. Every command is recorded so tests
/// can assert on the dispatched payloads.
#[derive(Debug)]
pub struct MockCdpConnection {
    is_active: Arc<AtomicBool>,
    next_id: AtomicU64,
    scripted: Mutex<HashMap<String, Vec<Scripted>>>,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new() -> Self {
        Self {
            is_active: Arc::new(AtomicBool::new(true)),
            next_id: AtomicU64::new(1),
            scripted: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Enqueue a successful result for the next call to `method`
    pub async fn enqueue_result(&self, method: &str, result: serde_json::Value) {
        self.scripted
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push(Scripted::Result(result));
    }

    /// Enqueue a CDP error for the next call to `method`
    pub async fn enqueue_error(&self, method: &str, code: i32, message: &str) {
        self.scripted
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push(Scripted::Error(code, message.to_string()));
    }

    /// All commands sent so far, in order
    pub async fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().await.clone()
    }

    /// Commands sent for one method, in order
    pub async fn calls_for(&self, method: &str) -> Vec<serde_json::Value> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn default_result(method: &str) -> serde_json::Value {
        match method {
            "Page.navigate" => serde_json::json!({
                "frameId": uuid::Uuid::new_v4().to_string(),
                "loaderId": uuid::Uuid::new_v4().to_string(),
            }),
            // Default keeps navigate() readiness polls satisfied
            "Runtime.evaluate" => serde_json::json!({
                "result": {
                    "type": "string",
                    "value": "complete"
                }
            }),
            "Page.captureScreenshot" => serde_json::json!({
                "data": MOCK_SCREENSHOT_B64,
            }),
            _ => serde_json::json!({}),
        }
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::session_closed("Connection is closed"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.calls
            .lock()
            .await
            .push((method.to_string(), params));

        let scripted = {
            let mut scripted = self.scripted.lock().await;
            match scripted.get_mut(method) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        let result = match scripted {
            Some(Scripted::Result(value)) => value,
            Some(Scripted::Error(code, message)) => {
                // Same mapping the real connection applies to error frames
                return Err(Error::cdp(format!(
                    "{} failed: {} (code {})",
                    method, message, code
                )));
            }
            None => Self::default_result(method),
        };

        Ok(CdpResponse {
            id,
            result: Some(result),
            error: None,
        })
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}

/// Mock CDP client
///
/// Records the page operations it receives and replies to `evaluate` from
/// a scripted queue, falling back to `"complete"` so readiness polls pass.
#[derive(Debug)]
pub struct MockCdpClient {
    connection: Arc<MockCdpConnection>,
    eval_queue: Mutex<Vec<EvaluationResult>>,
    navigations: Mutex<Vec<String>>,
    inserted_text: Mutex<Vec<String>>,
    clicks: Mutex<Vec<(f64, f64)>>,
    keys: Mutex<Vec<String>>,
    fail_navigations: AtomicU64,
}

impl MockCdpClient {
    /// Create a new mock CDP client
    pub fn new() -> Self {
        Self {
            connection: Arc::new(MockCdpConnection::new()),
            eval_queue: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
            inserted_text: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            keys: Mutex::new(Vec::new()),
            fail_navigations: AtomicU64::new(0),
        }
    }

    /// Enqueue a result for the next `evaluate` call
    pub async fn enqueue_eval(&self, result: EvaluationResult) {
        self.eval_queue.lock().await.push(result);
    }

    /// Make the next `count` navigations fail
    pub fn fail_next_navigations(&self, count: u64) {
        self.fail_navigations.store(count, Ordering::Relaxed);
    }

    /// URLs navigated to so far
    pub async fn navigations(&self) -> Vec<String> {
        self.navigations.lock().await.clone()
    }

    /// Text inserted so far
    pub async fn inserted_text(&self) -> Vec<String> {
        self.inserted_text.lock().await.clone()
    }

    /// Click coordinates so far
    pub async fn clicks(&self) -> Vec<(f64, f64)> {
        self.clicks.lock().await.clone()
    }

    /// Keys pressed so far
    pub async fn keys(&self) -> Vec<String> {
        self.keys.lock().await.clone()
    }
}

impl Default for MockCdpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpClient for MockCdpClient {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        self.connection.clone()
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<NavigationResult, Error> {
        self.navigations.lock().await.push(url.to_string());

        let remaining = self.fail_navigations.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_navigations.store(remaining - 1, Ordering::Relaxed);
            return Err(Error::navigation_failed(format!(
                "{}: net::ERR_CONNECTION_REFUSED",
                url
            )));
        }

        Ok(NavigationResult {
            url: url.to_string(),
            frame_id: Some(uuid::Uuid::new_v4().to_string()),
        })
    }

    async fn evaluate(&self, _script: &str, _await_promise: bool) -> Result<EvaluationResult, Error> {
        let mut queue = self.eval_queue.lock().await;
        if queue.is_empty() {
            Ok(EvaluationResult::String("complete".to_string()))
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn screenshot(
        &self,
        _format: ScreenshotFormat,
        _clip: Option<Clip>,
    ) -> Result<Vec<u8>, Error> {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
        BASE64
            .decode(MOCK_SCREENSHOT_B64)
            .map_err(|e| Error::internal(format!("Bad mock screenshot: {}", e)))
    }

    async fn insert_text(&self, text: &str) -> Result<(), Error> {
        self.inserted_text.lock().await.push(text.to_string());
        Ok(())
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), Error> {
        self.clicks.lock().await.push((x, y));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), Error> {
        self.keys.lock().await.push(key.to_string());
        Ok(())
    }

    async fn enable_domain(&self, _domain: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn call_method(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let response = self.connection.send_command(method, params).await?;
        response
            .result
            .ok_or_else(|| Error::cdp("No result in response"))
    }
}

/// Mock CDP browser
#[derive(Debug)]
pub struct MockCdpBrowser {
    created_pages: Mutex<Vec<String>>,
    closed_pages: Mutex<Vec<String>>,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new() -> Self {
        Self {
            created_pages: Mutex::new(Vec::new()),
            closed_pages: Mutex::new(Vec::new()),
        }
    }

    /// Target IDs of pages closed so far
    pub async fn closed_pages(&self) -> Vec<String> {
        self.closed_pages.lock().await.clone()
    }
}

impl Default for MockCdpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "Chrome/126.0.0.0".to_string(),
            user_agent: "Mock Chrome/126.0.0.0".to_string(),
            js_version: "12.6.0.0".to_string(),
        })
    }

    async fn create_page(&self, url: &str) -> Result<PageTarget, Error> {
        let target_id = uuid::Uuid::new_v4().to_string();
        self.created_pages.lock().await.push(target_id.clone());
        tracing::debug!("Mock: created page {} at {}", target_id, url);

        Ok(PageTarget {
            ws_url: format!("ws://127.0.0.1:9222/devtools/page/{}", target_id),
            target_id,
        })
    }

    async fn close_page(&self, target_id: &str) -> Result<(), Error> {
        self.closed_pages.lock().await.push(target_id.to_string());
        Ok(())
    }

    async fn create_client(&self, _target: &PageTarget) -> Result<Arc<dyn CdpClient>, Error> {
        Ok(Arc::new(MockCdpClient::new()))
    }
}
