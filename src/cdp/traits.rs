//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::types::Clip;

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
/// Incoming event notifications are logged and dropped; the harness drives
/// the page by polling, not by event subscription.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// High-level CDP client that provides typed methods for the operations the
/// harness performs against one page target.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection>;

    /// Navigate to a URL and wait for document readiness within `timeout`
    async fn navigate(&self, url: &str, timeout: Duration)
        -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page
    async fn evaluate(
        &self,
        script: &str,
        await_promise: bool,
    ) -> Result<EvaluationResult, crate::Error>;

    /// Capture a screenshot, optionally clipped to a region
    async fn screenshot(
        &self,
        format: ScreenshotFormat,
        clip: Option<Clip>,
    ) -> Result<Vec<u8>, crate::Error>;

    /// Insert text at the current caret through the editing pipeline
    async fn insert_text(&self, text: &str) -> Result<(), crate::Error>;

    /// Dispatch a left-button click at page coordinates
    async fn click_at(&self, x: f64, y: f64) -> Result<(), crate::Error>;

    /// Dispatch a key press (down + up, plus char for printable keys)
    async fn press_key(&self, key: &str) -> Result<(), crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// URL after navigation
    pub url: String,
    /// Frame that navigated
    pub frame_id: Option<String>,
}

/// JavaScript evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// String content, when the result is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvaluationResult::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Screenshot format
#[derive(Debug, Clone, Copy)]
pub enum ScreenshotFormat {
    /// PNG format
    Png,
    /// JPEG format with quality 0-100
    Jpeg(u8),
}

/// A created page target and its debugger endpoint
#[derive(Debug, Clone)]
pub struct PageTarget {
    /// Target ID
    pub target_id: String,
    /// WebSocket debugger URL for the target
    pub ws_url: String,
}

/// CDP browser trait
///
/// Endpoint-level operations over the browser's HTTP interface.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, crate::Error>;

    /// Create a new page target
    async fn create_page(&self, url: &str) -> Result<PageTarget, crate::Error>;

    /// Close a page target
    async fn close_page(&self, target_id: &str) -> Result<(), crate::Error>;

    /// Connect a CDP client to a page target and enable its domains
    async fn create_client(&self, target: &PageTarget) -> Result<Arc<dyn CdpClient>, crate::Error>;
}

/// Browser version information
#[derive(Debug, Clone)]
pub struct BrowserVersion {
    /// Protocol version
    pub protocol_version: String,
    /// Product name
    pub product: String,
    /// User agent
    pub user_agent: String,
    /// JavaScript engine version
    pub js_version: String,
}
