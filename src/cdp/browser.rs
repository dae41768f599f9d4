//! CDP browser control implementation
//!
//! This module provides endpoint-level operations over the browser's HTTP
//! interface.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "http://127.0.0.1:9222" or "ws://127.0.0.1:9222")
    endpoint: String,
    /// HTTP client for the discovery endpoints
    http: reqwest::Client,
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser endpoint (e.g., "http://127.0.0.1:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint_str = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint_str);
        Self {
            endpoint: endpoint_str,
            http: reqwest::Client::new(),
        }
    }

    /// Endpoint in http form regardless of how it was given
    fn http_endpoint(&self) -> String {
        self.endpoint
            .replace("ws://", "http://")
            .replace("wss://", "https://")
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let url = format!("{}/json/version", self.http_endpoint());
        debug!("Fetching browser version from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::startup(format!("Failed to connect to browser: {}", e)))?;

        let version_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::startup(format!("Failed to parse version: {}", e)))?;

        Ok(BrowserVersion {
            protocol_version: version_json
                .get("Protocol-Version")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            product: version_json
                .get("Browser")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            user_agent: version_json
                .get("User-Agent")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            js_version: version_json
                .get("WebKit-Version")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
        })
    }

    /// Create a new page target via the /json/new endpoint
    ///
    /// /json/new creates a page and returns its WebSocket URL directly,
    /// which is simpler than the Target.createTarget command.
    async fn create_page(&self, url: &str) -> Result<PageTarget, Error> {
        info!("Creating new page target with URL: {}", url);

        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);

        let response = self.http.put(&new_url).send().await.map_err(|e| {
            Error::startup(format!(
                r#"Failed to reach the DevTools endpoint at {}.
When attaching to an existing browser, start Chrome with:
  macOS: /Applications/Google\ Chrome.app/Contents/MacOS/Google\ Chrome --remote-debugging-port=9222 --user-data-dir=/tmp/chrome-debug
  Linux: google-chrome --remote-debugging-port=9222 --user-data-dir=/tmp/chrome-debug
  Windows: chrome.exe --remote-debugging-port=9222 --user-data-dir=C:\chrome-debug
Original error: {}"#,
                self.endpoint, e
            ))
        })?;

        let response_text = response
            .text()
            .await
            .map_err(|e| Error::startup(format!("Failed to read response: {}", e)))?;

        let target_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            Error::startup(format!(
                "Failed to parse new target response: {} (response was: {})",
                e, response_text
            ))
        })?;

        let target_id = target_json
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::startup("No id in new target response"))?;

        let ws_url = target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::startup("No webSocketDebuggerUrl in new target response"))?;

        debug!("Created target {} at {}", target_id, ws_url);

        Ok(PageTarget {
            target_id: target_id.to_string(),
            ws_url: ws_url.to_string(),
        })
    }

    /// Close a page target via the /json/close endpoint
    async fn close_page(&self, target_id: &str) -> Result<(), Error> {
        info!("Closing page target {}", target_id);

        let url = format!("{}/json/close/{}", self.http_endpoint(), target_id);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::cdp(format!("Failed to close target: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::cdp(format!(
                "Close target {} returned {}",
                target_id,
                response.status()
            )));
        }

        Ok(())
    }

    /// Connect a CDP client to a page target and enable its domains
    async fn create_client(&self, target: &PageTarget) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target {}", target.target_id);

        let connection = CdpWebSocketConnection::new(target.ws_url.clone()).await?;
        let client = Arc::new(CdpClientImpl::new(connection));

        // Page and Runtime are all the harness needs; input dispatch
        // requires no enable
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_creation() {
        let browser = CdpBrowserImpl::new("http://127.0.0.1:9222");
        assert_eq!(browser.endpoint, "http://127.0.0.1:9222");
    }

    #[test]
    fn test_endpoint_conversion() {
        let browser = CdpBrowserImpl::new("ws://localhost:9222");
        assert_eq!(browser.http_endpoint(), "http://localhost:9222");

        let secure = CdpBrowserImpl::new("wss://remote.example.com:9222");
        assert_eq!(secure.http_endpoint(), "https://remote.example.com:9222");
    }
}
