//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for the
//! page operations the harness performs.

use super::keys;
use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        debug!("Creating CDP client");
        Self { connection }
    }

    /// Parse remote object value to evaluation result
    fn parse_remote_object(obj: &RemoteObject) -> Result<EvaluationResult, Error> {
        match obj.r#type.as_str() {
            "string" => {
                let value = obj
                    .value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                Ok(EvaluationResult::String(value))
            }
            "number" => {
                let value = obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0);
                Ok(EvaluationResult::Number(value))
            }
            "boolean" => {
                let value = obj
                    .value
                    .as_ref()
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Ok(EvaluationResult::Bool(value))
            }
            "undefined" | "null" => Ok(EvaluationResult::Null),
            "object" | "function" | "bigint" | "symbol" => {
                let value = obj.value.clone().unwrap_or(serde_json::Value::Null);
                Ok(EvaluationResult::Object(value))
            }
            other => {
                debug!("parse_remote_object: unknown type '{}', returning Null", other);
                Ok(EvaluationResult::Null)
            }
        }
    }

    /// Poll document.readyState until complete or the deadline passes
    async fn wait_for_ready_state(&self, deadline: tokio::time::Instant) -> Result<(), Error> {
        let mut last_state = "unknown".to_string();

        loop {
            match self.evaluate("document.readyState", false).await {
                Ok(EvaluationResult::String(state)) if state == "complete" => {
                    debug!("Document reached readyState complete");
                    return Ok(());
                }
                Ok(EvaluationResult::String(state)) => {
                    last_state = state;
                }
                Ok(_) => {
                    last_state = "unexpected readyState type".to_string();
                }
                Err(e) => {
                    // Execution context may be mid-swap during the load
                    debug!("readyState check failed, retrying: {}", e);
                    last_state = format!("evaluation failed: {}", e);
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(Error::navigation_failed(format!(
                    "document never reached readyState complete; last state: {}",
                    last_state
                )));
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Navigate to a URL and wait for document readiness
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResult, Error> {
        info!("Navigating to {} (timeout {:?})", url, timeout);
        let deadline = tokio::time::Instant::now() + timeout;

        let params = NavigateParams {
            url: url.to_string(),
            referrer: None,
            transition_type: None,
        };

        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        // Chrome reports net-level failures in errorText rather than a
        // command error
        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            if !error_text.is_empty() {
                return Err(Error::navigation_failed(format!(
                    "{}: {}",
                    url, error_text
                )));
            }
        }

        // Readiness by polling beats load events here: a navigation that
        // races the Page.enable handshake can drop its loadEventFired
        self.wait_for_ready_state(deadline).await?;

        Ok(NavigationResult {
            url: result
                .get("frame")
                .and_then(|f| f.get("url"))
                .and_then(|u| u.as_str())
                .unwrap_or(url)
                .to_string(),
            frame_id: result
                .get("frameId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
    }

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        debug!("Evaluating script ({} bytes)", script.len());

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
            context_id: None,
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        let eval_response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse EvaluateResponse: {}", e)))?;

        if let Some(details) = eval_response.exception_details {
            let description = details
                .exception
                .as_ref()
                .and_then(|e| e.description.clone())
                .or(details.text)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(Error::script_execution_failed(description));
        }

        Self::parse_remote_object(&eval_response.result)
    }

    /// Capture a screenshot, optionally clipped to a region
    async fn screenshot(
        &self,
        format: ScreenshotFormat,
        clip: Option<Clip>,
    ) -> Result<Vec<u8>, Error> {
        debug!("Capturing screenshot (clip: {})", clip.is_some());

        let (format_str, quality) = match format {
            ScreenshotFormat::Png => ("png".to_string(), None),
            ScreenshotFormat::Jpeg(q) => ("jpeg".to_string(), Some(q)),
        };

        let params = ScreenshotParams {
            format: Some(format_str),
            quality,
            clip,
            // Captures the whole document, and clip regions outside the
            // current viewport
            capture_beyond_viewport: Some(true),
        };

        let result = self
            .call_method("Page.captureScreenshot", serde_json::to_value(params)?)
            .await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;

        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    /// Insert text at the current caret through the editing pipeline
    async fn insert_text(&self, text: &str) -> Result<(), Error> {
        debug!("Inserting {} characters", text.chars().count());

        let params = InsertTextParams {
            text: text.to_string(),
        };

        let _ = self
            .call_method("Input.insertText", serde_json::to_value(params)?)
            .await?;

        Ok(())
    }

    /// Dispatch a left-button click at page coordinates
    async fn click_at(&self, x: f64, y: f64) -> Result<(), Error> {
        debug!("Clicking at ({}, {})", x, y);

        for event_type in ["mousePressed", "mouseReleased"] {
            let params = MouseEventParams {
                r#type: event_type.to_string(),
                x,
                y,
                button: Some("left".to_string()),
                click_count: Some(1),
            };

            let _ = self
                .call_method("Input.dispatchMouseEvent", serde_json::to_value(params)?)
                .await?;
        }

        Ok(())
    }

    /// Dispatch a key press
    async fn press_key(&self, key: &str) -> Result<(), Error> {
        debug!("Pressing key {:?}", key);

        let resolved = keys::resolve(key)
            .ok_or_else(|| Error::configuration(format!("Unknown key: {:?}", key)))?;

        let down = KeyEventParams {
            r#type: if resolved.text.is_some() {
                "keyDown".to_string()
            } else {
                "rawKeyDown".to_string()
            },
            key: Some(resolved.key.clone()),
            code: Some(resolved.code.clone()),
            windows_virtual_key_code: Some(resolved.windows_virtual_key_code),
            text: resolved.text.clone(),
        };
        let _ = self
            .call_method("Input.dispatchKeyEvent", serde_json::to_value(down)?)
            .await?;

        let up = KeyEventParams {
            r#type: "keyUp".to_string(),
            key: Some(resolved.key),
            code: Some(resolved.code),
            windows_virtual_key_code: Some(resolved.windows_virtual_key_code),
            text: None,
        };
        let _ = self
            .call_method("Input.dispatchKeyEvent", serde_json::to_value(up)?)
            .await?;

        Ok(())
    }

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        debug!("Enabling domain: {}", domain);

        let method = format!("{}.enable", domain);
        let _ = self.call_method(&method, serde_json::json!({})).await?;

        Ok(())
    }

    /// Call a raw CDP method
    async fn call_method(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let response = self.connection().send_command(method, params).await?;

        response
            .result
            .ok_or_else(|| Error::cdp("No result in response"))
    }
}
