//! CDP-backed page driver
//!
//! Implements the driver abstraction over a live CDP client. Element
//! operations evaluate self-contained scripts that re-run the query, then
//! dispatch real input events at the located element.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cdp::traits::{CdpClient, EvaluationResult, ScreenshotFormat};
use crate::cdp::types::Clip;
use crate::engine::query::ElementQuery;
use crate::session::js::ScriptBuilder;
use crate::session::traits::{ElementSnapshot, PageDriver, Rect};
use crate::Error;

/// Page driver over a CDP client
#[derive(Debug)]
pub struct CdpPageDriver {
    id: String,
    cdp_client: Arc<dyn CdpClient>,
    active: AtomicBool,
}

impl CdpPageDriver {
    /// Create a driver bound to one page's CDP client
    pub fn new(cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cdp_client,
            active: AtomicBool::new(true),
        }
    }

    /// Driver ID
    pub fn id(&self) -> &str {
        &self.id
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::session_closed(format!("page {} is closed", self.id)))
        }
    }

    /// Interpret the object an element-action script returns
    fn check_action_result(result: EvaluationResult) -> Result<serde_json::Value, Error> {
        match result {
            EvaluationResult::Object(obj) => {
                if let Some(message) = obj.get("error").and_then(|v| v.as_str()) {
                    Err(Error::element_not_found(message))
                } else {
                    Ok(obj)
                }
            }
            other => Err(Error::internal(format!(
                "element action returned {:?} instead of an object",
                other
            ))),
        }
    }
}

#[async_trait]
impl PageDriver for CdpPageDriver {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), Error> {
        self.ensure_active()?;
        self.cdp_client.navigate(url, timeout).await?;
        Ok(())
    }

    async fn find_all(&self, query: &ElementQuery) -> Result<Vec<ElementSnapshot>, Error> {
        self.ensure_active()?;

        let script = ScriptBuilder::new(query).find_all_script();
        match self.cdp_client.evaluate(&script, false).await? {
            EvaluationResult::Object(value) => {
                let snapshots: Vec<ElementSnapshot> = serde_json::from_value(value)
                    .map_err(|e| Error::internal(format!("bad query result shape: {}", e)))?;
                Ok(snapshots)
            }
            other => Err(Error::internal(format!(
                "element query returned {:?} instead of an array",
                other
            ))),
        }
    }

    async fn click(&self, query: &ElementQuery, index: usize) -> Result<(), Error> {
        self.ensure_active()?;

        let script = ScriptBuilder::new(query).click_point_script(index);
        let result = self.cdp_client.evaluate(&script, false).await?;
        let point = Self::check_action_result(result)?;

        let x = point.get("x").and_then(|v| v.as_f64());
        let y = point.get("y").and_then(|v| v.as_f64());
        match (x, y) {
            (Some(x), Some(y)) => self.cdp_client.click_at(x, y).await,
            _ => Err(Error::internal("click target script returned no point")),
        }
    }

    async fn focus(&self, query: &ElementQuery, index: usize) -> Result<(), Error> {
        self.ensure_active()?;

        let script = ScriptBuilder::new(query).focus_script(index);
        let result = self.cdp_client.evaluate(&script, false).await?;
        Self::check_action_result(result)?;
        Ok(())
    }

    async fn fill(&self, query: &ElementQuery, index: usize, text: &str) -> Result<(), Error> {
        self.ensure_active()?;

        // Focus and select first; the insertion then replaces the selection
        // through the editing pipeline, so maxlength and input events apply
        let script = ScriptBuilder::new(query).prepare_fill_script(index);
        let result = self.cdp_client.evaluate(&script, false).await?;
        Self::check_action_result(result)?;

        self.cdp_client.insert_text(text).await
    }

    async fn press_key(&self, key: &str) -> Result<(), Error> {
        self.ensure_active()?;
        self.cdp_client.press_key(key).await
    }

    async fn evaluate(
        &self,
        script: &str,
        await_promise: bool,
    ) -> Result<EvaluationResult, Error> {
        self.ensure_active()?;
        self.cdp_client.evaluate(script, await_promise).await
    }

    async fn screenshot(&self, clip: Option<Rect>) -> Result<Vec<u8>, Error> {
        self.ensure_active()?;

        let clip = clip.map(|rect| Clip {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            scale: None,
        });
        self.cdp_client.screenshot(ScreenshotFormat::Png, clip).await
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.active.swap(false, Ordering::SeqCst) {
            tracing::debug!("Page {} already closed", self.id);
            return Ok(());
        }

        tracing::debug!("Closing page {}", self.id);
        if let Err(e) = self.cdp_client.connection().close().await {
            tracing::warn!("Closing connection for page {} failed: {}", self.id, e);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && self.cdp_client.connection().is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::mock::MockCdpClient;

    fn snapshot_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "tag": "button",
            "role": "button",
            "name": name,
            "text": name,
            "value": null,
            "visible": true,
            "disabled": false,
            "attributes": {"aria-pressed": "false"},
            "rect": {"x": 10.0, "y": 20.0, "width": 80.0, "height": 30.0},
        })
    }

    #[tokio::test]
    async fn test_find_all_parses_snapshots() {
        let client = Arc::new(MockCdpClient::new());
        client
            .enqueue_eval(EvaluationResult::Object(serde_json::json!([
                snapshot_json("Feed Dogs"),
                snapshot_json("Feed Cats"),
            ])))
            .await;

        let driver = CdpPageDriver::new(client);
        let matches = driver
            .find_all(&ElementQuery::role("button"))
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name.as_deref(), Some("Feed Dogs"));
        assert_eq!(matches[0].attribute("aria-pressed"), Some("false"));
        assert_eq!(matches[1].rect.center(), (50.0, 35.0));
    }

    #[tokio::test]
    async fn test_find_all_rejects_non_array() {
        let client = Arc::new(MockCdpClient::new());
        client
            .enqueue_eval(EvaluationResult::String("oops".to_string()))
            .await;

        let driver = CdpPageDriver::new(client);
        let err = driver
            .find_all(&ElementQuery::role("button"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_click_dispatches_at_returned_center() {
        let client = Arc::new(MockCdpClient::new());
        client
            .enqueue_eval(EvaluationResult::Object(serde_json::json!({
                "ok": true, "x": 50.0, "y": 35.0,
            })))
            .await;

        let driver = CdpPageDriver::new(client.clone());
        driver
            .click(&ElementQuery::text("Feed Dogs"), 0)
            .await
            .unwrap();

        assert_eq!(client.clicks().await, vec![(50.0, 35.0)]);
    }

    #[tokio::test]
    async fn test_click_surfaces_script_error() {
        let client = Arc::new(MockCdpClient::new());
        client
            .enqueue_eval(EvaluationResult::Object(serde_json::json!({
                "error": "index 2 out of range: 1 matches",
            })))
            .await;

        let driver = CdpPageDriver::new(client.clone());
        let err = driver
            .click(&ElementQuery::text("Feed Dogs"), 2)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ElementNotFound(_)));
        assert!(client.clicks().await.is_empty());
    }

    #[tokio::test]
    async fn test_fill_prepares_then_inserts() {
        let client = Arc::new(MockCdpClient::new());
        client
            .enqueue_eval(EvaluationResult::Object(serde_json::json!({"ok": true})))
            .await;

        let driver = CdpPageDriver::new(client.clone());
        driver
            .fill(&ElementQuery::role("textbox"), 0, "Milk")
            .await
            .unwrap();

        assert_eq!(client.inserted_text().await, vec!["Milk"]);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let client = Arc::new(MockCdpClient::new());
        let driver = CdpPageDriver::new(client);

        assert!(driver.is_active());
        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert!(!driver.is_active());

        let err = driver
            .find_all(&ElementQuery::role("button"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionClosed(_)));
    }
}
