//! Action execution
//!
//! One method per step kind. Every element action is preceded by an implicit
//! actionability wait; navigation gets exactly one escalated retry. All
//! other failures abort the scenario without retrying.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cdp::traits::EvaluationResult;
use crate::config::Config;
use crate::engine::query::ElementQuery;
use crate::engine::wait::Waiter;
use crate::session::js::apply_script;
use crate::session::traits::PageDriver;
use crate::{Error, Result};

/// Executes user-facing actions against one page
#[derive(Debug)]
pub struct ActionExecutor {
    driver: Arc<dyn PageDriver>,
    config: Config,
    waiter: Waiter,
}

impl ActionExecutor {
    pub fn new(driver: Arc<dyn PageDriver>, config: Config) -> Self {
        Self {
            driver,
            config,
            waiter: Waiter::new(),
        }
    }

    /// Replace the wait engine, for tests that tune the poll interval
    pub fn with_waiter(mut self, waiter: Waiter) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    fn default_timeout(&self) -> Duration {
        self.config.wait_timeout(None)
    }

    /// Resolve a scenario URL against the configured base URL
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("about:") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    /// Navigate, retrying exactly once with an escalated timeout.
    ///
    /// The retry bound comes from `navigation_retry_timeout_ms` when
    /// configured, otherwise it is double the failing attempt's bound. A
    /// second failure is fatal; there is no third attempt.
    #[instrument(skip(self))]
    pub async fn navigate(&self, url: &str, timeout_ms: Option<u64>) -> Result<()> {
        let url = self.resolve_url(url);
        let timeout = self.config.wait_timeout(timeout_ms);

        match self.driver.navigate(&url, timeout).await {
            Ok(()) => {
                debug!("Navigated to {}", url);
                Ok(())
            }
            Err(first) => {
                let escalated = self.config.retry_timeout(timeout);
                warn!(
                    "Navigation to {} failed ({}); retrying once with {}ms",
                    url,
                    first,
                    escalated.as_millis()
                );
                self.driver
                    .navigate(&url, escalated)
                    .await
                    .map_err(|second| {
                        Error::navigation_failed(format!(
                            "{} failed after one escalated retry: \
                             first attempt ({}ms): {}; retry ({}ms): {}",
                            url,
                            timeout.as_millis(),
                            first,
                            escalated.as_millis(),
                            second
                        ))
                    })
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn click(&self, query: &ElementQuery) -> Result<()> {
        let found = self
            .waiter
            .wait_actionable(self.driver.as_ref(), query, self.default_timeout())
            .await?;
        self.driver.click(query, found.index).await
    }

    /// Fill a field through the editing pipeline.
    ///
    /// The harness never truncates; an application-enforced length cap shows
    /// up in the value a later read observes.
    #[instrument(skip(self, text))]
    pub async fn fill(&self, query: &ElementQuery, text: &str) -> Result<()> {
        let found = self
            .waiter
            .wait_actionable(self.driver.as_ref(), query, self.default_timeout())
            .await?;
        self.driver.fill(query, found.index, text).await
    }

    #[instrument(skip(self))]
    pub async fn focus(&self, query: &ElementQuery) -> Result<()> {
        let found = self
            .waiter
            .wait_actionable(self.driver.as_ref(), query, self.default_timeout())
            .await?;
        self.driver.focus(query, found.index).await
    }

    /// Dispatch a key press to whatever currently has focus
    #[instrument(skip(self))]
    pub async fn press_key(&self, key: &str) -> Result<()> {
        self.driver.press_key(key).await
    }

    /// Evaluate a script in the page context.
    ///
    /// With arguments the script must be a function expression; it is
    /// applied to the JSON-serialized arguments. This is the privileged
    /// state-seeding channel.
    #[instrument(skip(self, script, args))]
    pub async fn evaluate(
        &self,
        script: &str,
        args: &[serde_json::Value],
    ) -> Result<EvaluationResult> {
        let script = apply_script(script, args)?;
        self.driver.evaluate(&script, true).await
    }

    /// Observed attribute value, after an actionability wait
    #[instrument(skip(self))]
    pub async fn read_attribute(
        &self,
        query: &ElementQuery,
        name: &str,
    ) -> Result<Option<String>> {
        let found = self
            .waiter
            .wait_actionable(self.driver.as_ref(), query, self.default_timeout())
            .await?;
        Ok(found.snapshot.attribute(name).map(String::from))
    }

    /// Observed input value, after an actionability wait
    #[instrument(skip(self))]
    pub async fn read_value(&self, query: &ElementQuery) -> Result<Option<String>> {
        let found = self
            .waiter
            .wait_actionable(self.driver.as_ref(), query, self.default_timeout())
            .await?;
        Ok(found.snapshot.value)
    }

    /// Plain bounded suspension. Condition waits are preferred; this exists
    /// for scenario compatibility.
    pub async fn sleep(&self, duration_ms: u64) {
        debug!(
            "Sleeping {}ms; a condition wait is usually the better step",
            duration_ms
        );
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
    }
}
