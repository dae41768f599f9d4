//! Evidence capture
//!
//! Writes screenshots to caller-named paths. Capture is a checkpoint: it
//! waits only for the actionability of its scope target, never for page
//! state — callers wait for the state they want *before* capturing.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::query::ElementQuery;
use crate::engine::wait::Waiter;
use crate::session::traits::PageDriver;
use crate::Result;

/// Screenshot persistence under an artifact directory
#[derive(Debug, Clone)]
pub struct EvidenceCapture {
    artifact_dir: PathBuf,
}

impl EvidenceCapture {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Where a caller-named path lands on disk
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.artifact_dir.join(path)
        }
    }

    /// Capture a screenshot, full-page or clipped to `scope`.
    ///
    /// Same path overwrites: capturing twice leaves exactly one artifact.
    pub async fn capture(
        &self,
        driver: &dyn PageDriver,
        waiter: &Waiter,
        path: &str,
        scope: Option<&ElementQuery>,
        timeout: std::time::Duration,
    ) -> Result<PathBuf> {
        let target = self.resolve_path(path);
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let clip = match scope {
            Some(query) => {
                debug!("Scoping capture to {}", query);
                let found = waiter.wait_actionable(driver, query, timeout).await?;
                Some(found.snapshot.rect)
            }
            None => None,
        };

        let bytes = driver.screenshot(clip).await?;
        tokio::fs::write(&target, &bytes).await?;
        info!("Captured {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}
