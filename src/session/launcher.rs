//! Browser session launching
//!
//! Starts a Chrome process (or attaches to a running one), opens a fresh
//! page target and hands back a `Session` bound to that page. A session is
//! torn down exactly once; repeated closes are no-ops.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cdp::browser::CdpBrowserImpl;
use crate::cdp::traits::{CdpBrowser, PageTarget};
use crate::config::Config;
use crate::session::page::CdpPageDriver;
use crate::session::traits::PageDriver;
use crate::{Error, Result};

/// How long Chrome gets to expose its debugging endpoint
const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Poll interval while waiting for the endpoint
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A Chrome process this harness spawned
#[derive(Debug)]
pub struct ChromeProcess {
    child: Child,
    /// Profile directory; removed when the process handle drops
    #[allow(dead_code)]
    profile_dir: tempfile::TempDir,
    port: u16,
}

impl ChromeProcess {
    /// Debugging port the process listens on
    pub fn port(&self) -> u16 {
        self.port
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Killing Chrome failed: {}", e);
        }
    }
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        // Best-effort kill on drop
        let _ = self.child.start_kill();
    }
}

/// A live browser session bound to one page
#[derive(Debug)]
pub struct Session {
    id: String,
    driver: Arc<dyn PageDriver>,
    browser: Option<Arc<dyn CdpBrowser>>,
    target: Option<PageTarget>,
    chrome: Mutex<Option<ChromeProcess>>,
    closed: AtomicBool,
}

impl Session {
    /// Create a session over already-established parts
    pub fn new(
        driver: Arc<dyn PageDriver>,
        browser: Option<Arc<dyn CdpBrowser>>,
        target: Option<PageTarget>,
        chrome: Option<ChromeProcess>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            driver,
            browser,
            target,
            chrome: Mutex::new(chrome),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a session over a bare driver, with nothing else to tear down
    pub fn with_driver(driver: Arc<dyn PageDriver>) -> Self {
        Self::new(driver, None, None, None)
    }

    /// Session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The page driver this session runs against
    pub fn driver(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.driver)
    }

    /// Whether the session is still usable
    pub fn is_active(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.driver.is_active()
    }

    /// Tear the session down: page, target, then the browser process.
    ///
    /// Each part is released best-effort so a dead page cannot leak the
    /// Chrome process behind it. Calling this again is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Session {} already closed", self.id);
            return Ok(());
        }
        info!("Closing session {}", self.id);

        if let Err(e) = self.driver.close().await {
            warn!("Closing page driver failed: {}", e);
        }

        if let (Some(browser), Some(target)) = (&self.browser, &self.target) {
            if let Err(e) = browser.close_page(&target.target_id).await {
                warn!("Closing page target {} failed: {}", target.target_id, e);
            }
        }

        if let Some(mut chrome) = self.chrome.lock().await.take() {
            debug!("Killing Chrome on port {}", chrome.port());
            chrome.kill().await;
        }

        Ok(())
    }
}

/// Builds sessions from configuration
#[derive(Debug, Clone)]
pub struct SessionLauncher {
    config: Config,
}

impl SessionLauncher {
    /// Create a launcher for `config`
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start a session: attach to a configured endpoint, or spawn Chrome
    pub async fn launch(&self) -> Result<Session> {
        match &self.config.cdp_endpoint {
            Some(endpoint) => {
                info!("Attaching to browser at {}", endpoint);
                let browser: Arc<dyn CdpBrowser> = Arc::new(CdpBrowserImpl::new(endpoint.clone()));
                let version = browser.get_version().await?;
                debug!("Attached to {}", version.product);
                self.open_page(browser, None).await
            }
            None => {
                let chrome = self.spawn_chrome().await?;
                let endpoint = format!("http://127.0.0.1:{}", chrome.port());
                let browser: Arc<dyn CdpBrowser> = Arc::new(CdpBrowserImpl::new(endpoint));
                wait_for_endpoint(browser.as_ref(), STARTUP_TIMEOUT).await?;
                self.open_page(browser, Some(chrome)).await
            }
        }
    }

    async fn open_page(
        &self,
        browser: Arc<dyn CdpBrowser>,
        chrome: Option<ChromeProcess>,
    ) -> Result<Session> {
        let target = browser.create_page("about:blank").await?;
        let client = browser.create_client(&target).await?;
        let driver: Arc<dyn PageDriver> = Arc::new(CdpPageDriver::new(client));

        let session = Session::new(driver, Some(browser), Some(target), chrome);
        info!("Session {} started", session.id());
        Ok(session)
    }

    async fn spawn_chrome(&self) -> Result<ChromeProcess> {
        let port = free_port().await?;
        let profile_dir = tempfile::Builder::new()
            .prefix("veristep-profile-")
            .tempdir()?;
        let args = chrome_args(port, profile_dir.path(), self.config.headless);

        let candidates = self.chrome_candidates();
        for candidate in &candidates {
            debug!("Trying Chrome binary {:?}", candidate);
            match Command::new(candidate)
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
            {
                Ok(child) => {
                    info!(
                        "Launched {} on port {} (headless: {})",
                        candidate, port, self.config.headless
                    );
                    return Ok(ChromeProcess {
                        child,
                        profile_dir,
                        port,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::startup(format!(
                        "Failed to launch {}: {}",
                        candidate, e
                    )))
                }
            }
        }

        Err(Error::startup(format!(
            "No Chrome binary found (tried {}). Set chrome_path or VERISTEP_CHROME_PATH, \
             or point cdp_endpoint at a browser started with --remote-debugging-port",
            candidates.join(", ")
        )))
    }

    fn chrome_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.config.chrome_path {
            candidates.push(path.clone());
        }

        let defaults: &[&str] = if cfg!(target_os = "macos") {
            &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ]
        } else if cfg!(target_os = "windows") {
            &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ]
        } else {
            &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
            ]
        };
        candidates.extend(defaults.iter().map(|s| s.to_string()));
        candidates
    }
}

fn chrome_args(port: u16, profile_dir: &std::path::Path, headless: bool) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-extensions".to_string(),
        "--disable-sync".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }
    args.push("--window-size=1280,720".to_string());
    args.push("about:blank".to_string());
    args
}

/// Bind to an ephemeral port to find a free one for Chrome
async fn free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::startup(format!("No free port for Chrome: {}", e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::startup(format!("No free port for Chrome: {}", e)))?
        .port();
    Ok(port)
}

/// Poll the version endpoint until the browser answers
async fn wait_for_endpoint(browser: &dyn CdpBrowser, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut last_error = None;

    loop {
        match browser.get_version().await {
            Ok(version) => {
                debug!("Browser ready: {}", version.product);
                return Ok(());
            }
            Err(e) => last_error = Some(e),
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(Error::startup(format!(
                "Chrome did not expose its debugging endpoint within {:?}: {}",
                timeout,
                last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no response".to_string())
            )));
        }

        tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
    }
}
