//! Shared browser session.
//!
//! One [`BrowserSession`] is shared by every scrape-mode acquisition job.
//! It owns zero-or-one underlying browser (connected to an externally
//! running instance over the DevTools protocol, or self-launched) and one
//! page per platform. Page access is serialized per platform; different
//! platforms' pages may be driven concurrently against the same browser.
//!
//! Disconnects are handled by a supervised recovery state machine:
//! `Connected → Disconnected → Reconnecting → Connected | Failed`, with a
//! single re-acquire attempt after a fixed backoff rather than an
//! unbounded retry loop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::Handler;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use subatime_core::PlatformKind;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::error::{BrowserError, FetchError};

/// Backoff before the single automatic re-acquire attempt.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// How often the locator wait re-checks the page.
const LOCATOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default DevTools debugging port for connect mode.
const DEFAULT_DEBUG_PORT: u16 = 9222;

// ============================================================================
// Settings
// ============================================================================

/// How the session obtains its underlying browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Attach to an externally running browser over its debugging port.
    #[default]
    Connect,
    /// Launch a dedicated browser process.
    Launch,
}

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Connect to an existing browser or launch our own.
    #[serde(default)]
    pub connection_mode: ConnectionMode,
    /// DevTools debugging port used in connect mode.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,
    /// Explicit browser executable; discovered on `PATH` when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Profile directory to launch with; an isolated profile when unset.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
    /// Whether connect mode may fall back to launching a browser.
    #[serde(default = "default_true")]
    pub fall_back_to_launch: bool,
    /// Relaunch the browser normally after closing a self-launched one.
    #[serde(default = "default_true")]
    pub reopen_on_exit: bool,
    /// Launch headless. Scrape targets behind logins usually need a head.
    #[serde(default)]
    pub headless: bool,
}

fn default_debug_port() -> u16 {
    DEFAULT_DEBUG_PORT
}

fn default_true() -> bool {
    true
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            connection_mode: ConnectionMode::Connect,
            debug_port: DEFAULT_DEBUG_PORT,
            executable: None,
            user_data_dir: None,
            fall_back_to_launch: true,
            reopen_on_exit: true,
            headless: false,
        }
    }
}

// ============================================================================
// Connection State
// ============================================================================

/// Recovery state machine for the browser connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session has been acquired, or the session was torn down.
    #[default]
    Disconnected,
    /// A live browser is attached.
    Connected,
    /// The automatic re-acquire attempt is in flight.
    Reconnecting,
    /// The re-acquire attempt failed; manual re-acquire required.
    Failed,
}

// ============================================================================
// Browser Session
// ============================================================================

/// Response from the DevTools `/json/version` endpoint.
#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

struct BrowserHandle {
    browser: Browser,
    /// True when we launched the process (teardown closes it); false when
    /// we attached to an external browser (teardown only disconnects).
    owned: bool,
}

struct SessionInner {
    settings: BrowserSettings,
    browser: Mutex<Option<BrowserHandle>>,
    pages: Mutex<HashMap<PlatformKind, Arc<Mutex<Option<Page>>>>>,
    state_tx: watch::Sender<ConnectionState>,
    shutting_down: AtomicBool,
    http: reqwest::Client,
}

/// Shared handle to the browser session. Cheap to clone.
#[derive(Clone)]
pub struct BrowserSession {
    inner: Arc<SessionInner>,
}

impl BrowserSession {
    /// Creates a session with the given settings. No browser is attached
    /// until [`BrowserSession::acquire`] succeeds.
    pub fn new(settings: BrowserSettings) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(SessionInner {
                settings,
                browser: Mutex::new(None),
                pages: Mutex::new(HashMap::new()),
                state_tx,
                shutting_down: AtomicBool::new(false),
                http: reqwest::Client::new(),
            }),
        }
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribes to connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Returns true if a live browser is attached.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    // ========================================================================
    // Acquire / Recover
    // ========================================================================

    /// Acquires a browser: an externally running one first in connect mode,
    /// then a self-launched process, retrying once with an isolated profile
    /// if the configured one is locked.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<(), BrowserError> {
        if self.inner.browser.lock().await.is_some() {
            debug!("Browser session already acquired");
            return Ok(());
        }

        let (browser, handler, owned) = match self.inner.settings.connection_mode {
            ConnectionMode::Connect => match self.connect_existing().await {
                Ok((browser, handler)) => (browser, handler, false),
                Err(err) if self.inner.settings.fall_back_to_launch => {
                    info!(error = %err, "No externally running browser, launching one");
                    let (browser, handler) = self.launch().await?;
                    (browser, handler, true)
                }
                Err(err) => return Err(err),
            },
            ConnectionMode::Launch => {
                let (browser, handler) = self.launch().await?;
                (browser, handler, true)
            }
        };

        self.spawn_handler(handler);
        *self.inner.browser.lock().await = Some(BrowserHandle { browser, owned });
        let _ = self.inner.state_tx.send(ConnectionState::Connected);
        info!(owned, "Browser session acquired");
        Ok(())
    }

    /// Attaches to a browser already running with remote debugging enabled.
    async fn connect_existing(&self) -> Result<(Browser, Handler), BrowserError> {
        let port = self.inner.settings.debug_port;
        let version_url = format!("http://127.0.0.1:{port}/json/version");
        debug!(port, "Probing for externally running browser");

        let info: VersionInfo = self
            .inner
            .http
            .get(&version_url)
            .timeout(Duration::from_secs(3))
            .send()
            .await
            .map_err(|e| BrowserError::ConnectFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| BrowserError::ConnectFailed(e.to_string()))?;

        Browser::connect(info.web_socket_debugger_url)
            .await
            .map_err(|e| BrowserError::ConnectFailed(e.to_string()))
    }

    /// Launches a browser, retrying once with an isolated profile when the
    /// configured profile appears to be locked by another instance.
    async fn launch(&self) -> Result<(Browser, Handler), BrowserError> {
        match self.launch_with_profile(false).await {
            Ok(pair) => Ok(pair),
            Err(err) if self.inner.settings.user_data_dir.is_some() && is_profile_lock(&err) => {
                warn!(error = %err, "Profile appears locked, retrying with isolated profile");
                self.launch_with_profile(true).await
            }
            Err(err) => Err(err),
        }
    }

    async fn launch_with_profile(&self, isolated: bool) -> Result<(Browser, Handler), BrowserError> {
        let executable = self.resolve_executable()?;
        let data_dir = if isolated {
            isolated_profile_dir()
        } else {
            self.inner
                .settings
                .user_data_dir
                .clone()
                .unwrap_or_else(isolated_profile_dir)
        };

        debug!(executable = %executable.display(), profile = %data_dir.display(), "Launching browser");

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&executable)
            .user_data_dir(&data_dir)
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if self.inner.settings.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(BrowserError::LaunchFailed)?;

        Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))
    }

    /// Resolves the browser executable: configured path first, then `PATH`.
    fn resolve_executable(&self) -> Result<PathBuf, BrowserError> {
        if let Some(path) = &self.inner.settings.executable {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(BrowserError::LaunchFailed(format!(
                "configured executable not found: {}",
                path.display()
            )));
        }

        for name in [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "msedge",
            "microsoft-edge",
        ] {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        Err(BrowserError::ExecutableNotFound)
    }

    /// Drives the CDP event stream; its end means the browser went away.
    fn spawn_handler(&self, mut handler: Handler) {
        let session = self.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
            session.handle_disconnect().await;
        });
    }

    /// Schedules the single automatic re-acquire attempt.
    async fn handle_disconnect(&self) {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            return;
        }

        warn!("Browser connection lost");
        self.inner.browser.lock().await.take();
        self.inner.pages.lock().await.clear();
        let _ = self.inner.state_tx.send(ConnectionState::Disconnected);

        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RECONNECT_BACKOFF).await;
            if session.inner.shutting_down.load(Ordering::SeqCst) {
                return;
            }
            let _ = session.inner.state_tx.send(ConnectionState::Reconnecting);
            if let Err(err) = session.acquire().await {
                warn!(error = %err, "Browser recovery failed");
                let _ = session.inner.state_tx.send(ConnectionState::Failed);
            }
        });
    }

    // ========================================================================
    // Locator Reads
    // ========================================================================

    /// Reads the numeric value at `locator` on the platform's page.
    ///
    /// Ensures a live page exists (creating one if absent or broken),
    /// reloads it, waits for the locator, and strips non-digit characters
    /// from the element text (empty or unparseable text reads as 0).
    ///
    /// A locator beginning with `/` is evaluated as a path expression
    /// (first ordered match); anything else as a CSS selector.
    #[instrument(skip(self, url, locator), fields(platform = %platform.key()))]
    pub async fn read_locator(
        &self,
        platform: PlatformKind,
        url: &str,
        locator: &str,
        timeout: Duration,
    ) -> Result<u64, FetchError> {
        let slot = self.page_slot(platform).await;
        let mut page_guard = slot.lock().await;

        if page_guard.is_none() {
            debug!("Creating page");
            *page_guard = Some(self.open_page(url).await?);
        } else if let Some(page) = page_guard.as_ref() {
            // Re-navigate so the count is fresh on every tick.
            if let Err(err) = page.goto(url).await {
                // Broken pages are recreated, not reused: drop the handle so
                // the next read starts from a fresh page.
                *page_guard = None;
                return Err(FetchError::PageUnavailable(err.to_string()));
            }
            let _ = page.wait_for_navigation().await;
        }

        let page = page_guard
            .as_ref()
            .ok_or_else(|| FetchError::PageUnavailable("page slot empty".to_string()))?;

        match self.wait_for_count(page, locator, timeout).await {
            Ok(count) => {
                debug!(count, "Locator read");
                Ok(count)
            }
            Err(err) => {
                if matches!(err, FetchError::PageUnavailable(_)) {
                    *page_guard = None;
                }
                Err(err)
            }
        }
    }

    /// One-shot locator read against a throwaway page.
    ///
    /// Used by diagnostics so a probe never touches a platform's live page.
    pub async fn read_locator_once(
        &self,
        url: &str,
        locator: &str,
        timeout: Duration,
    ) -> Result<u64, FetchError> {
        let page = self.open_page(url).await?;
        let result = self.wait_for_count(&page, locator, timeout).await;
        if let Err(err) = page.close().await {
            debug!(error = %err, "Failed to close probe page");
        }
        result
    }

    async fn page_slot(&self, platform: PlatformKind) -> Arc<Mutex<Option<Page>>> {
        let mut pages = self.inner.pages.lock().await;
        pages
            .entry(platform)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    async fn open_page(&self, url: &str) -> Result<Page, FetchError> {
        let guard = self.inner.browser.lock().await;
        let handle = guard
            .as_ref()
            .ok_or_else(|| BrowserError::Unavailable("no browser session acquired".to_string()))?;

        let page = handle
            .browser
            .new_page(url)
            .await
            .map_err(|e| FetchError::PageUnavailable(e.to_string()))?;
        let _ = page.wait_for_navigation().await;
        Ok(page)
    }

    async fn wait_for_count(
        &self,
        page: &Page,
        locator: &str,
        timeout: Duration,
    ) -> Result<u64, FetchError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(text) = self.extract_text(page, locator).await? {
                return Ok(parse_count(&text));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(FetchError::ElementNotFound {
                    locator: locator.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(LOCATOR_POLL_INTERVAL).await;
        }
    }

    /// Returns the element text, or `None` while the locator has no match.
    async fn extract_text(&self, page: &Page, locator: &str) -> Result<Option<String>, FetchError> {
        if locator.starts_with('/') {
            let script = xpath_script(locator)?;
            let value = page
                .evaluate(script)
                .await
                .map_err(|e| FetchError::PageUnavailable(e.to_string()))?;
            Ok(value.into_value::<Option<String>>().ok().flatten())
        } else {
            match page.find_element(locator).await {
                Ok(element) => {
                    let text = element
                        .inner_text()
                        .await
                        .map_err(|e| FetchError::PageUnavailable(e.to_string()))?;
                    Ok(Some(text.unwrap_or_default()))
                }
                // No match yet; the caller keeps waiting until its deadline.
                Err(_) => Ok(None),
            }
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Closes the page for one platform, if it exists.
    pub async fn close_page(&self, platform: PlatformKind) {
        let slot = { self.inner.pages.lock().await.remove(&platform) };
        if let Some(slot) = slot {
            let mut guard = slot.lock().await;
            if let Some(page) = guard.take() {
                if let Err(err) = page.close().await {
                    debug!(platform = %platform.key(), error = %err, "Failed to close page");
                }
            }
        }
    }

    /// Closes every platform page.
    pub async fn close_all_pages(&self) {
        let slots: Vec<_> = { self.inner.pages.lock().await.drain().collect() };
        for (platform, slot) in slots {
            let mut guard = slot.lock().await;
            if let Some(page) = guard.take() {
                if let Err(err) = page.close().await {
                    debug!(platform = %platform.key(), error = %err, "Failed to close page");
                }
            }
        }
    }

    /// Tears the session down.
    ///
    /// A self-launched browser is closed (and optionally relaunched in
    /// normal mode); an externally owned browser is only disconnected.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        self.close_all_pages().await;

        let handle = self.inner.browser.lock().await.take();
        if let Some(mut handle) = handle {
            if handle.owned {
                if let Err(err) = handle.browser.close().await {
                    warn!(error = %err, "Failed to close browser");
                }
                let _ = handle.browser.wait().await;
                if self.inner.settings.reopen_on_exit {
                    self.reopen_normal();
                }
            }
            // Externally owned: dropping the handle disconnects without
            // killing the user's browser.
        }

        let _ = self.inner.state_tx.send(ConnectionState::Disconnected);
        info!("Browser session closed");
    }

    /// Relaunches the browser without automation flags after we closed it.
    fn reopen_normal(&self) {
        let Ok(executable) = self.resolve_executable() else {
            return;
        };
        info!(executable = %executable.display(), "Reopening browser in normal mode");
        let _ = std::process::Command::new(executable)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extracts the digits from element text; empty or digitless text reads 0.
pub fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn is_profile_lock(err: &BrowserError) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("profile") || msg.contains("locked") || msg.contains("already running")
}

fn isolated_profile_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subatime")
        .join("browser-profile")
}

/// Builds the page-side script for a `/`-prefixed path locator.
fn xpath_script(locator: &str) -> Result<String, FetchError> {
    let quoted = serde_json::to_string(locator)?;
    Ok(format!(
        "(() => {{ \
           const r = document.evaluate({quoted}, document, null, \
             XPathResult.FIRST_ORDERED_NODE_TYPE, null); \
           const n = r.singleNodeValue; \
           return n ? n.textContent : null; \
         }})()"
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12,345 followers"), 12_345);
        assert_eq!(parse_count("1.2K"), 12); // digits only, no unit expansion
        assert_eq!(parse_count("no digits"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn test_xpath_script_quotes_locator() {
        let script = xpath_script("//span[@id=\"count\"]").unwrap();
        assert!(script.contains("\\\"count\\\""));
        assert!(script.contains("FIRST_ORDERED_NODE_TYPE"));
    }

    #[test]
    fn test_profile_lock_detection() {
        assert!(is_profile_lock(&BrowserError::LaunchFailed(
            "user data directory is already in use, profile locked".to_string()
        )));
        assert!(!is_profile_lock(&BrowserError::LaunchFailed(
            "no usable sandbox".to_string()
        )));
    }

    #[test]
    fn test_settings_defaults() {
        let settings: BrowserSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.connection_mode, ConnectionMode::Connect);
        assert_eq!(settings.debug_port, DEFAULT_DEBUG_PORT);
        assert!(settings.fall_back_to_launch);
        assert!(!settings.headless);
    }

    #[test]
    fn test_initial_state() {
        let session = BrowserSession::new(BrowserSettings::default());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    #[ignore] // Requires a Chrome/Chromium binary on PATH
    async fn test_read_locator_live() {
        let session = BrowserSession::new(BrowserSettings {
            connection_mode: ConnectionMode::Launch,
            headless: true,
            reopen_on_exit: false,
            ..BrowserSettings::default()
        });
        session.acquire().await.expect("failed to launch browser");

        let count = session
            .read_locator(
                PlatformKind::TikTok,
                "data:text/html,<span id=\"followers\">12,345 followers</span>",
                "#followers",
                Duration::from_secs(5),
            )
            .await
            .expect("read_locator failed");
        assert_eq!(count, 12_345);

        session.shutdown().await;
    }
}
