// ABOUTME: Chromium-family render engine driven over the DevTools protocol via chromiumoxide.
// ABOUTME: Each session is a headless browser process with its own throwaway profile directory.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use futures::{Stream, StreamExt};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::render::{RenderBudget, RenderEngine, RenderSession};

/// Lifecycle event names that count as "network settled".
const IDLE_EVENTS: &[&str] = &["networkIdle", "networkAlmostIdle"];

/// Lifecycle event emitted when a new document commits in the frame.
const INIT_EVENT: &str = "init";

const PROFILE_REMOVE_ATTEMPTS: usize = 8;
const PROFILE_REMOVE_BACKOFF: Duration = Duration::from_millis(250);

/// Launches headless browser sessions from a located executable.
#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    executable: PathBuf,
    user_agent: String,
    launch_timeout: Duration,
}

impl ChromiumEngine {
    pub fn new(executable: PathBuf, user_agent: impl Into<String>) -> Self {
        Self {
            executable,
            user_agent: user_agent.into(),
            launch_timeout: Duration::from_secs(20),
        }
    }

    /// Bound for the browser process to come up.
    pub fn launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }
}

fn launch_error(err: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::render("", "Launch", Some(anyhow::anyhow!("{}", err)))
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, ScrapeError> {
        let profile = tempfile::Builder::new()
            .prefix("sibyl-render-")
            .tempdir()
            .map_err(launch_error)?;

        let config = BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .user_data_dir(profile.path())
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent))
            .launch_timeout(self.launch_timeout)
            .build()
            .map_err(launch_error)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(launch_error)?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "devtools handler event error");
                }
            }
        });

        debug!(executable = %self.executable.display(), "render session launched");
        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            events,
            profile: Some(profile),
        }))
    }
}

/// Wait until the document committed after subscription reports network idle.
///
/// Idle events seen before the first `init` belong to the previous document
/// and are skipped. Returns false if the stream ends first.
async fn wait_for_network_idle<S>(names: S) -> bool
where
    S: Stream<Item = String>,
{
    futures::pin_mut!(names);
    let mut committed = false;
    while let Some(name) = names.next().await {
        if name == INIT_EVENT {
            committed = true;
        } else if committed && IDLE_EVENTS.contains(&name.as_str()) {
            return true;
        }
    }
    false
}

/// Remove a profile directory, retrying while the browser still holds it.
async fn remove_profile(path: PathBuf) {
    for attempt in 1..=PROFILE_REMOVE_ATTEMPTS {
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => return,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
            Err(err) if attempt == PROFILE_REMOVE_ATTEMPTS => {
                warn!(path = %path.display(), error = %err, "could not remove render profile");
            }
            Err(_) => tokio::time::sleep(PROFILE_REMOVE_BACKOFF).await,
        }
    }
}

/// Hand the profile to a background cleanup so it outlives the killed process.
/// Without a runtime the directory is removed in place.
fn release_profile(profile: TempDir) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let path = profile.keep();
            handle.spawn(remove_profile(path));
        }
        Err(_) => drop(profile),
    }
}

/// A live headless browser. Dropping it kills the process.
struct ChromiumSession {
    browser: Option<Browser>,
    events: JoinHandle<()>,
    profile: Option<TempDir>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn render(&mut self, url: &str, budget: RenderBudget) -> Result<String, ScrapeError> {
        let browser = self.browser.as_ref().ok_or_else(|| {
            ScrapeError::render(url, "Render", Some(anyhow::anyhow!("browser already closed")))
        })?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::render(url, "NewPage", Some(anyhow::anyhow!("{}", e))))?;

        // Subscribe before navigating so the new document's events are buffered.
        let lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| ScrapeError::render(url, "Lifecycle", Some(anyhow::anyhow!("{}", e))))?;
        if let Err(err) = page.execute(SetLifecycleEventsEnabledParams::new(true)).await {
            debug!(url, error = %err, "lifecycle events already enabled or unavailable");
        }

        match tokio::time::timeout(budget.navigation, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ScrapeError::render(
                    url,
                    "Navigate",
                    Some(anyhow::anyhow!("{}", e)),
                ))
            }
            Err(_) => {
                return Err(ScrapeError::timeout(
                    url,
                    "Navigate",
                    Some(anyhow::anyhow!("navigation exceeded {:?}", budget.navigation)),
                ))
            }
        }

        let names = lifecycle.map(|event| event.name.clone());
        match tokio::time::timeout(budget.settle, wait_for_network_idle(names)).await {
            Ok(true) => debug!(url, "network settled"),
            Ok(false) | Err(_) => {
                debug!(url, settle = ?budget.settle, "network did not settle; reading document as is")
            }
        }

        page.content()
            .await
            .map_err(|e| ScrapeError::render(url, "Content", Some(anyhow::anyhow!("{}", e))))
    }

    async fn shutdown(self: Box<Self>) {
        let mut this = self;
        if let Some(mut browser) = this.browser.take() {
            if let Err(err) = browser.close().await {
                warn!(error = %err, "browser close failed");
            }
            if let Err(err) = browser.wait().await {
                warn!(error = %err, "browser wait failed");
            }
        }
        this.events.abort();
        // The process has exited, so the profile is free to go now.
        if let Some(profile) = this.profile.take() {
            if let Err(err) = profile.close() {
                warn!(error = %err, "could not remove render profile");
            }
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser's own drop starts killing the child process.
        self.browser.take();
        self.events.abort();
        if let Some(profile) = self.profile.take() {
            release_profile(profile);
        }
    }
}
