// ABOUTME: Configuration options for the scraper client and the fluent ClientBuilder.
// ABOUTME: Options are built once at process entry (optionally from SIBYL_* env vars) and passed in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::error::ScrapeError;
use crate::render::discovery::locate_engine;
use crate::render::RenderEngine;

/// Substring that only genuine statement pages contain.
pub const DEFAULT_MARKER: &str = "problem-statement";

/// Configuration options for the scraper client.
#[derive(Debug, Clone)]
pub struct Options {
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    /// Bound for the plain HTTP attempt.
    pub direct_timeout: Duration,
    /// Bound for a single browser navigation.
    pub navigation_timeout: Duration,
    /// How long to wait for the rendered page to settle after navigation.
    pub settle_timeout: Duration,
    /// Wall-clock bound for the whole rendered attempt, launch and teardown included.
    pub render_timeout: Duration,
    pub marker: String,
    /// Located engine executable; `None` disables the rendered fallback.
    pub engine_path: Option<PathBuf>,
    pub http_client: Option<reqwest::Client>,
    /// Injected engine, takes precedence over `engine_path`.
    pub render_engine: Option<Arc<dyn RenderEngine>>,
}

impl Default for Options {
    fn default() -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());

        Self {
            user_agent: "Mozilla/5.0".to_string(),
            headers,
            direct_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(60),
            settle_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(90),
            marker: DEFAULT_MARKER.to_string(),
            engine_path: None,
            http_client: None,
            render_engine: None,
        }
    }
}

fn secs_var<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(Duration::from_secs_f64)
}

impl Options {
    /// Build options from the process environment and probe for a rendering engine.
    ///
    /// Call once at process entry.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok(), locate_engine)
    }

    /// Build options from an arbitrary variable lookup.
    ///
    /// Recognized keys: `SIBYL_USER_AGENT`, `SIBYL_MARKER`,
    /// `SIBYL_DIRECT_TIMEOUT_SECS`, `SIBYL_NAVIGATION_TIMEOUT_SECS`,
    /// `SIBYL_SETTLE_TIMEOUT_SECS`, `SIBYL_RENDER_TIMEOUT_SECS`, and the engine
    /// override `SIBYL_CHROME_PATH` (or `CHROME_EXECUTABLE_PATH`).
    /// `locate` receives the override and returns the engine to use.
    pub fn from_lookup<F, L>(lookup: F, locate: L) -> Self
    where
        F: Fn(&str) -> Option<String>,
        L: FnOnce(Option<&Path>) -> Option<PathBuf>,
    {
        let mut opts = Options::default();

        if let Some(ua) = lookup("SIBYL_USER_AGENT").filter(|s| !s.trim().is_empty()) {
            opts.user_agent = ua;
        }
        if let Some(marker) = lookup("SIBYL_MARKER").filter(|s| !s.is_empty()) {
            opts.marker = marker;
        }
        if let Some(d) = secs_var(&lookup, "SIBYL_DIRECT_TIMEOUT_SECS") {
            opts.direct_timeout = d;
        }
        if let Some(d) = secs_var(&lookup, "SIBYL_NAVIGATION_TIMEOUT_SECS") {
            opts.navigation_timeout = d;
        }
        if let Some(d) = secs_var(&lookup, "SIBYL_SETTLE_TIMEOUT_SECS") {
            opts.settle_timeout = d;
        }
        if let Some(d) = secs_var(&lookup, "SIBYL_RENDER_TIMEOUT_SECS") {
            opts.render_timeout = d;
        }

        let override_path = lookup("SIBYL_CHROME_PATH")
            .or_else(|| lookup("CHROME_EXECUTABLE_PATH"))
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        opts.engine_path = locate(override_path.as_deref());

        opts
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Start from existing options.
    pub fn from_options(opts: Options) -> Self {
        Self { opts }
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to direct requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Set the timeout of the plain HTTP attempt.
    pub fn direct_timeout(mut self, timeout: Duration) -> Self {
        self.opts.direct_timeout = timeout;
        self
    }

    /// Set the browser navigation timeout.
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.opts.navigation_timeout = timeout;
        self
    }

    /// Set the post-navigation settle timeout.
    pub fn settle_timeout(mut self, timeout: Duration) -> Self {
        self.opts.settle_timeout = timeout;
        self
    }

    /// Set the overall bound of the rendered attempt.
    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.opts.render_timeout = timeout;
        self
    }

    /// Set the marker substring a statement page must contain.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.opts.marker = marker.into();
        self
    }

    /// Use the engine executable at `path` for the rendered fallback.
    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.opts.engine_path = Some(path.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Use a custom render engine.
    pub fn render_engine(mut self, engine: Arc<dyn RenderEngine>) -> Self {
        self.opts.render_engine = Some(engine);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Result<Client, ScrapeError> {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
