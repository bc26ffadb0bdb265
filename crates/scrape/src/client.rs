// ABOUTME: The scraper Client: a direct HTTP attempt with a rendered-browser fallback.
// ABOUTME: Provides fetch() for the tagged outcome and scrape()/parse_html() for ProblemDetails.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::extractors::statement::parse_statement;
use crate::options::{ClientBuilder, Options};
use crate::render::chromium::ChromiumEngine;
use crate::render::{RenderBudget, RenderEngine, SessionScope};
use crate::resource::{fetch, validate_url, FetchOptions};
use crate::result::ProblemDetails;

/// Which attempt produced the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    Direct,
    Rendered,
}

/// Result of running the fetch strategy for one locator.
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        html: String,
        path: FetchPath,
    },
    /// Neither attempt produced a statement page. `rendered` is `None` when
    /// the fallback was not attempted at all.
    Failure {
        direct: ScrapeError,
        rendered: Option<ScrapeError>,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success { html, .. } => Some(html),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn path(&self) -> Option<FetchPath> {
        match self {
            FetchOutcome::Success { path, .. } => Some(*path),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn into_html(self) -> Option<String> {
        match self {
            FetchOutcome::Success { html, .. } => Some(html),
            FetchOutcome::Failure { .. } => None,
        }
    }
}

/// The main client for fetching and parsing problem statement pages.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    engine: Option<Arc<dyn RenderEngine>>,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    ///
    /// An injected render engine wins over `engine_path`; with neither, the
    /// rendered fallback is disabled.
    pub fn new(opts: Options) -> Result<Self, ScrapeError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    ScrapeError::fetch(
                        "",
                        "BuildClient",
                        Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                    )
                })?,
        };

        let engine = opts.render_engine.clone().or_else(|| {
            opts.engine_path.clone().map(|path| {
                Arc::new(ChromiumEngine::new(path, opts.user_agent.clone())) as Arc<dyn RenderEngine>
            })
        });

        Ok(Self {
            opts,
            http_client,
            engine,
        })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Whether the rendered fallback can run.
    pub fn has_render_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Fetch a statement page, cheapest method first.
    ///
    /// Never fails outright: every cause ends up in [`FetchOutcome::Failure`].
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let started = Instant::now();

        let direct = match self.fetch_direct(url).await {
            Ok(html) => {
                debug!(url, elapsed_ms = started.elapsed().as_millis() as u64, "direct fetch succeeded");
                return FetchOutcome::Success {
                    html,
                    path: FetchPath::Direct,
                };
            }
            Err(err) => err,
        };
        warn!(url, error = %direct, code = %direct.code, "direct fetch failed");

        if direct.is_invalid_url() {
            return FetchOutcome::Failure {
                direct,
                rendered: None,
            };
        }

        let Some(engine) = self.engine.as_ref() else {
            debug!(url, "no rendering engine; skipping rendered fetch");
            return FetchOutcome::Failure {
                direct,
                rendered: Some(ScrapeError::engine_unavailable(url, "FetchRendered")),
            };
        };

        info!(url, "falling back to rendered fetch");
        match self.fetch_rendered(engine.as_ref(), url).await {
            Ok(html) => {
                info!(url, elapsed_ms = started.elapsed().as_millis() as u64, "rendered fetch succeeded");
                FetchOutcome::Success {
                    html,
                    path: FetchPath::Rendered,
                }
            }
            Err(err) => {
                warn!(url, error = %err, code = %err.code, "rendered fetch failed");
                FetchOutcome::Failure {
                    direct,
                    rendered: Some(err),
                }
            }
        }
    }

    /// Fetch and parse a statement page.
    ///
    /// `None` means the locator contributes no record: the page could not be
    /// fetched or holds no statement region.
    pub async fn scrape(&self, url: &str) -> Option<ProblemDetails> {
        let html = self.fetch(url).await.into_html()?;
        let details = self.parse_html(&html);
        if details.is_none() {
            warn!(url, "fetched page has no statement region");
        }
        details
    }

    /// Parse already-fetched markup.
    pub fn parse_html(&self, html: &str) -> Option<ProblemDetails> {
        parse_statement(html)
    }

    async fn fetch_direct(&self, url: &str) -> Result<String, ScrapeError> {
        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
            timeout: self.opts.direct_timeout,
        };
        let result = fetch(&self.http_client, url, &fetch_opts).await?;
        let html = result.text_utf8(None);
        self.require_marker(url, "FetchDirect", html)
    }

    async fn fetch_rendered(&self, engine: &dyn RenderEngine, url: &str) -> Result<String, ScrapeError> {
        validate_url(url, "FetchRendered")?;

        let budget = RenderBudget {
            navigation: self.opts.navigation_timeout,
            settle: self.opts.settle_timeout,
        };
        let started = Instant::now();

        let attempt = async {
            let session = engine.launch().await.map_err(|mut e| {
                if e.url.is_empty() {
                    e.url = url.to_string();
                }
                e
            })?;
            let mut scope = SessionScope::new(session);
            let rendered = scope.render(url, budget).await;
            scope.close().await;
            rendered
        };

        // Dropping `attempt` on expiry drops the scope, which tears the session down.
        let html = match tokio::time::timeout(self.opts.render_timeout, attempt).await {
            Ok(rendered) => rendered?,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(url, elapsed_ms, bound = ?self.opts.render_timeout, "rendered fetch timed out");
                return Err(ScrapeError::timeout(
                    url,
                    "FetchRendered",
                    Some(anyhow::anyhow!(
                        "render exceeded {:?}",
                        self.opts.render_timeout
                    )),
                ));
            }
        };

        self.require_marker(url, "FetchRendered", html)
    }

    fn require_marker(&self, url: &str, op: &str, html: String) -> Result<String, ScrapeError> {
        if html.contains(&self.opts.marker) {
            Ok(html)
        } else {
            Err(ScrapeError::missing_marker(url, op, &self.opts.marker))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PAGE: &str = r#"<html><body><div class="problem-statement">
        <div class="header"><div class="title">A. Watermelon</div>
        <div class="time-limit"><div class="property-title">time limit per test</div>1 second</div>
        <div class="memory-limit"><div class="property-title">memory limit per test</div>64 megabytes</div></div>
        <div class="sample-tests"><div class="sample-test">
        <div class="input"><pre>8</pre></div><div class="output"><pre>YES</pre></div>
        </div></div></div></body></html>"#;

    #[test]
    fn builder_without_engine_disables_fallback() {
        let client = Client::builder().build().expect("client builds");
        assert!(!client.has_render_engine());
        assert_eq!(client.options().marker, "problem-statement");
    }

    #[test]
    fn engine_path_enables_fallback() {
        let client = Client::builder()
            .engine_path("/usr/bin/chromium")
            .build()
            .expect("client builds");
        assert!(client.has_render_engine());
    }

    #[tokio::test]
    async fn direct_success_is_tagged_direct() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/4/A");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(PAGE);
        });

        let client = Client::builder().build().unwrap();
        let outcome = client.fetch(&server.url("/problemset/problem/4/A")).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.path(), Some(FetchPath::Direct));
        assert!(outcome.html().unwrap().contains("Watermelon"));
    }

    #[tokio::test]
    async fn scrape_parses_direct_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/p");
            then.status(200).body(PAGE);
        });

        let client = Client::builder().build().unwrap();
        let details = client.scrape(&server.url("/p")).await.expect("details");

        assert_eq!(details.time_limit_ms, Some(1000));
        assert_eq!(details.mem_limit_kb, Some(65536));
        assert_eq!(details.samples.len(), 1);
        assert_eq!(details.samples[0].output, "YES");
    }

    #[tokio::test]
    async fn page_without_marker_fails_without_engine() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/soft404");
            then.status(200).body("<html><body>Problem not found</body></html>");
        });

        let client = Client::builder().build().unwrap();
        match client.fetch(&server.url("/soft404")).await {
            FetchOutcome::Failure { direct, rendered } => {
                assert!(direct.is_missing_marker());
                assert!(rendered.expect("fallback considered").is_engine_unavailable());
            }
            other => panic!("expected failure, got {:?}", other.path()),
        }
    }

    #[tokio::test]
    async fn invalid_url_skips_fallback() {
        let client = Client::builder().engine_path("/nonexistent").build().unwrap();
        match client.fetch("not a url").await {
            FetchOutcome::Failure { direct, rendered } => {
                assert!(direct.is_invalid_url());
                assert!(rendered.is_none());
            }
            other => panic!("expected failure, got {:?}", other.path()),
        }
    }

    #[test]
    fn parse_html_without_statement_is_none() {
        let client = Client::builder().build().unwrap();
        assert!(client.parse_html("<html><body>hi</body></html>").is_none());
    }
}
