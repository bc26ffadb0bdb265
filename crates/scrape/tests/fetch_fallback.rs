// ABOUTME: End-to-end tests of the direct/rendered fetch strategy with an in-process fake engine.
// ABOUTME: Verifies fallback triggers, marker checks, the overall render bound and session teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use httpmock::prelude::*;
use sibyl_scrape::{
    Client, FetchOutcome, FetchPath, RenderBudget, RenderEngine, RenderSession, ScrapeError,
};

const STATEMENT_PAGE: &str = r#"<html><body><div class="problem-statement">
    <div class="time-limit">time limit per test 1 second</div>
    <div class="memory-limit">memory limit per test 256 megabytes</div>
    <div class="sample-tests"><div class="input"><pre>8</pre></div>
    <div class="output"><pre>YES</pre></div></div>
    </div></body></html>"#;

#[derive(Debug, Clone)]
enum Behavior {
    Serve(String),
    Hang,
    FailLaunch,
}

#[derive(Debug, Default)]
struct Counters {
    launched: AtomicUsize,
    live: AtomicUsize,
    graceful: AtomicUsize,
}

#[derive(Debug)]
struct FakeEngine {
    behavior: Behavior,
    counters: Arc<Counters>,
}

impl FakeEngine {
    fn new(behavior: Behavior) -> (Arc<Self>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let engine = Arc::new(Self {
            behavior,
            counters: counters.clone(),
        });
        (engine, counters)
    }
}

struct FakeSession {
    behavior: Behavior,
    counters: Arc<Counters>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, ScrapeError> {
        if matches!(self.behavior, Behavior::FailLaunch) {
            return Err(ScrapeError::render("", "Launch", None));
        }
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behavior: self.behavior.clone(),
            counters: self.counters.clone(),
        }))
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn render(&mut self, _url: &str, _budget: RenderBudget) -> Result<String, ScrapeError> {
        match &self.behavior {
            Behavior::Serve(html) => Ok(html.clone()),
            Behavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            Behavior::FailLaunch => unreachable!(),
        }
    }

    async fn shutdown(self: Box<Self>) {
        self.counters.graceful.fetch_add(1, Ordering::SeqCst);
    }
}

fn client_with(engine: Arc<FakeEngine>) -> Client {
    Client::builder()
        .render_engine(engine)
        .direct_timeout(Duration::from_secs(5))
        .render_timeout(Duration::from_millis(200))
        .build()
        .expect("client builds")
}

#[tokio::test]
async fn direct_success_never_launches_engine() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/problemset/problem/4/A");
        then.status(200).body(STATEMENT_PAGE);
    });

    let (engine, counters) = FakeEngine::new(Behavior::Serve(STATEMENT_PAGE.to_string()));
    let outcome = client_with(engine)
        .fetch(&server.url("/problemset/problem/4/A"))
        .await;

    assert_eq!(outcome.path(), Some(FetchPath::Direct));
    assert_eq!(counters.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn soft_404_falls_back_to_rendered_page() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/p");
        then.status(200)
            .body("<html><body>Redirecting to the main page...</body></html>");
    });

    let (engine, counters) = FakeEngine::new(Behavior::Serve(STATEMENT_PAGE.to_string()));
    let client = client_with(engine);
    let outcome = client.fetch(&server.url("/p")).await;

    assert_eq!(outcome.path(), Some(FetchPath::Rendered));
    assert!(outcome.html().unwrap().contains("problem-statement"));
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    assert_eq!(counters.graceful.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scrape_uses_rendered_page_after_server_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/p");
        then.status(503);
    });

    let (engine, _) = FakeEngine::new(Behavior::Serve(STATEMENT_PAGE.to_string()));
    let details = client_with(engine)
        .scrape(&server.url("/p"))
        .await
        .expect("rendered page parses");

    assert_eq!(details.time_limit_ms, Some(1000));
    assert_eq!(details.samples[0].output, "YES");
}

#[tokio::test]
async fn rendered_page_without_marker_is_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/p");
        then.status(403);
    });

    let (engine, counters) =
        FakeEngine::new(Behavior::Serve("<html><body>Just a moment...</body></html>".to_string()));
    let outcome = client_with(engine).fetch(&server.url("/p")).await;

    match outcome {
        FetchOutcome::Failure { direct, rendered } => {
            assert!(direct.is_status());
            assert!(rendered.expect("rendered attempted").is_missing_marker());
        }
        other => panic!("expected failure, got {:?}", other.path()),
    }
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hung_render_times_out_and_releases_session() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/p");
        then.status(500);
    });

    let (engine, counters) = FakeEngine::new(Behavior::Hang);
    let client = client_with(engine);

    let started = Instant::now();
    let outcome = client.fetch(&server.url("/p")).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    match outcome {
        FetchOutcome::Failure { rendered, .. } => {
            assert!(rendered.expect("rendered attempted").is_timeout());
        }
        other => panic!("expected failure, got {:?}", other.path()),
    }
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    assert_eq!(counters.graceful.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn abandoned_fetch_releases_session() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/p");
        then.status(500);
    });

    let (engine, counters) = FakeEngine::new(Behavior::Hang);
    let client = Client::builder()
        .render_engine(engine)
        .render_timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(300), client.fetch(&server.url("/p"))).await;

    assert!(abandoned.is_err());
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn launch_failure_is_reported_with_locator() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/p");
        then.status(502);
    });

    let (engine, _) = FakeEngine::new(Behavior::FailLaunch);
    let url = server.url("/p");
    let outcome = client_with(engine).fetch(&url).await;

    match outcome {
        FetchOutcome::Failure { rendered, .. } => {
            let err = rendered.expect("rendered attempted");
            assert!(err.is_render());
            assert_eq!(err.url, url);
        }
        other => panic!("expected failure, got {:?}", other.path()),
    }
}

#[tokio::test]
async fn unreachable_host_without_engine_yields_nothing() {
    let client = Client::builder()
        .direct_timeout(Duration::from_millis(500))
        .build()
        .unwrap();

    assert!(client.scrape("http://127.0.0.1:9/problemset/problem/1/A").await.is_none());
}
