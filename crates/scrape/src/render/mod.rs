// ABOUTME: Rendering engine abstraction used by the browser fallback of the fetch strategy.
// ABOUTME: Sessions are scoped: closed gracefully on normal exit and torn down on drop otherwise.

//! Browser rendering seam.
//!
//! A [`RenderEngine`] launches isolated [`RenderSession`]s. A session owns an
//! engine process (or whatever resource backs it) and must release it when
//! dropped, so a render future abandoned at any await point (timeout or
//! caller cancellation) never leaks the process. [`SessionScope`] wraps a
//! session for one attempt and prefers the graceful [`RenderSession::shutdown`]
//! path when the attempt finishes on its own.
//!
//! - [`chromium::ChromiumEngine`]: Chrome/Chromium/Edge over the DevTools protocol
//! - [`discovery`]: locating an engine executable on the host

pub mod chromium;
pub mod discovery;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ScrapeError;

/// Time limits handed to a session for a single navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBudget {
    /// Upper bound for the navigation itself.
    pub navigation: Duration,
    /// How long to wait for network activity to settle after navigation.
    /// Elapsing is not an error; the document is read as it is.
    pub settle: Duration,
}

/// Launches rendering sessions.
#[async_trait]
pub trait RenderEngine: Send + Sync + fmt::Debug {
    /// Start a fresh, isolated session.
    async fn launch(&self) -> Result<Box<dyn RenderSession>, ScrapeError>;
}

/// One live rendering session.
///
/// Dropping a session must release everything it holds.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url` and return the fully rendered document markup.
    async fn render(&mut self, url: &str, budget: RenderBudget) -> Result<String, ScrapeError>;

    /// Graceful teardown.
    async fn shutdown(self: Box<Self>);
}

/// Scoped ownership of a session for one render attempt.
pub struct SessionScope {
    session: Option<Box<dyn RenderSession>>,
}

impl SessionScope {
    /// Take ownership of a freshly launched session.
    pub fn new(session: Box<dyn RenderSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Render through the owned session.
    pub async fn render(&mut self, url: &str, budget: RenderBudget) -> Result<String, ScrapeError> {
        match self.session.as_mut() {
            Some(session) => session.render(url, budget).await,
            None => Err(ScrapeError::render(
                url,
                "Render",
                Some(anyhow::anyhow!("session already closed")),
            )),
        }
    }

    /// Shut the session down gracefully.
    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("render session abandoned before shutdown; tearing it down");
            drop(session);
        }
    }
}
