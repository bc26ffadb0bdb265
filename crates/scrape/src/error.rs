// ABOUTME: Error types for the scraper including the ErrorCode enum and ScrapeError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of scrape failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Status,
    MissingMarker,
    Timeout,
    Render,
    EngineUnavailable,
    Catalog,
    Store,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Status => "unexpected status",
            ErrorCode::MissingMarker => "statement marker missing",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Render => "render error",
            ErrorCode::EngineUnavailable => "no rendering engine",
            ErrorCode::Catalog => "catalog error",
            ErrorCode::Store => "store error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for scrape operations.
#[derive(Debug, thiserror::Error)]
pub struct ScrapeError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sibyl: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ScrapeError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Fetch error (transport level: connect, read, decode).
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Status error for a non-success HTTP status.
    pub fn status(url: impl Into<String>, op: impl Into<String>, status: u16) -> Self {
        Self::with_code(
            ErrorCode::Status,
            url,
            op,
            Some(anyhow::anyhow!("HTTP status {}", status)),
        )
    }

    /// Create a MissingMarker error: the body came back but is not a statement page.
    pub fn missing_marker(url: impl Into<String>, op: impl Into<String>, marker: &str) -> Self {
        Self::with_code(
            ErrorCode::MissingMarker,
            url,
            op,
            Some(anyhow::anyhow!("body does not contain {:?}", marker)),
        )
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Render error.
    pub fn render(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Render, url, op, source)
    }

    /// Create an EngineUnavailable error.
    pub fn engine_unavailable(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::EngineUnavailable, url, op, None)
    }

    /// Create a Catalog error.
    pub fn catalog(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Catalog, url, op, source)
    }

    /// Create a Store error. The url slot carries the external identifier.
    pub fn store(
        key: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Store, key, op, source)
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Status error.
    pub fn is_status(&self) -> bool {
        self.code == ErrorCode::Status
    }

    /// Returns true if this is a MissingMarker error.
    pub fn is_missing_marker(&self) -> bool {
        self.code == ErrorCode::MissingMarker
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Render error.
    pub fn is_render(&self) -> bool {
        self.code == ErrorCode::Render
    }

    /// Returns true if this is an EngineUnavailable error.
    pub fn is_engine_unavailable(&self) -> bool {
        self.code == ErrorCode::EngineUnavailable
    }
}
