// ABOUTME: Client for the Codeforces problemset API listing the problems to harvest.
// ABOUTME: Decodes problemset.problems and builds statement page locators from contest id and index.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ScrapeError;

pub const DEFAULT_API_BASE: &str = "https://codeforces.com/api";
pub const DEFAULT_SITE_BASE: &str = "https://codeforces.com";

/// Catalog entry for one problem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemMeta {
    pub contest_id: u32,
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProblemMeta {
    /// Identifier used for deduplication, e.g. `4A`.
    pub fn external_id(&self) -> String {
        format!("{}{}", self.contest_id, self.index)
    }

    /// Statement page locator under `site_base`.
    pub fn url(&self, site_base: &str) -> String {
        format!(
            "{}/problemset/problem/{}/{}",
            site_base.trim_end_matches('/'),
            self.contest_id,
            self.index
        )
    }

    /// Declared difficulty as stored text; empty when unrated.
    pub fn difficulty(&self) -> String {
        self.rating.map(|r| r.to_string()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    result: Option<ProblemsetResult>,
}

#[derive(Debug, Deserialize)]
struct ProblemsetResult {
    problems: Vec<ProblemMeta>,
}

/// Keep rated problems only, in catalog order, at most `limit` of them.
pub fn select_rated(problems: Vec<ProblemMeta>, limit: usize) -> Vec<ProblemMeta> {
    problems
        .into_iter()
        .filter(|p| p.rating.is_some())
        .take(limit)
        .collect()
}

/// Reads the problem catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http_client: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the whole problemset.
    pub async fn problems(&self) -> Result<Vec<ProblemMeta>, ScrapeError> {
        let url = format!("{}/problemset.problems", self.api_base.trim_end_matches('/'));
        debug!(url = %url, "requesting problem catalog");

        let response = self
            .http_client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScrapeError::timeout(&url, "Catalog", Some(e.into()))
                } else {
                    ScrapeError::catalog(&url, "Catalog", Some(e.into()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::catalog(
                &url,
                "Catalog",
                Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
            ));
        }

        let envelope: ApiEnvelope = response.json().await.map_err(|e| {
            ScrapeError::catalog(&url, "Catalog", Some(anyhow::anyhow!("invalid catalog body: {}", e)))
        })?;

        if envelope.status != "OK" {
            let comment = envelope.comment.unwrap_or_default();
            return Err(ScrapeError::catalog(
                &url,
                "Catalog",
                Some(anyhow::anyhow!("API status {}: {}", envelope.status, comment)),
            ));
        }

        let problems = envelope
            .result
            .map(|r| r.problems)
            .ok_or_else(|| ScrapeError::catalog(&url, "Catalog", Some(anyhow::anyhow!("missing result"))))?;

        info!(count = problems.len(), "problem catalog loaded");
        Ok(problems)
    }

    /// Fetch the catalog and keep the first `limit` rated problems.
    pub async fn rated_problems(&self, limit: usize) -> Result<Vec<ProblemMeta>, ScrapeError> {
        Ok(select_rated(self.problems().await?, limit))
    }
}
