// ABOUTME: Batch orchestration: scrape each catalog problem, store it with its tags, pace requests.
// ABOUTME: Per-problem failures are logged and counted; the batch never aborts on one document.

//! Harvesting problems into a [`store::ProblemStore`].
//!
//! For every catalog entry the harvester runs the fetch strategy, fills in
//! default limits when the page did not yield them, upserts the problem,
//! upserts and links each tag, then sleeps for the pacing interval. A page
//! that produced no details is still stored with catalog metadata.

pub mod catalog;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::client::Client;
use crate::error::ScrapeError;
use crate::result::ProblemDetails;

use self::catalog::{ProblemMeta, DEFAULT_SITE_BASE};
use self::store::{ProblemRecord, ProblemStore};

/// Knobs for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// How many rated catalog entries to process.
    pub limit: usize,
    /// Sleep between entries.
    pub pacing: Duration,
    pub source_judge_id: u32,
    pub site_base: String,
    pub default_time_limit_ms: u32,
    pub default_mem_limit_kb: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            pacing: Duration::from_secs(1),
            source_judge_id: 1,
            site_base: DEFAULT_SITE_BASE.to_string(),
            default_time_limit_ms: 2000,
            default_mem_limit_kb: 262_144,
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub attempted: usize,
    /// Entries whose page yielded ProblemDetails.
    pub scraped: usize,
    pub stored: usize,
    pub failed: usize,
}

/// Drives a batch of catalog entries through the client into a store.
pub struct Harvester {
    client: Client,
    store: Arc<dyn ProblemStore>,
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(client: Client, store: Arc<dyn ProblemStore>, config: HarvestConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Build the stored row from catalog metadata and whatever the page yielded.
    pub fn build_record(&self, meta: &ProblemMeta, details: Option<ProblemDetails>) -> ProblemRecord {
        let details = details.unwrap_or_default();
        ProblemRecord {
            source_judge_id: self.config.source_judge_id,
            external_id: meta.external_id(),
            title: meta.name.clone(),
            url: meta.url(&self.config.site_base),
            difficulty: meta.difficulty(),
            time_limit_ms: details
                .time_limit_ms
                .unwrap_or(self.config.default_time_limit_ms),
            mem_limit_kb: details
                .mem_limit_kb
                .unwrap_or(self.config.default_mem_limit_kb),
            statement_html: details.statement_html,
            input_spec: details.input_spec,
            output_spec: details.output_spec,
            samples: details.samples,
            fetched_at: Utc::now(),
        }
    }

    /// Process at most `limit` entries in order, pacing between them.
    pub async fn run(&self, problems: &[ProblemMeta]) -> HarvestReport {
        let mut report = HarvestReport::default();

        for (i, meta) in problems.iter().take(self.config.limit).enumerate() {
            if i > 0 && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }

            report.attempted += 1;
            let external_id = meta.external_id();
            let url = meta.url(&self.config.site_base);
            info!(external_id = %external_id, url = %url, "processing problem");

            let details = self.client.scrape(&url).await;
            let scraped = details.is_some();
            if scraped {
                report.scraped += 1;
            }

            match self.store_problem(meta, details).await {
                Ok(problem_id) => {
                    report.stored += 1;
                    info!(external_id = %external_id, problem_id, scraped, "problem stored");
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(external_id = %external_id, error = %err, "problem not stored");
                }
            }
        }

        info!(
            attempted = report.attempted,
            scraped = report.scraped,
            stored = report.stored,
            failed = report.failed,
            "harvest finished"
        );
        report
    }

    async fn store_problem(
        &self,
        meta: &ProblemMeta,
        details: Option<ProblemDetails>,
    ) -> Result<u64, ScrapeError> {
        let record = self.build_record(meta, details);
        let problem_id = self.store.upsert_problem(record).await?;

        for tag in &meta.tags {
            let tag_id = match self.store.upsert_tag(tag).await {
                Ok(id) => id,
                Err(err) => {
                    warn!(tag = %tag, error = %err, "tag upsert failed");
                    continue;
                }
            };
            if let Err(err) = self.store.link_tag(problem_id, tag_id).await {
                warn!(problem_id, tag_id, error = %err, "tag link failed");
            }
        }

        Ok(problem_id)
    }
}

#[cfg(test)]
mod tests {
    use super::store::MemoryStore;
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    fn meta(contest_id: u32, index: &str, tags: &[&str]) -> ProblemMeta {
        ProblemMeta {
            contest_id,
            index: index.to_string(),
            name: format!("Problem {}{}", contest_id, index),
            rating: Some(800),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn harvester(site: String, store: MemoryStore) -> Harvester {
        let client = Client::builder().build().unwrap();
        Harvester::new(
            client,
            Arc::new(store),
            HarvestConfig {
                pacing: Duration::ZERO,
                site_base: site,
                ..HarvestConfig::default()
            },
        )
    }

    #[test]
    fn record_defaults_limits_when_details_missing() {
        let h = harvester("https://codeforces.com".to_string(), MemoryStore::new());
        let record = h.build_record(&meta(4, "A", &[]), None);

        assert_eq!(record.external_id, "4A");
        assert_eq!(record.url, "https://codeforces.com/problemset/problem/4/A");
        assert_eq!(record.difficulty, "800");
        assert_eq!(record.time_limit_ms, 2000);
        assert_eq!(record.mem_limit_kb, 262_144);
        assert!(record.statement_html.is_none());
        assert!(record.samples.is_empty());
    }

    #[tokio::test]
    async fn run_stores_scraped_and_unscrapable_problems() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/4/A");
            then.status(200).body(
                r#"<html><body><div class="problem-statement">
                <div class="time-limit">time limit per test 1 second</div>
                <div class="memory-limit">memory limit per test 64 megabytes</div>
                </div></body></html>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/71/A");
            then.status(404);
        });

        let store = MemoryStore::new();
        let h = harvester(server.base_url(), store.clone());
        let report = h
            .run(&[
                meta(4, "A", &["Math", "brute force"]),
                meta(71, "A", &["strings", " math "]),
            ])
            .await;

        assert_eq!(
            report,
            HarvestReport {
                attempted: 2,
                scraped: 1,
                stored: 2,
                failed: 0,
            }
        );

        let watermelon = store.problem_id(1, "4A").unwrap();
        let record = store.problem(watermelon).unwrap();
        assert_eq!(record.time_limit_ms, 1000);
        assert_eq!(record.mem_limit_kb, 65_536);
        assert!(record.statement_html.is_some());
        assert_eq!(store.tags_for(watermelon), vec!["brute force", "math"]);

        let words = store.problem_id(1, "71A").unwrap();
        assert_eq!(store.problem(words).unwrap().time_limit_ms, 2000);
        assert_eq!(store.tags_for(words), vec!["math", "strings"]);
        assert_eq!(store.snapshot().tags.len(), 3);
    }

    #[tokio::test]
    async fn run_stops_at_configured_limit() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/4/A");
            then.status(404);
        });
        let beyond = server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/71/A");
            then.status(404);
        });

        let store = MemoryStore::new();
        let h = Harvester::new(
            Client::builder().build().unwrap(),
            Arc::new(store.clone()),
            HarvestConfig {
                limit: 1,
                pacing: Duration::ZERO,
                site_base: server.base_url(),
                ..HarvestConfig::default()
            },
        );
        let report = h.run(&[meta(4, "A", &[]), meta(71, "A", &[])]).await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.stored, 1);
        first.assert_hits(1);
        beyond.assert_hits(0);
        assert_eq!(store.problem_count(), 1);
        assert!(store.problem_id(1, "71A").is_none());
    }

    #[tokio::test]
    async fn rerun_does_not_duplicate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/1/A");
            then.status(500);
        });

        let store = MemoryStore::new();
        let h = harvester(server.base_url(), store.clone());
        let batch = [meta(1, "A", &["math"])];
        h.run(&batch).await;
        h.run(&batch).await;

        assert_eq!(store.problem_count(), 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.tags.len(), 1);
        assert_eq!(snapshot.problem_tags.len(), 1);
    }

    #[tokio::test]
    async fn empty_tag_is_skipped_without_failing_problem() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/2/B");
            then.status(404);
        });

        let store = MemoryStore::new();
        let h = harvester(server.base_url(), store.clone());
        let report = h.run(&[meta(2, "B", &["  ", "dp"])]).await;

        assert_eq!(report.stored, 1);
        assert_eq!(report.failed, 0);
        let pid = store.problem_id(1, "2B").unwrap();
        assert_eq!(store.tags_for(pid), vec!["dp"]);
    }
}
