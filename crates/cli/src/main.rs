// ABOUTME: Batch CLI that harvests rated Codeforces problems into a JSON store snapshot.
// ABOUTME: Loads .env, discovers the rendering engine once, then scrapes, stores and paces.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sibyl_scrape::harvest::catalog::{CatalogClient, DEFAULT_API_BASE};
use sibyl_scrape::harvest::store::MemoryStore;
use sibyl_scrape::harvest::{HarvestConfig, Harvester};
use sibyl_scrape::logging::{init_logging, LogConfig};
use sibyl_scrape::{ClientBuilder, Options};
use tracing::{info, warn};

/// Harvest problem statements into a store snapshot.
#[derive(Parser, Debug)]
#[command(name = "sibyl-harvest")]
#[command(about = "Scrape rated Codeforces problems and store them as JSON", long_about = None)]
struct Args {
    /// Number of rated problems to process.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Pause between problems in milliseconds.
    #[arg(long = "sleep-ms", default_value_t = 1000)]
    sleep_ms: u64,

    /// Snapshot file; loaded first when it exists so reruns update in place.
    #[arg(long, default_value = "problems.json")]
    out: PathBuf,

    /// Problemset API base URL.
    #[arg(long = "api-base", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging(LogConfig::from_env())?;

    let args = Args::parse();
    let opts = Options::from_env();
    match &opts.engine_path {
        Some(path) => info!(engine = %path.display(), "rendered fallback enabled"),
        None => warn!("no rendering engine found; only direct fetches will be tried"),
    }

    let http = reqwest::Client::builder()
        .user_agent(opts.user_agent.clone())
        .build()
        .context("failed to build HTTP client")?;
    let catalog = CatalogClient::new(http).api_base(&args.api_base);
    let problems = catalog
        .rated_problems(args.limit)
        .await
        .context("failed to load problem catalog")?;

    let store = if args.out.exists() {
        MemoryStore::load(&args.out)
            .with_context(|| format!("failed to load {}", args.out.display()))?
    } else {
        MemoryStore::new()
    };

    let client = ClientBuilder::from_options(opts).build()?;
    let harvester = Harvester::new(
        client,
        Arc::new(store.clone()),
        HarvestConfig {
            limit: args.limit,
            pacing: Duration::from_millis(args.sleep_ms),
            ..HarvestConfig::default()
        },
    );

    let report = harvester.run(&problems).await;

    store
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    info!(
        path = %args.out.display(),
        problems = store.problem_count(),
        stored = report.stored,
        failed = report.failed,
        "snapshot written"
    );

    Ok(())
}
