// ABOUTME: Library entry point for the Sibyl problem statement scraper.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, ProblemDetails, ScrapeError.

//! Sibyl - structured problem data from competitive programming statement pages.
//!
//! A [`Client`] fetches a statement page with a plain HTTP request and, when
//! that fails or returns something that is not a statement page, falls back to
//! a headless browser. The markup is then parsed into [`ProblemDetails`]:
//! statement and specification markup, time and memory limits, and sample
//! tests with their line breaks intact.
//!
//! # Example
//!
//! ```no_run
//! use sibyl_scrape::{ClientBuilder, Options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sibyl_scrape::ScrapeError> {
//!     let client = ClientBuilder::from_options(Options::from_env()).build()?;
//!     if let Some(details) = client.scrape("https://codeforces.com/problemset/problem/4/A").await {
//!         println!("{} samples", details.sample_count());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod extractors;
pub mod formats;
pub mod harvest;
pub mod logging;
pub mod options;
pub mod render;
pub mod resource;
pub mod result;

pub use crate::client::{Client, FetchOutcome, FetchPath};
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extractors::limits::{parse_memory_limit_kb, parse_time_limit_ms};
pub use crate::extractors::statement::parse_statement;
pub use crate::formats::{html_to_text_with_newlines, normalize_element};
pub use crate::options::{ClientBuilder, Options};
pub use crate::render::{RenderBudget, RenderEngine, RenderSession};
pub use crate::result::{ProblemDetails, Sample};
