// ABOUTME: CLI binary that scrapes one problem statement page into ProblemDetails JSON.
// ABOUTME: Fetches a URL through the direct/rendered strategy, or parses a local HTML file.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use sibyl_scrape::logging::{init_logging, LogConfig};
use sibyl_scrape::{ClientBuilder, Options, ProblemDetails};

#[derive(Parser, Debug)]
#[command(name = "cfscrape")]
#[command(about = "Extract statement, limits and samples from a problem page")]
struct Args {
    /// HTML file to parse instead of fetching
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Single-line JSON instead of pretty output
    #[arg(long = "compact")]
    compact: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Problem page URL (fetch mode)
    #[arg()]
    url: Option<String>,
}

fn render_json(details: &ProblemDetails, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(details)
    } else {
        serde_json::to_string_pretty(details)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(LogConfig::from_env()) {
        eprintln!("warning: {}", e);
    }

    if args.html.is_some() && args.url.is_some() {
        eprintln!("error: cannot use both --html and a URL");
        return ExitCode::from(1);
    }

    let start = Instant::now();

    let details = if let Some(html_path) = &args.html {
        let html = match fs::read_to_string(html_path) {
            Ok(html) => html,
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                return ExitCode::from(1);
            }
        };
        sibyl_scrape::parse_statement(&html)
    } else if let Some(url) = &args.url {
        let client = match ClientBuilder::from_options(Options::from_env()).build() {
            Ok(client) => client,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        };
        client.scrape(url).await
    } else {
        eprintln!("error: a URL is required, or use --html");
        return ExitCode::from(1);
    };

    let elapsed = start.elapsed();
    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    let Some(details) = details else {
        eprintln!("error: no problem statement found");
        return ExitCode::from(1);
    };

    let output = match render_json(&details, args.compact) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error encoding JSON: {}", e);
            return ExitCode::from(1);
        }
    };

    if let Some(path) = &args.output {
        if let Err(e) = fs::write(path, &output) {
            eprintln!("error writing to {:?}: {}", path, e);
            return ExitCode::from(1);
        }
    } else {
        println!("{}", output);
    }

    ExitCode::SUCCESS
}
