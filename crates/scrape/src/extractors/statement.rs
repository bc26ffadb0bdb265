// ABOUTME: Locates the regions of a problem statement page and builds a ProblemDetails.
// ABOUTME: Limits go through the limit parser, samples through the text normalizer.

//! Statement document parsing.
//!
//! Key behaviors:
//! - No `div.problem-statement` means "not a problem document" and yields `None`.
//! - Specification sections are kept as raw markup, not normalized.
//! - The i-th sample input pairs with the i-th sample output. When the counts
//!   differ the unpaired tail is dropped and a warning is logged.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::extractors::limits::{parse_memory_limit_kb, parse_time_limit_ms};
use crate::formats::normalize_element;
use crate::result::{ProblemDetails, Sample};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid statement selector")
}

static STATEMENT: Lazy<Selector> = Lazy::new(|| selector("div.problem-statement"));
static TIME_LIMIT: Lazy<Selector> = Lazy::new(|| selector("div.time-limit"));
static MEMORY_LIMIT: Lazy<Selector> = Lazy::new(|| selector("div.memory-limit"));
static INPUT_SPEC: Lazy<Selector> = Lazy::new(|| selector("div.input-specification"));
static OUTPUT_SPEC: Lazy<Selector> = Lazy::new(|| selector("div.output-specification"));
static SAMPLE_INPUTS: Lazy<Selector> =
    Lazy::new(|| selector("div.sample-tests div.input pre"));
static SAMPLE_OUTPUTS: Lazy<Selector> =
    Lazy::new(|| selector("div.sample-tests div.output pre"));

/// Flattened label text of an element, text nodes separated by a space.
fn label_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

fn first_outer_html(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(|el| el.html())
}

/// Pairs the i-th input with the i-th output, keeping document order.
fn pair_samples(inputs: Vec<ElementRef<'_>>, outputs: Vec<ElementRef<'_>>) -> Vec<Sample> {
    if inputs.len() != outputs.len() {
        warn!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            "sample input/output counts differ; unpaired samples dropped"
        );
    }

    inputs
        .into_iter()
        .zip(outputs)
        .map(|(input, output)| Sample {
            input: normalize_element(Some(input)),
            output: normalize_element(Some(output)),
        })
        .collect()
}

/// Parse a full statement page.
///
/// Returns `None` when the document has no statement container.
pub fn parse_statement(html: &str) -> Option<ProblemDetails> {
    let doc = Html::parse_document(html);
    parse_statement_document(&doc)
}

/// Parse an already parsed statement page.
pub fn parse_statement_document(doc: &Html) -> Option<ProblemDetails> {
    let Some(statement) = doc.select(&STATEMENT).next() else {
        debug!("no statement container in document");
        return None;
    };

    let time_limit_ms = statement
        .select(&TIME_LIMIT)
        .next()
        .and_then(|el| parse_time_limit_ms(&label_text(el)));
    let mem_limit_kb = statement
        .select(&MEMORY_LIMIT)
        .next()
        .and_then(|el| parse_memory_limit_kb(&label_text(el)));

    let inputs: Vec<ElementRef<'_>> = statement.select(&SAMPLE_INPUTS).collect();
    let outputs: Vec<ElementRef<'_>> = statement.select(&SAMPLE_OUTPUTS).collect();

    Some(ProblemDetails {
        statement_html: Some(statement.html()),
        input_spec: first_outer_html(statement, &INPUT_SPEC),
        output_spec: first_outer_html(statement, &OUTPUT_SPEC),
        samples: pair_samples(inputs, outputs),
        time_limit_ms,
        mem_limit_kb,
    })
}
