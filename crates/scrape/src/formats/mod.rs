// ABOUTME: Text normalization for sample blocks and other preformatted HTML fragments.
// ABOUTME: Recovers line breaks from markup structure before stripping tags.

//! HTML-to-text conversion that keeps the line structure intact.
//!
//! Sample input/output on the problem pages is rendered inside a `<pre>`, but
//! the physical lines are not always plain text with `\n`. Newer pages wrap
//! every line in its own `div.test-example-line`, older ones use `<br>` or
//! bare `<div>`/`<p>` blocks. Two strategies are tried in order:
//!
//! 1. Line containers: take each container's text, trim it, drop empty lines
//!    and join with `\n`.
//! 2. Markup rewrite: `<br>` and block open tags become `\n`, block close tags
//!    disappear, the rest of the markup is stripped, runs of blank lines are
//!    collapsed to a single `\n` and the result is trimmed.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Class used by the source site to wrap each physical line of a sample.
pub const LINE_CONTAINER_CLASS: &str = "test-example-line";

static LINE_CONTAINER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&format!(".{}", LINE_CONTAINER_CLASS)).expect("valid line selector")
});

static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").expect("valid regex"));

static BLOCK_OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:div|p|li|tr|h[1-6])(?:\s[^>]*)?/?>").expect("valid regex")
});

static BLOCK_CLOSE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(?:div|p|li|tr|h[1-6])\s*>").expect("valid regex"));

static BLANK_LINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Replace <br> variants with a newline.
fn preprocess_br_tags(html: &str) -> String {
    BR_TAG.replace_all(html, "\n").into_owned()
}

/// Block open tags start a new line; close tags are dropped.
fn preprocess_block_tags(html: &str) -> String {
    let opened = BLOCK_OPEN_TAG.replace_all(html, "\n");
    BLOCK_CLOSE_TAG.replace_all(&opened, "").into_owned()
}

/// Collapse runs of two or more newlines (whitespace in between allowed) into one.
fn collapse_newlines_to_one(text: &str) -> String {
    let mut current = text.to_string();
    // A single pass can leave "\n\n" behind when runs overlap ("\n \n \n").
    loop {
        let next = BLANK_LINE_RUN.replace_all(&current, "\n").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Strip the remaining markup and decode entities.
fn strip_tags(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<String>()
}

/// Join the trimmed text of each line container, skipping empty lines.
fn join_line_containers<'a>(lines: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    let mut found = false;
    let mut out: Vec<String> = Vec::new();
    for line in lines {
        found = true;
        let text = line.text().collect::<String>();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    found.then(|| out.join("\n"))
}

/// Generic markup rewrite used when there are no line containers.
fn rewrite_markup_to_text(html: &str) -> String {
    let unified = html.replace("\r\n", "\n");
    let with_breaks = preprocess_block_tags(&preprocess_br_tags(&unified));
    let text = strip_tags(&with_breaks);
    collapse_newlines_to_one(&text).trim().to_string()
}

/// Convert an HTML fragment into text, keeping one `\n` per visible line.
///
/// Empty input yields an empty string.
pub fn html_to_text_with_newlines(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    if let Some(joined) = join_line_containers(fragment.select(&LINE_CONTAINER)) {
        return joined;
    }

    rewrite_markup_to_text(html)
}

/// Same as [`html_to_text_with_newlines`] for an element already in a parsed
/// document. The element's own tag is not part of the converted markup.
pub fn normalize_element(element: Option<ElementRef<'_>>) -> String {
    let Some(element) = element else {
        return String::new();
    };

    if let Some(joined) = join_line_containers(element.select(&LINE_CONTAINER)) {
        return joined;
    }

    rewrite_markup_to_text(&element.inner_html())
}
