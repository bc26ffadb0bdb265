// ABOUTME: ProblemDetails struct holding the structured data extracted from a statement page.
// ABOUTME: Samples keep their internal line breaks; only surrounding whitespace is trimmed.

use serde::{Deserialize, Serialize};

/// One sample test: the input fed to a solution and the expected output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Sample {
    pub input: String,
    pub output: String,
}

/// Structured data extracted from one problem statement document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProblemDetails {
    /// Raw markup of the statement container.
    pub statement_html: Option<String>,
    /// Raw markup of the input specification section.
    pub input_spec: Option<String>,
    /// Raw markup of the output specification section.
    pub output_spec: Option<String>,
    /// Samples in document order.
    pub samples: Vec<Sample>,
    pub time_limit_ms: Option<u32>,
    pub mem_limit_kb: Option<u64>,
}

impl ProblemDetails {
    /// Number of samples extracted.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
