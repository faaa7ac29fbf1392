//! Public API types re-used by external crates (e.g., the HTTP API layer).

use serde::{Deserialize, Serialize};

/// Positive (happy path) or negative (invalid input, failure path) scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    #[default]
    Positive,
    Negative,
}

impl TestType {
    /// Lenient label mapping; anything not clearly negative is positive.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_ascii_lowercase();
        if l.starts_with("neg") || l.contains("invalid") || l.contains("error") {
            TestType::Negative
        } else {
            TestType::Positive
        }
    }
}

/// A structured test case extracted from LLM output.
///
/// # Example
/// ```
/// use qa_agent::{TestCase, TestType};
/// let tc = TestCase {
///     test_id: "TC-001".into(),
///     feature: "Discount code".into(),
///     title: "Valid code applies 15% discount".into(),
///     test_type: TestType::Positive,
///     preconditions: vec!["Cart has one item".into()],
///     steps: vec!["Enter SAVE15".into(), "Click Apply".into()],
///     expected_result: "Total is reduced by 15%".into(),
///     source_document: Some("product_specs.md".into()),
/// };
/// assert!(tc.is_complete());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub test_id: String,
    #[serde(default)]
    pub feature: String,
    #[serde(alias = "test_scenario", alias = "scenario")]
    pub title: String,
    #[serde(default)]
    pub test_type: TestType,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(alias = "test_steps")]
    pub steps: Vec<String>,
    #[serde(alias = "expected")]
    pub expected_result: String,
    #[serde(default)]
    pub source_document: Option<String>,
}

impl TestCase {
    /// Title, expected result and at least one step are present.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.expected_result.trim().is_empty()
            && self.steps.iter().any(|s| !s.trim().is_empty())
    }
}

/// Generated browser-automation script (opaque source text).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeleniumScript {
    pub language: String,
    pub code: String,
    pub test_case_ids: Vec<String>,
}

/// Tagged outcome of parsing LLM output.
///
/// Serializes as `{"status":"ok","value":..}` or
/// `{"status":"parse_failed","reason":..,"raw":..}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Parsed<T> {
    Ok { value: T },
    #[serde(rename = "parse_failed")]
    Failed { reason: String, raw: String },
}

impl<T> Parsed<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Parsed::Ok { .. })
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Parsed::Ok { value } => Some(value),
            Parsed::Failed { .. } => None,
        }
    }

    pub(crate) fn failed(reason: impl Into<String>, raw: &str) -> Self {
        Parsed::Failed {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// A chunk that was fed to the LLM, reported back to callers.
#[derive(Clone, Debug, Serialize)]
pub struct SourceRef {
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub score: f32,
}

/// Input of test-case generation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestCaseRequest {
    pub feature_description: String,
    /// Restrict retrieval to these document ids.
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
    /// Chunks to retrieve (1..=20); defaults to `AGENT_TOP_K`.
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Output of test-case generation.
#[derive(Clone, Debug, Serialize)]
pub struct TestCaseGeneration {
    pub query: String,
    pub model: String,
    pub sources: Vec<SourceRef>,
    pub context_available: bool,
    pub result: Parsed<Vec<TestCase>>,
}

/// Input of Selenium generation.
#[derive(Clone, Debug, Deserialize)]
pub struct SeleniumRequest {
    pub test_cases: Vec<TestCase>,
    /// Page to analyze; overrides `TARGET_HTML_PATH`.
    #[serde(default)]
    pub html_file_path: Option<String>,
    /// Fall back to `TARGET_HTML_PATH` when no path is given.
    #[serde(default = "default_true")]
    pub use_target_html: bool,
    #[serde(default)]
    pub top_k: Option<usize>,
}

fn default_true() -> bool {
    true
}

/// Output of Selenium generation.
#[derive(Clone, Debug, Serialize)]
pub struct SeleniumGeneration {
    pub model: String,
    pub sources: Vec<SourceRef>,
    pub html_analyzed: bool,
    pub result: Parsed<SeleniumScript>,
}

/// Plain-English explanation of a test case.
#[derive(Clone, Debug, Serialize)]
pub struct Explanation {
    pub model: String,
    pub explanation: String,
}
