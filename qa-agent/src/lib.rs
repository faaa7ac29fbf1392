//! Test-case, Selenium-script and test-data generation over retrieved documentation.
//!
//! Public API: [`QaAgent`]. For each request it retrieves the top-K chunks from
//! `doc-store`, builds a deterministic prompt, calls the configured
//! [`ai_llm_service::TextGenerator`], and parses the raw answer into a tagged
//! [`Parsed`] result. Malformed model output is data, never an error.
//!
//! # Example
//! ```no_run
//! # use std::sync::Arc;
//! # use qa_agent::{AgentConfig, QaAgent, TestCaseRequest};
//! # async fn demo(store: Arc<doc_store::DocStore>, llm: Arc<ai_llm_service::LlmClient>) -> qa_agent::Result<()> {
//! let agent = QaAgent::new(AgentConfig::from_env()?, store, llm);
//! let out = agent
//!     .generate_test_cases(&TestCaseRequest {
//!         feature_description: "Discount code at checkout".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{} sources, parsed: {}", out.sources.len(), out.result.is_ok());
//! # Ok(())
//! # }
//! ```

mod agent;
mod cfg;
mod error;
pub mod html;
pub mod parser;
pub mod prompt;
pub mod test_data;
mod types;

pub use agent::{
    MAX_RECORDS, MAX_RECORDS_PER_CASE, MIN_EXPLAIN_CHARS, MIN_FEATURE_CHARS, MIN_FEATURE_NAME_CHARS,
    MIN_TEST_DATA_CHARS, QaAgent,
};
pub use cfg::AgentConfig;
pub use error::{AgentError, Result};
pub use html::HtmlAnalyzer;
pub use test_data::{
    DataType, FieldExtraction, FieldOrigin, FieldSpec, TestDataFromCasesRequest, TestDataGeneration,
    TestDataRequest, TestDataset,
};
pub use types::{
    Explanation, Parsed, SeleniumGeneration, SeleniumRequest, SeleniumScript, SourceRef, TestCase,
    TestCaseGeneration, TestCaseRequest, TestType,
};
