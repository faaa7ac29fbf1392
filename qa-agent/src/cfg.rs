//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use ai_llm_service::GenerationParams;
use serde::Serialize;

use crate::error::{AgentError, Result};

/// Config bag for the agent. All fields have defaults via `from_env`.
#[derive(Clone, Debug, Serialize)]
pub struct AgentConfig {
    /// Chunks retrieved for test-case generation.
    pub top_k: usize,
    /// Chunks retrieved for Selenium generation.
    pub selenium_top_k: usize,
    /// Character budget of the context block.
    pub max_ctx_chars: usize,
    /// Page analyzed for selectors when a request names none.
    pub target_html_path: Option<PathBuf>,

    #[serde(skip)]
    pub test_case_params: GenerationParams,
    #[serde(skip)]
    pub selenium_params: GenerationParams,
    #[serde(skip)]
    pub explain_params: GenerationParams,
    #[serde(skip)]
    pub test_data_params: GenerationParams,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            selenium_top_k: 3,
            max_ctx_chars: 8000,
            target_html_path: None,
            test_case_params: GenerationParams::new(0.3, 3000),
            selenium_params: GenerationParams::new(0.1, 2000),
            explain_params: GenerationParams {
                temperature: Some(0.3),
                max_tokens: None,
            },
            test_data_params: GenerationParams::new(0.1, 1000),
        }
    }
}

impl AgentConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// - `AGENT_TOP_K` (5), `SELENIUM_TOP_K` (3), clamped to 1..=20
    /// - `MAX_CTX_CHARS` (8000)
    /// - `TARGET_HTML_PATH` (unset)
    ///
    /// # Errors
    /// [`AgentError::Config`] when a numeric variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            top_k: parse("AGENT_TOP_K", d.top_k)?.clamp(1, 20),
            selenium_top_k: parse("SELENIUM_TOP_K", d.selenium_top_k)?.clamp(1, 20),
            max_ctx_chars: parse("MAX_CTX_CHARS", d.max_ctx_chars)?.max(500),
            target_html_path: Some(env("TARGET_HTML_PATH", ""))
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            ..d
        })
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k).unwrap_or_else(|_| dflt.to_string())
}

/// Unset or blank keeps `dflt`; anything else must parse.
fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> Result<T> {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| AgentError::Config(format!("failed to parse env variable {k} = '{v}'"))),
        _ => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numbers_are_reported() {
        // Keys used by no other test.
        unsafe {
            std::env::set_var("QA_CFG_TEST_GOOD", " 7 ");
            std::env::set_var("QA_CFG_TEST_BAD", "seven");
            std::env::set_var("QA_CFG_TEST_BLANK", "  ");
        }
        assert_eq!(parse("QA_CFG_TEST_GOOD", 5usize).unwrap(), 7);
        assert_eq!(parse("QA_CFG_TEST_BLANK", 5usize).unwrap(), 5);
        assert_eq!(parse("QA_CFG_TEST_UNSET", 5usize).unwrap(), 5);
        match parse("QA_CFG_TEST_BAD", 5usize) {
            Err(AgentError::Config(msg)) => assert!(msg.contains("QA_CFG_TEST_BAD")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
