use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// - `provider`: which backend to call.
/// - `model`: model identifier (e.g. `"llama-3.1-70b-versatile"`, `"all-minilm"`).
/// - `endpoint`: base URL without the API path (e.g. `https://api.groq.com/openai`).
/// - `api_key`: bearer token for hosted providers.
/// - `max_tokens`, `temperature`, `top_p`: default sampling options, overridable per call.
/// - `timeout_secs`: per-request timeout.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "llama-3.1-70b-versatile".to_string(),
///     endpoint: "https://api.groq.com/openai".to_string(),
///     api_key: Some("gsk-...".to_string()),
///     max_tokens: Some(4096),
///     temperature: Some(0.1),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert!(cfg.api_key.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint base URL.
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Endpoint with trailing slashes removed, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
