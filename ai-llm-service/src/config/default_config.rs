//! Default LLM configs loaded from environment variables.
//!
//! Two roles are supported:
//!
//! - **Generation** → chat/completion model used for test cases and scripts
//! - **Embedding**  → optional embedding model (when embeddings are not computed locally)
//!
//! # Environment variables
//!
//! Generation:
//! - `LLM_PROVIDER`    = `openai` | `groq` (default) | `ollama`
//! - `LLM_API_KEY` or `GROQ_API_KEY` = bearer token (mandatory for hosted providers)
//! - `LLM_ENDPOINT`    = base URL (default `https://api.groq.com/openai`, or `OLLAMA_URL` for ollama)
//! - `LLM_MODEL` or `GROQ_MODEL` = model (default `llama-3.1-70b-versatile`)
//! - `LLM_TEMPERATURE` = default temperature (0.1)
//! - `LLM_MAX_TOKENS`  = default max tokens (4096)
//! - `LLM_TIMEOUT_SECS`= request timeout (60)
//!
//! Embedding:
//! - `EMBEDDING_PROVIDER` = `hash` (default, computed locally → no profile) | `ollama` | `openai`
//! - `EMBEDDING_ENDPOINT` = base URL
//! - `EMBEDDING_MODEL`    = model (default `all-minilm` / `text-embedding-3-small`)
//!
//! Retry:
//! - `LLM_RETRY_ATTEMPTS` = max attempts per call (3)

use std::time::Duration;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ConfigError, Lookup, Result, first_var, opt_f32, opt_u32, opt_u64, process_env,
        validate_http_endpoint, validate_range_f32,
    },
    retry::RetryPolicy,
};

pub const DEFAULT_HOSTED_ENDPOINT: &str = "https://api.groq.com/openai";
pub const DEFAULT_HOSTED_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Generation profile from the process environment.
///
/// # Errors
/// Missing API key for a hosted provider is a [`ConfigError::MissingVar`];
/// callers treat it as fatal at startup.
pub fn config_generation() -> Result<LlmModelConfig> {
    config_generation_from(&process_env)
}

/// Generation profile from an arbitrary lookup (see [`config_generation`]).
pub fn config_generation_from(get: Lookup<'_>) -> Result<LlmModelConfig> {
    let provider = match first_var(get, &["LLM_PROVIDER"]) {
        Some(p) => p.parse::<LlmProvider>()?,
        None => LlmProvider::OpenAI,
    };

    let (endpoint, model, api_key) = match provider {
        LlmProvider::OpenAI => {
            let api_key = first_var(get, &["LLM_API_KEY", "GROQ_API_KEY"])
                .ok_or(ConfigError::MissingVar("LLM_API_KEY or GROQ_API_KEY"))?;
            let endpoint = first_var(get, &["LLM_ENDPOINT"])
                .unwrap_or_else(|| DEFAULT_HOSTED_ENDPOINT.to_string());
            let model = first_var(get, &["LLM_MODEL", "GROQ_MODEL"])
                .unwrap_or_else(|| DEFAULT_HOSTED_MODEL.to_string());
            (endpoint, model, Some(api_key))
        }
        LlmProvider::Ollama => {
            let endpoint = first_var(get, &["LLM_ENDPOINT", "OLLAMA_URL"])
                .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string());
            let model = first_var(get, &["LLM_MODEL"])
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
            (endpoint, model, None)
        }
    };

    validate_http_endpoint("LLM_ENDPOINT", &endpoint)?;
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    let temperature = opt_f32(get, "LLM_TEMPERATURE")?.unwrap_or(0.1);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: Some(opt_u32(get, "LLM_MAX_TOKENS")?.unwrap_or(4096)),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(opt_u64(get, "LLM_TIMEOUT_SECS")?.unwrap_or(60)),
    })
}

/// Embedding profile from the process environment.
///
/// Returns `Ok(None)` when embeddings are computed locally (`EMBEDDING_PROVIDER=hash`).
pub fn config_embedding() -> Result<Option<LlmModelConfig>> {
    config_embedding_from(&process_env)
}

/// Embedding profile from an arbitrary lookup (see [`config_embedding`]).
pub fn config_embedding_from(get: Lookup<'_>) -> Result<Option<LlmModelConfig>> {
    let kind = first_var(get, &["EMBEDDING_PROVIDER"]).unwrap_or_else(|| "hash".into());
    if kind.trim().eq_ignore_ascii_case("hash") {
        return Ok(None);
    }

    let provider = kind.parse::<LlmProvider>()?;
    let cfg = match provider {
        LlmProvider::Ollama => LlmModelConfig {
            provider,
            model: first_var(get, &["EMBEDDING_MODEL"]).unwrap_or_else(|| "all-minilm".into()),
            endpoint: first_var(get, &["EMBEDDING_ENDPOINT", "OLLAMA_URL"])
                .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        },
        LlmProvider::OpenAI => LlmModelConfig {
            provider,
            model: first_var(get, &["EMBEDDING_MODEL"])
                .unwrap_or_else(|| "text-embedding-3-small".into()),
            endpoint: first_var(get, &["EMBEDDING_ENDPOINT"])
                .unwrap_or_else(|| "https://api.openai.com".into()),
            api_key: Some(
                first_var(get, &["EMBEDDING_API_KEY", "LLM_API_KEY"])
                    .ok_or(ConfigError::MissingVar("EMBEDDING_API_KEY or LLM_API_KEY"))?,
            ),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(30),
        },
    };

    validate_http_endpoint("EMBEDDING_ENDPOINT", &cfg.endpoint)?;
    Ok(Some(cfg))
}

/// Retry policy from the process environment.
pub fn retry_policy() -> Result<RetryPolicy> {
    retry_policy_from(&process_env)
}

/// Retry policy from an arbitrary lookup.
pub fn retry_policy_from(get: Lookup<'_>) -> Result<RetryPolicy> {
    let attempts = opt_u32(get, "LLM_RETRY_ATTEMPTS")?.unwrap_or(3);
    if attempts == 0 || attempts > 10 {
        return Err(ConfigError::OutOfRange {
            field: "LLM_RETRY_ATTEMPTS",
            detail: "expected 1..=10",
        }
        .into());
    }
    Ok(RetryPolicy {
        max_attempts: attempts,
        base_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::AiLlmError;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn hosted_provider_requires_api_key() {
        let get = lookup(&[]);
        let err = config_generation_from(&get).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("LLM_API_KEY or GROQ_API_KEY"))
        ));
    }

    #[test]
    fn groq_key_alias_and_defaults() {
        let get = lookup(&[("GROQ_API_KEY", "gsk-test")]);
        let cfg = config_generation_from(&get).unwrap();
        assert_eq!(cfg.provider, LlmProvider::OpenAI);
        assert_eq!(cfg.endpoint, DEFAULT_HOSTED_ENDPOINT);
        assert_eq!(cfg.model, DEFAULT_HOSTED_MODEL);
        assert_eq!(cfg.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(cfg.max_tokens, Some(4096));
        assert_eq!(cfg.temperature, Some(0.1));
    }

    #[test]
    fn ollama_needs_no_key() {
        let get = lookup(&[("LLM_PROVIDER", "ollama"), ("LLM_MODEL", "qwen3:14b")]);
        let cfg = config_generation_from(&get).unwrap();
        assert_eq!(cfg.provider, LlmProvider::Ollama);
        assert_eq!(cfg.endpoint, DEFAULT_OLLAMA_ENDPOINT);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn rejects_bad_temperature_and_provider() {
        let get = lookup(&[("LLM_API_KEY", "k"), ("LLM_TEMPERATURE", "7")]);
        assert!(config_generation_from(&get).is_err());

        let get = lookup(&[("LLM_PROVIDER", "anthropic")]);
        assert!(matches!(
            config_generation_from(&get),
            Err(AiLlmError::Config(ConfigError::UnsupportedProvider(_)))
        ));
    }

    #[test]
    fn hash_embeddings_have_no_profile() {
        assert!(config_embedding_from(&lookup(&[])).unwrap().is_none());
        let get = lookup(&[("EMBEDDING_PROVIDER", "ollama")]);
        let cfg = config_embedding_from(&get).unwrap().unwrap();
        assert_eq!(cfg.model, "all-minilm");
    }

    #[test]
    fn retry_attempts_bounds() {
        assert_eq!(retry_policy_from(&lookup(&[])).unwrap().max_attempts, 3);
        assert!(retry_policy_from(&lookup(&[("LLM_RETRY_ATTEMPTS", "0")])).is_err());
    }
}
