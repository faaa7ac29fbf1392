//! Shared LLM client with two profiles: **generation** and optional **embedding**.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Every call goes through the [`RetryPolicy`]; transient failures that outlive
//!   the budget surface as [`crate::AiLlmError::Unavailable`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{GenerationParams, LlmClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let llm = Arc::new(LlmClient::from_env()?);
//!     let txt = llm
//!         .generate(Some("You are terse."), "Say hi", GenerationParams::default())
//!         .await?;
//!     println!("{txt}");
//!     Ok(())
//! }
//! ```

use std::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::{default_config, llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, Result},
    generation::{GenerationParams, TextGenerator},
    health_service::{HealthService, HealthStatus},
    retry::RetryPolicy,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Concrete provider client behind a profile.
#[derive(Debug)]
enum Backend {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
}

impl Backend {
    fn new(cfg: &LlmModelConfig) -> Result<Self> {
        Ok(match cfg.provider {
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => Backend::OpenAI(OpenAiService::new(cfg.clone())?),
        })
    }

    async fn generate(&self, prompt: &str, system: Option<&str>, p: GenerationParams) -> Result<String> {
        match self {
            Backend::Ollama(s) => s.generate(prompt, system, p).await,
            Backend::OpenAI(s) => s.generate(prompt, system, p).await,
        }
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        match self {
            Backend::Ollama(s) => s.embeddings(input).await,
            Backend::OpenAI(s) => s.embeddings(input).await,
        }
    }
}

/// Snapshot of client usage counters.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct UsageStats {
    pub generate_requests: u64,
    pub embed_requests: u64,
    pub retries: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    generate_requests: AtomicU64,
    embed_requests: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

/// Shared client for generation and embeddings.
pub struct LlmClient {
    generation: LlmModelConfig,
    embedding: Option<LlmModelConfig>,
    gen_backend: Backend,
    embed_backend: Option<Backend>,
    retry: RetryPolicy,
    health: HealthService,
    counters: Counters,
}

impl LlmClient {
    /// Creates a client from explicit profiles.
    ///
    /// # Errors
    /// Propagates provider validation errors (missing key, bad endpoint).
    pub fn new(
        generation: LlmModelConfig,
        embedding: Option<LlmModelConfig>,
        retry: RetryPolicy,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let gen_backend = Backend::new(&generation)?;
        let embed_backend = embedding.as_ref().map(Backend::new).transpose()?;
        Ok(Self {
            generation,
            embedding,
            gen_backend,
            embed_backend,
            retry,
            health: HealthService::new(health_timeout_secs)?,
            counters: Counters::default(),
        })
    }

    /// Creates a client from environment (see [`default_config`]).
    ///
    /// # Errors
    /// A missing hosted API key is reported here; treat it as fatal at startup.
    pub fn from_env() -> Result<Self> {
        Self::new(
            default_config::config_generation()?,
            default_config::config_embedding()?,
            default_config::retry_policy()?,
            None,
        )
    }

    /// Generates text with the generation profile under the retry policy.
    pub async fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String> {
        self.counters.generate_requests.fetch_add(1, Ordering::Relaxed);
        let out = self
            .retry
            .run(
                "generate",
                || self.gen_backend.generate(prompt, system, params),
                || {
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                },
            )
            .await;
        self.record(&out, "generate");
        out
    }

    /// Computes an embedding with the embedding profile under the retry policy.
    ///
    /// # Errors
    /// [`ConfigError::NoEmbeddingProfile`] when embeddings are computed locally.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        let backend = self
            .embed_backend
            .as_ref()
            .ok_or(ConfigError::NoEmbeddingProfile)?;
        self.counters.embed_requests.fetch_add(1, Ordering::Relaxed);
        let out = self
            .retry
            .run(
                "embed",
                || backend.embed(input),
                || {
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                },
            )
            .await;
        self.record(&out, "embed");
        out
    }

    /// Health snapshot for every distinct profile.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.generation.clone()];
        if let Some(e) = &self.embedding {
            if e != &self.generation {
                list.push(e.clone());
            }
        }
        self.health.check_many(&list).await
    }

    /// `(generation, embedding)` profiles.
    pub fn profiles(&self) -> (&LlmModelConfig, Option<&LlmModelConfig>) {
        (&self.generation, self.embedding.as_ref())
    }

    pub fn has_embedding_profile(&self) -> bool {
        self.embed_backend.is_some()
    }

    pub fn usage(&self) -> UsageStats {
        UsageStats {
            generate_requests: self.counters.generate_requests.load(Ordering::Relaxed),
            embed_requests: self.counters.embed_requests.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn record<T>(&self, out: &Result<T>, op: &'static str) {
        match out {
            Ok(_) => debug!(op, model = %self.generation.model, "llm call succeeded"),
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(op, error = %e, unavailable = e.is_unavailable(), "llm call failed");
            }
        }
    }
}

impl TextGenerator for LlmClient {
    fn generate<'a>(
        &'a self,
        system: Option<&'a str>,
        prompt: &'a str,
        params: GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(LlmClient::generate(self, system, prompt, params))
    }

    fn model_name(&self) -> &str {
        &self.generation.model
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("generation_model", &self.generation.model)
            .field("embedding_model", &self.embedding.as_ref().map(|e| &e.model))
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::AiLlmError;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(1),
        }
    }

    #[tokio::test]
    async fn embed_without_profile_is_config_error() {
        let c = LlmClient::new(ollama("gen"), None, RetryPolicy::none(), Some(1)).unwrap();
        assert!(!c.has_embedding_profile());
        let err = c.embed("x").await.unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::NoEmbeddingProfile)));
        assert_eq!(c.usage().embed_requests, 0);
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_as_unavailable() {
        let retry = RetryPolicy {
            max_attempts: 2,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(1),
        };
        let c = LlmClient::new(ollama("gen"), None, retry, Some(1)).unwrap();
        let err = c
            .generate(None, "hello", GenerationParams::default())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        let usage = c.usage();
        assert_eq!(usage.generate_requests, 1);
        assert_eq!(usage.failures, 1);
    }
}
