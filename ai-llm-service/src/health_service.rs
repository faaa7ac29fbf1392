//! Health probes for LLM backends (Ollama, OpenAI-compatible).
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI-compatible: `GET {endpoint}/v1/models` with Bearer auth
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a diagnostic endpoint.
//! [`HealthService::check`] never fails: errors are mapped to `ok=false`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama", "OpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model the probe looked for.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Model listing shapes of both providers, decoded leniently.
#[derive(Deserialize)]
struct ModelListing {
    #[serde(default)]
    models: Vec<NamedModel>,
    #[serde(default)]
    data: Vec<NamedModel>,
}

#[derive(Deserialize)]
struct NamedModel {
    #[serde(alias = "id")]
    name: String,
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        debug!(default_timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks one config. Any failure becomes `HealthStatus { ok: false, .. }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let base = cfg.base_url();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            warn!(provider = ?cfg.provider, endpoint = %cfg.endpoint, "invalid endpoint");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let started = Instant::now();
        let status = match self.probe(cfg).await {
            Ok(listing) => {
                let latency = started.elapsed().as_millis();
                let names = listing.models.iter().chain(listing.data.iter());
                let mut any = false;
                let mut found = false;
                for m in names {
                    any = true;
                    // Ollama tags carry ":latest" when the model was pulled without a tag.
                    if m.name == cfg.model || m.name.split(':').next() == Some(cfg.model.as_str()) {
                        found = true;
                        break;
                    }
                }
                match (any, found) {
                    (_, true) => HealthStatus::new(cfg, true, latency, "reachable; model is available"),
                    (false, false) => {
                        HealthStatus::new(cfg, true, latency, "reachable; model list is empty")
                    }
                    (true, false) => {
                        HealthStatus::new(cfg, false, latency, "reachable, but model not listed")
                    }
                }
            }
            Err(e) => HealthStatus::new(cfg, false, started.elapsed().as_millis(), e.to_string()),
        };

        info!(
            provider = %status.provider,
            endpoint = %status.endpoint,
            ok = status.ok,
            latency_ms = status.latency_ms as u64,
            "health probe completed"
        );
        status
    }

    /// Checks several configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn probe(&self, cfg: &LlmModelConfig) -> Result<ModelListing, AiLlmError> {
        let url = match cfg.provider {
            LlmProvider::Ollama => format!("{}/api/tags", cfg.base_url()),
            LlmProvider::OpenAI => format!("{}/v1/models", cfg.base_url()),
        };
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout);

        let mut req = self.client.get(&url).timeout(timeout);
        if let Some(key) = cfg.api_key.as_deref() {
            let value = header::HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;
            req = req.header(header::AUTHORIZATION, value);
        }

        debug!(provider = ?cfg.provider, "GET {}", url);
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(HealthError::HttpStatus(HttpError { status, url, snippet }).into());
        }

        resp.json::<ModelListing>()
            .await
            .map_err(|e| HealthError::Decode(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_endpoint_is_reported_not_raised() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "m".into(),
            endpoint: "localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let st = svc.check(&cfg).await;
        assert!(!st.ok);
        assert_eq!(st.provider, "Ollama");
    }

    #[test]
    fn listing_accepts_both_shapes() {
        let o: ModelListing = serde_json::from_str(r#"{"models":[{"name":"all-minilm:latest"}]}"#).unwrap();
        assert_eq!(o.models[0].name, "all-minilm:latest");
        let g: ModelListing = serde_json::from_str(r#"{"data":[{"id":"llama-3.1-70b-versatile"}]}"#).unwrap();
        assert_eq!(g.data[0].name, "llama-3.1-70b-versatile");
    }
}
