//! Shared LLM access layer.
//!
//! - [`llm_client::LlmClient`]: generation + optional embedding profile with bounded retry.
//! - [`generation::TextGenerator`]: the seam other crates depend on (fakeable in tests).
//! - [`health_service::HealthService`]: provider probes for diagnostics.
//! - [`telemetry`]: library-scoped tracing layer.

pub mod config;
pub mod error_handler;
pub mod generation;
pub mod health_service;
pub mod llm_client;
pub mod retry;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, Result};
pub use generation::{GenerationParams, TextGenerator};
pub use llm_client::{LlmClient, UsageStats};
pub use retry::RetryPolicy;
