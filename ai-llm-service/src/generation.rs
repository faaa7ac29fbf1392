//! Provider-agnostic text generation seam.

use std::{future::Future, pin::Pin};

use crate::error_handler::Result;

/// Per-call overrides of the profile's sampling defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Anything that turns a `(system, prompt)` pair into raw text.
///
/// Implemented by [`crate::LlmClient`]; tests provide scripted fakes.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        system: Option<&'a str>,
        prompt: &'a str,
        params: GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Model identifier used for logging and response metadata.
    fn model_name(&self) -> &str;
}
