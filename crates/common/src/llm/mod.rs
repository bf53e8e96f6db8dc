//! External language model providers
//!
//! Provides a unified interface over:
//! - OpenAI-compatible chat completions (OpenAI, Mistral)
//! - Hugging Face inference API
//! - A custom completion endpoint
//!
//! Providers make exactly one call per attempt. Retrying and falling back
//! is the caller's decision.

mod custom;
mod huggingface;
mod openai;
pub mod prompts;

pub use custom::CustomEndpoint;
pub use huggingface::HuggingFace;
pub use openai::OpenAiCompatible;

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const MISTRAL_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";
pub const MISTRAL_MODEL: &str = "mistral-large-latest";
pub const HUGGINGFACE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.1";

/// Which system prompt a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    PdfAnalysis,
    Summarization,
    Simplification,
    Mindmap,
}

impl PromptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::PdfAnalysis => "pdf_analysis",
            PromptType::Summarization => "summarization",
            PromptType::Simplification => "simplification",
            PromptType::Mindmap => "mindmap",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The task or question
    pub query: String,
    /// Document text (already truncated)
    pub context: String,
    pub prompt_type: PromptType,
}

impl LlmRequest {
    pub fn new(query: impl Into<String>, context: impl Into<String>, prompt_type: PromptType) -> Self {
        Self {
            query: query.into(),
            context: context.into(),
            prompt_type,
        }
    }
}

/// Sampling parameters shared by every provider
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for GenerationOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Trait for external text generation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs and metrics
    fn name(&self) -> &str;

    /// Make a single generation call
    async fn attempt(&self, request: &LlmRequest) -> Result<String>;
}

/// Build the shared HTTP client with the configured timeout
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Map a non-success response into a provider error
pub(crate) async fn error_for_status(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::LlmProvider {
        provider: provider.to_string(),
        message: format!("{} - {}", status, body.chars().take(300).collect::<String>()),
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Create providers in configured order, skipping unconfigured ones
pub fn build_providers(config: &LlmConfig) -> Result<Vec<Arc<dyn LlmProvider>>> {
    if !config.enabled {
        return Ok(Vec::new());
    }

    let client = http_client(config.timeout())?;
    let options = GenerationOptions::from(config);
    let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

    for name in &config.provider_order {
        let provider: Option<Arc<dyn LlmProvider>> = match name.trim().to_lowercase().as_str() {
            "openai" => present(&config.openai.api_key).map(|key| {
                Arc::new(OpenAiCompatible::new(
                    "openai",
                    client.clone(),
                    key,
                    present(&config.openai.endpoint).unwrap_or_else(|| OPENAI_ENDPOINT.to_string()),
                    present(&config.openai.model).unwrap_or_else(|| OPENAI_MODEL.to_string()),
                    options,
                )) as Arc<dyn LlmProvider>
            }),
            "mistral" => present(&config.mistral.api_key).map(|key| {
                Arc::new(OpenAiCompatible::new(
                    "mistral",
                    client.clone(),
                    key,
                    present(&config.mistral.endpoint).unwrap_or_else(|| MISTRAL_ENDPOINT.to_string()),
                    present(&config.mistral.model).unwrap_or_else(|| MISTRAL_MODEL.to_string()),
                    options,
                )) as Arc<dyn LlmProvider>
            }),
            "huggingface" => present(&config.huggingface.api_key).map(|key| {
                Arc::new(HuggingFace::new(
                    client.clone(),
                    key,
                    present(&config.huggingface.endpoint)
                        .unwrap_or_else(|| HUGGINGFACE_ENDPOINT.to_string()),
                    options,
                )) as Arc<dyn LlmProvider>
            }),
            "custom" => present(&config.custom.endpoint).map(|endpoint| {
                Arc::new(CustomEndpoint::new(
                    client.clone(),
                    endpoint,
                    present(&config.custom.api_key),
                    options,
                )) as Arc<dyn LlmProvider>
            }),
            other => {
                tracing::warn!(provider = %other, "Unknown provider in provider_order, skipping");
                None
            }
        };

        match provider {
            Some(provider) => providers.push(provider),
            None => tracing::debug!(provider = %name, "Provider not configured, skipping"),
        }
    }

    tracing::info!(
        providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
        "External providers ready"
    );

    Ok(providers)
}
