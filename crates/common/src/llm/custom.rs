//! Self-hosted completion endpoint

use super::prompts::completion_prompt;
use super::{error_for_status, GenerationOptions, LlmProvider, LlmRequest};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Shortest string field accepted when the response has no known shape
const MIN_FREEFORM_CHARS: usize = 20;

#[derive(Serialize)]
struct CompletionRequest {
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

pub struct CustomEndpoint {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    options: GenerationOptions,
}

impl CustomEndpoint {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            options,
        }
    }
}

/// Known response fields first, then any long string field
pub fn parse_completion_response(value: &Value) -> Option<String> {
    let known = ["/choices/0/message/content", "/choices/0/text", "/response"]
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str));

    let text = known.or_else(|| {
        value.as_object().and_then(|map| {
            map.values()
                .filter_map(Value::as_str)
                .find(|s| s.chars().count() > MIN_FREEFORM_CHARS)
        })
    });

    text.map(String::from).filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl LlmProvider for CustomEndpoint {
    fn name(&self) -> &str {
        "custom"
    }

    async fn attempt(&self, request: &LlmRequest) -> Result<String> {
        let prompt = format!(
            "{}\n\nResponse:",
            completion_prompt(request.prompt_type, &request.query, &request.context)
        );
        let body = CompletionRequest {
            prompt,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| AppError::LlmProvider {
            provider: self.name().to_string(),
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            return Err(error_for_status(self.name(), response).await);
        }

        let value: Value = response.json().await.map_err(|e| AppError::InvalidProviderResponse {
            provider: self.name().to_string(),
            message: e.to_string(),
        })?;

        parse_completion_response(&value).ok_or_else(|| AppError::InvalidProviderResponse {
            provider: self.name().to_string(),
            message: "No usable text in response".to_string(),
        })
    }
}
