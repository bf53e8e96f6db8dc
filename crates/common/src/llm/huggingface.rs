//! Hugging Face inference API

use super::prompts::completion_prompt;
use super::{error_for_status, GenerationOptions, LlmProvider, LlmRequest};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct InferenceParameters {
    temperature: f32,
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

pub struct HuggingFace {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    options: GenerationOptions,
}

impl HuggingFace {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        endpoint: String,
        options: GenerationOptions,
    ) -> Self {
        Self {
            client,
            api_key,
            endpoint,
            options,
        }
    }
}

/// Pull generated text out of the response shapes the inference API uses
pub fn parse_inference_response(value: &Value) -> Option<String> {
    let text = match value {
        Value::Array(items) => items.first().and_then(|first| {
            first
                .get("generated_text")
                .and_then(Value::as_str)
                .map(String::from)
        }),
        Value::Object(map) => map
            .get("generated_text")
            .or_else(|| map.get("text"))
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| {
                value
                    .pointer("/choices/0/message/content")
                    .and_then(Value::as_str)
                    .map(String::from)
            }),
        _ => None,
    };
    text.filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl LlmProvider for HuggingFace {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn attempt(&self, request: &LlmRequest) -> Result<String> {
        let body = InferenceRequest {
            inputs: completion_prompt(request.prompt_type, &request.query, &request.context),
            parameters: InferenceParameters {
                temperature: self.options.temperature,
                max_new_tokens: self.options.max_tokens,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Use-Cache", "false")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmProvider {
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

        parse_inference_response(&value).ok_or_else(|| AppError::InvalidProviderResponse {
            provider: self.name().to_string(),
            message: "No generated text in response".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_list_shape() {
        let value = json!([{ "generated_text": "Summary text" }]);
        assert_eq!(parse_inference_response(&value).as_deref(), Some("Summary text"));
    }

    #[test]
    fn test_parse_object_shapes() {
        assert_eq!(
            parse_inference_response(&json!({ "generated_text": "a" })).as_deref(),
            Some("a")
        );
        assert_eq!(
            parse_inference_response(&json!({ "text": "b" })).as_deref(),
            Some("b")
        );
        assert_eq!(
            parse_inference_response(&json!({ "choices": [{ "message": { "content": "c" } }] }))
                .as_deref(),
            Some("c")
        );
    }

    #[test]
    fn test_parse_unusable_shapes() {
        assert!(parse_inference_response(&json!({ "error": "Model is loading" })).is_none());
        assert!(parse_inference_response(&json!([])).is_none());
        assert!(parse_inference_response(&json!([{ "generated_text": "  " }])).is_none());
        assert!(parse_inference_response(&json!("plain")).is_none());
    }
}
