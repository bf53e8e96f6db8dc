//! OpenAI-compatible chat completions (OpenAI, Mistral)

use super::prompts::{system_prompt, user_message};
use super::{error_for_status, GenerationOptions, LlmProvider, LlmRequest};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Client for any endpoint that speaks the chat-completions format
pub struct OpenAiCompatible {
    name: String,
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    options: GenerationOptions,
}

impl OpenAiCompatible {
    pub fn new(
        name: impl Into<String>,
        client: reqwest::Client,
        api_key: String,
        endpoint: String,
        model: String,
        options: GenerationOptions,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            api_key,
            endpoint,
            model,
            options,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatible {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, request: &LlmRequest) -> Result<String> {
        let user = user_message(&request.query, &request.context);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(request.prompt_type),
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        debug!(provider = %self.name, model = %self.model, "Calling chat completions");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmProvider {
                provider: self.name.clone(),
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(error_for_status(&self.name, response).await);
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| AppError::InvalidProviderResponse {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::InvalidProviderResponse {
                provider: self.name.clone(),
                message: "No choices in response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{http_client, PromptType};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::time::Duration;

    /// Serve `router` on an ephemeral port and return its base URL
    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(endpoint: String) -> OpenAiCompatible {
        OpenAiCompatible::new(
            "mistral",
            http_client(Duration::from_secs(5)).unwrap(),
            "test-key".into(),
            endpoint,
            "mistral-large-latest".into(),
            GenerationOptions {
                temperature: 0.3,
                max_tokens: 100,
            },
        )
    }

    #[tokio::test]
    async fn test_reads_first_choice() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "mistral-large-latest");
                assert_eq!(body["messages"][0]["role"], "system");
                let user = body["messages"][1]["content"].as_str().unwrap_or_default();
                assert!(user.starts_with("Document content:"));
                Json(serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "A grounded answer." } }]
                }))
            }),
        );
        let base = spawn(router).await;

        let request = LlmRequest::new("What is it?", "Some document", PromptType::PdfAnalysis);
        let answer = provider(format!("{}/v1/chat/completions", base))
            .attempt(&request)
            .await
            .unwrap();
        assert_eq!(answer, "A grounded answer.");
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        );
        let base = spawn(router).await;

        let request = LlmRequest::new("q", "ctx", PromptType::Summarization);
        let err = provider(format!("{}/v1/chat/completions", base))
            .attempt(&request)
            .await
            .unwrap_err();
        match err {
            AppError::LlmProvider { provider, message } => {
                assert_eq!(provider, "mistral");
                assert!(message.contains("401"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(serde_json::json!({ "choices": [] })) }),
        );
        let base = spawn(router).await;

        let request = LlmRequest::new("q", "ctx", PromptType::Simplification);
        let err = provider(format!("{}/v1/chat/completions", base))
            .attempt(&request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidProviderResponse { .. }));
    }
}
