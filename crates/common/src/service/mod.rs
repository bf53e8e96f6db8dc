//! Analysis service
//!
//! Chooses between the external model chain and the local engine for each
//! capability. Provider failures and unusable responses are logged, counted
//! and answered locally; callers always get a result.

mod mindmap;
mod simplify;
mod summary;

pub use mindmap::{extract_mindmap_json, local_mindmap, MindMapNode, DEFAULT_TITLE, ROOT_ID};
pub use simplify::simplify_rules;
pub use summary::{extractive_summary, limit_words, local_summary, Complexity, SummaryOptions};

use crate::config::AppConfig;
use crate::context::AnalysisEngine;
use crate::document::{truncate_chars, Document};
use crate::errors::Result;
use crate::llm::{build_providers, LlmProvider, LlmRequest, PromptType};
use crate::metrics::{record_fallback, record_llm_attempt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Source name reported for locally generated results
pub const LOCAL_SOURCE: &str = "local";

pub const EMPTY_SIMPLIFY_INPUT: &str = "No text provided for simplification.";

/// Responses at or below this length are rejected for chat, simplify and mind-map
const MIN_RESPONSE_CHARS: usize = 20;

/// Marker a provider uses when it answers with an error message instead of content
const ERROR_MARKER: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Summarize,
    Chat,
    Simplify,
    Mindmap,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Summarize => "summarize",
            Capability::Chat => "chat",
            Capability::Simplify => "simplify",
            Capability::Mindmap => "mindmap",
        }
    }

    fn prompt_type(&self) -> PromptType {
        match self {
            Capability::Summarize => PromptType::Summarization,
            Capability::Chat => PromptType::PdfAnalysis,
            Capability::Simplify => PromptType::Simplification,
            Capability::Mindmap => PromptType::Mindmap,
        }
    }

    fn min_response_chars(&self) -> usize {
        match self {
            Capability::Summarize => 0,
            _ => MIN_RESPONSE_CHARS,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result and the provider (or `local`) that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated<T> {
    pub value: T,
    pub source: String,
}

impl<T> Generated<T> {
    fn local(value: T) -> Self {
        Self {
            value,
            source: LOCAL_SOURCE.to_string(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.source == LOCAL_SOURCE
    }
}

/// Chat answer with the pages of the passages it drew on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatAnswer {
    pub response: String,
    pub pages: Vec<u32>,
    pub source: String,
}

/// Shared, immutable analysis service
pub struct AnalysisService {
    engine: AnalysisEngine,
    providers: Vec<Arc<dyn LlmProvider>>,
    max_context_chars: usize,
    top_passages: usize,
    rng: Mutex<StdRng>,
}

impl AnalysisService {
    /// Build the service and its provider chain from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let providers = build_providers(&config.llm)?;
        Ok(Self::with_providers(config, providers))
    }

    /// Build the service around an explicit provider chain
    pub fn with_providers(config: &AppConfig, providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        let rng = match config.analysis.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            engine: AnalysisEngine::new(config.scoring_weights()),
            providers,
            max_context_chars: config.llm.max_context_chars,
            top_passages: config.analysis.top_passages.max(1),
            rng: Mutex::new(rng),
        }
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    fn context(&self, text: &str) -> String {
        truncate_chars(text, self.max_context_chars).to_string()
    }

    /// Try each provider in order; the first response `accept` keeps wins
    async fn generate<T>(
        &self,
        capability: Capability,
        request: LlmRequest,
        accept: impl Fn(&str) -> Option<T>,
    ) -> Option<Generated<T>> {
        if self.providers.is_empty() {
            record_fallback(capability.as_str(), "no_providers");
            tracing::debug!(capability = %capability, "No external providers, using local engine");
            return None;
        }

        for provider in &self.providers {
            let started = Instant::now();
            let outcome = provider.attempt(&request).await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(text) => {
                    let accepted = usable_response(&text, capability.min_response_chars())
                        .then(|| accept(&text))
                        .flatten();

                    match accepted {
                        Some(value) => {
                            record_llm_attempt(provider.name(), capability.as_str(), "success", elapsed);
                            tracing::info!(
                                provider = %provider.name(),
                                capability = %capability,
                                elapsed_secs = elapsed,
                                "External model answered"
                            );
                            return Some(Generated {
                                value,
                                source: provider.name().to_string(),
                            });
                        }
                        None => {
                            record_llm_attempt(provider.name(), capability.as_str(), "invalid", elapsed);
                            tracing::warn!(
                                provider = %provider.name(),
                                capability = %capability,
                                response_chars = text.chars().count(),
                                "Discarding unusable provider response"
                            );
                        }
                    }
                }
                Err(e) => {
                    record_llm_attempt(provider.name(), capability.as_str(), "error", elapsed);
                    tracing::warn!(
                        provider = %provider.name(),
                        capability = %capability,
                        error = %e,
                        "Provider call failed"
                    );
                }
            }
        }

        record_fallback(capability.as_str(), "providers_failed");
        tracing::warn!(capability = %capability, "All providers failed, using local engine");
        None
    }

    /// Summarize a document at the requested complexity
    pub async fn summarize(&self, document: &Document, options: SummaryOptions) -> Generated<String> {
        let mut query = format!(
            "Create a {} summary of the following document content.",
            options.complexity
        );
        if let Some(max) = options.max_length.filter(|m| *m > 0) {
            query.push_str(&format!(" Keep it under {} words.", max));
        }

        let request = LlmRequest::new(query, self.context(&document.full_text()), Capability::Summarize.prompt_type());
        if let Some(generated) = self
            .generate(Capability::Summarize, request, |text| Some(text.trim().to_string()))
            .await
        {
            return generated;
        }

        Generated::local(local_summary(&document.plain_text(), options))
    }

    /// Answer a question about a document
    pub async fn chat(&self, document: &Document, message: &str) -> ChatAnswer {
        let passages = document.passages();
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();

        let relevant: Vec<usize> = self
            .engine
            .rank_passages(message, &texts)
            .into_iter()
            .filter(|scored| scored.score > 0.0)
            .take(self.top_passages)
            .map(|scored| scored.index)
            .collect();

        let pages: Vec<u32> = relevant
            .iter()
            .map(|&i| passages[i].page)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let request = LlmRequest::new(message, self.context(&document.full_text()), Capability::Chat.prompt_type());
        if let Some(generated) = self
            .generate(Capability::Chat, request, |text| Some(text.trim().to_string()))
            .await
        {
            return ChatAnswer {
                response: generated.value,
                pages,
                source: generated.source,
            };
        }

        let used: Vec<&str> = relevant.iter().map(|&i| texts[i]).collect();
        let response = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.engine.generate_answer(message, &used, &mut *rng)
        };

        ChatAnswer {
            response,
            pages,
            source: LOCAL_SOURCE.to_string(),
        }
    }

    /// Rewrite text in plainer language
    pub async fn simplify(&self, text: &str) -> Generated<String> {
        if text.trim().is_empty() {
            return Generated::local(EMPTY_SIMPLIFY_INPUT.to_string());
        }

        let request = LlmRequest::new(
            "Simplify the following text to make it more accessible and easier to understand while preserving the meaning.",
            self.context(text),
            Capability::Simplify.prompt_type(),
        );
        if let Some(generated) = self
            .generate(Capability::Simplify, request, |text| Some(text.trim().to_string()))
            .await
        {
            return generated;
        }

        Generated::local(simplify_rules(text))
    }

    /// Build a mind map of the document's main concepts
    pub async fn mindmap(&self, document: &Document) -> Generated<MindMapNode> {
        let request = LlmRequest::new(
            "Create a hierarchical mindmap of the main concepts and ideas in this document. \
             Return the result as a properly formatted JSON structure.",
            self.context(&document.full_text()),
            Capability::Mindmap.prompt_type(),
        );
        if let Some(generated) = self
            .generate(Capability::Mindmap, request, extract_mindmap_json)
            .await
        {
            return generated;
        }

        Generated::local(local_mindmap(&document.plain_text(), self.engine.preprocessor()))
    }
}

fn usable_response(text: &str, min_chars: usize) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !trimmed.starts_with(ERROR_MARKER) && trimmed.chars().count() > min_chars
}
