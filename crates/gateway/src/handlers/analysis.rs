//! Summarize, chat, simplify and mind-map handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use pdfintellect_common::{
    errors::{AppError, Result},
    service::{Complexity, MindMapNode, SummaryOptions},
};

#[derive(Debug, Deserialize, Validate)]
pub struct SummarizeRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,

    #[serde(default)]
    pub complexity: Complexity,

    /// Maximum summary length in words
    #[validate(range(min = 1, max = 10000))]
    pub max_length: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,

    #[validate(length(min = 1, max = 4000))]
    pub message: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SimplifyRequest {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub filename: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100000))]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MindmapRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub summary: String,
    pub filename: String,
    pub complexity: Complexity,
    pub source: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub status: String,
    pub pages: Vec<u32>,
    pub source: String,
}

#[derive(Serialize)]
pub struct SimplifyResponse {
    pub simplified: String,
    pub status: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct MindmapResponse {
    pub success: bool,
    pub mindmap: MindMapNode,
    pub source: String,
}

fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: e.field_errors().keys().next().map(|field| field.to_string()),
    })
}

/// Summarize an uploaded PDF
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>> {
    validate(&request)?;

    let document = state.store.load(&request.filename).await?;
    let options = SummaryOptions {
        complexity: request.complexity,
        max_length: request.max_length,
    };
    let summary = state.service.summarize(&document, options).await;

    tracing::info!(
        file = %request.filename,
        complexity = %request.complexity,
        source = %summary.source,
        "Summary generated"
    );

    Ok(Json(SummarizeResponse {
        success: true,
        summary: summary.value,
        filename: request.filename,
        complexity: request.complexity,
        source: summary.source,
    }))
}

/// Answer a question about an uploaded PDF
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    validate(&request)?;

    let document = state.store.load(&request.filename).await?;
    let answer = state.service.chat(&document, &request.message).await;

    tracing::info!(
        file = %request.filename,
        pages = ?answer.pages,
        source = %answer.source,
        "Chat answered"
    );

    Ok(Json(ChatResponse {
        response: answer.response,
        status: "success".to_string(),
        pages: answer.pages,
        source: answer.source,
    }))
}

/// Simplify the given text, or the text of an uploaded PDF
pub async fn simplify(
    State(state): State<AppState>,
    Json(request): Json<SimplifyRequest>,
) -> Result<Json<SimplifyResponse>> {
    validate(&request)?;

    let text = match (request.text, request.filename) {
        (Some(text), _) if !text.trim().is_empty() => text,
        (_, Some(filename)) if !filename.trim().is_empty() => {
            state.store.load(&filename).await?.plain_text()
        }
        _ => String::new(),
    };

    let simplified = state.service.simplify(&text).await;

    Ok(Json(SimplifyResponse {
        simplified: simplified.value,
        status: "success".to_string(),
        source: simplified.source,
    }))
}

/// Build a mind map of an uploaded PDF
pub async fn generate_mindmap(
    State(state): State<AppState>,
    Json(request): Json<MindmapRequest>,
) -> Result<Json<MindmapResponse>> {
    validate(&request)?;

    let document = state.store.load(&request.filename).await?;
    let mindmap = state.service.mindmap(&document).await;

    tracing::info!(
        file = %request.filename,
        topics = mindmap.value.children().len(),
        source = %mindmap.source,
        "Mind map generated"
    );

    Ok(Json(MindmapResponse {
        success: true,
        mindmap: mindmap.value,
        source: mindmap.source,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_request_defaults() {
        let request: SummarizeRequest =
            serde_json::from_str(r#"{"filename": "paper.pdf"}"#).unwrap();
        assert_eq!(request.complexity, Complexity::Standard);
        assert!(request.max_length.is_none());
        assert!(validate(&request).is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let request = ChatRequest {
            filename: "paper.pdf".into(),
            message: String::new(),
        };
        let err = validate(&request).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "message"));

        let request: SummarizeRequest =
            serde_json::from_str(r#"{"filename": "paper.pdf", "max_length": 0}"#).unwrap();
        assert!(validate(&request).is_err());
    }

    #[test]
    fn test_simplify_request_optional_fields() {
        let request: SimplifyRequest = serde_json::from_str("{}").unwrap();
        assert!(request.text.is_none());
        assert!(request.filename.is_none());
        assert!(validate(&request).is_ok());
    }
}
