//! PDF Intellect Common Library
//!
//! Shared code for the PDF Intellect gateway including:
//! - Configuration management
//! - Error types and handling
//! - Metrics and observability
//! - PDF text extraction and upload storage
//! - The local analysis engine (scoring, intents, entities, answer synthesis)
//! - External model providers and the analysis service that falls back locally

pub mod config;
pub mod context;
pub mod document;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod service;

// Re-export commonly used types
pub use config::AppConfig;
pub use document::{Document, Passage, UploadStore};
pub use errors::{AppError, Result};
pub use service::{AnalysisService, ChatAnswer, Complexity, Generated, MindMapNode, SummaryOptions};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
