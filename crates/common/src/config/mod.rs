//! Configuration management for PDF Intellect services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Provider key variables (MISTRAL_API_KEY, HUGGINGFACE_API_KEY, OPENAI_API_KEY)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values

use crate::context::ScoringWeights;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// External model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Local analysis engine configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    /// Directory where uploaded PDFs are stored and served from
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Allowed CORS origins ("*" allows any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Connection settings for one external provider
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// API key (providers without a key are skipped, except `custom`)
    pub api_key: Option<String>,

    /// Endpoint override
    pub endpoint: Option<String>,

    /// Model override
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Use external models at all
    #[serde(default = "default_llm_enabled")]
    pub enabled: bool,

    /// Providers tried in order until one returns a usable response
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Document context sent to providers is truncated to this many chars
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    #[serde(default)]
    pub openai: ProviderSettings,

    #[serde(default)]
    pub mistral: ProviderSettings,

    #[serde(default)]
    pub huggingface: ProviderSettings,

    #[serde(default)]
    pub custom: ProviderSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Weight of the TF-IDF signal
    #[serde(default = "default_tfidf_weight")]
    pub tfidf_weight: f64,

    /// Weight of the Jaccard signal
    #[serde(default = "default_jaccard_weight")]
    pub jaccard_weight: f64,

    /// Weight of the accumulated phrase boost
    #[serde(default = "default_phrase_weight")]
    pub phrase_weight: f64,

    /// Increment per matched query bigram
    #[serde(default = "default_phrase_boost")]
    pub phrase_boost: f64,

    /// Passages handed to the answer synthesizer in local chat
    #[serde(default = "default_top_passages")]
    pub top_passages: usize,

    /// Fixed seed for template selection (random when unset)
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name reported in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per minute across the service
    #[serde(default = "default_rate_limit")]
    pub requests_per_minute: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_upload_size() -> usize { 10 * 1024 * 1024 }
fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_cors_origins() -> Vec<String> { vec!["*".to_string()] }
fn default_llm_enabled() -> bool { true }
fn default_provider_order() -> Vec<String> {
    ["mistral", "huggingface", "openai", "custom"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_temperature() -> f32 { 0.3 }
fn default_max_tokens() -> u32 { 1500 }
fn default_llm_timeout() -> u64 { 30 }
fn default_max_context_chars() -> usize { 10_000 }
fn default_tfidf_weight() -> f64 { 0.6 }
fn default_jaccard_weight() -> f64 { 0.3 }
fn default_phrase_weight() -> f64 { 0.1 }
fn default_phrase_boost() -> f64 { 0.2 }
fn default_top_passages() -> usize { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "pdfintellect".to_string() }
fn default_rate_limit() -> u32 { 20 }
fn default_burst() -> u32 { 20 }
fn default_enabled() -> bool { true }

/// Plain environment variables that seed provider keys
const PROVIDER_KEY_VARS: &[(&str, &str)] = &[
    ("llm.mistral.api_key", "MISTRAL_API_KEY"),
    ("llm.huggingface.api_key", "HUGGINGFACE_API_KEY"),
    ("llm.openai.api_key", "OPENAI_API_KEY"),
];

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Self::with_provider_keys(Config::builder())?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("llm.provider_order")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )

            .build()?;

        config.try_deserialize()
    }

    /// Provider key variables act as defaults so files and APP__ vars still win
    fn with_provider_keys(
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        for (key, var) in PROVIDER_KEY_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    builder = builder.set_default(*key, value)?;
                }
            }
        }
        Ok(builder)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Scoring weights for the relevance scorer
    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights {
            tfidf: self.analysis.tfidf_weight,
            jaccard: self.analysis.jaccard_weight,
            phrase: self.analysis.phrase_weight,
            phrase_boost: self.analysis.phrase_boost,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_upload_size: default_max_upload_size(),
            upload_dir: default_upload_dir(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl LlmConfig {
    /// Per-call timeout for external providers
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_llm_enabled(),
            provider_order: default_provider_order(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
            max_context_chars: default_max_context_chars(),
            openai: ProviderSettings::default(),
            mistral: ProviderSettings::default(),
            huggingface: ProviderSettings::default(),
            custom: ProviderSettings::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tfidf_weight: default_tfidf_weight(),
            jaccard_weight: default_jaccard_weight(),
            phrase_weight: default_phrase_weight(),
            phrase_boost: default_phrase_boost(),
            top_passages: default_top_passages(),
            seed: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_upload_size, 10_485_760);
        assert_eq!(config.llm.provider_order[0], "mistral");
        assert_eq!(config.rate_limit.requests_per_minute, 20);
        assert_eq!(config.llm.timeout(), Duration::from_secs(30));
        assert_eq!(config.observability.service_name, "pdfintellect");
    }

    #[test]
    fn test_default_scoring_weights() {
        let weights = AppConfig::default().scoring_weights();
        assert_eq!(weights, ScoringWeights::default());
        assert!((weights.tfidf - 0.6).abs() < f64::EPSILON);
        assert!((weights.phrase_boost - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_source_deserializes_with_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("llm.enabled", false)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(!config.llm.enabled);
        assert_eq!(config.llm.max_context_chars, 10_000);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert!(config.analysis.seed.is_none());
    }
}
