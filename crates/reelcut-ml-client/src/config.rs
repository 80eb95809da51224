//! Client configuration.

use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SENTIMENT_URL: &str = "http://localhost:8001";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_SUGGESTION_MODELS: &[&str] = &["gpt-4-1106-preview", "gpt-4o-mini"];
/// Retry counts above this are clamped.
pub const MAX_RETRIES: u32 = 10;

/// Configuration shared by the service clients.
#[derive(Clone)]
pub struct MlClientConfig {
    /// Base URL of the OpenAI-compatible API (transcription and chat)
    pub openai_base_url: String,
    /// Bearer token for the OpenAI-compatible API
    pub api_key: Option<String>,
    /// Speech-to-text model
    pub transcription_model: String,
    /// Optional ISO-639-1 language hint for transcription
    pub transcription_language: Option<String>,
    /// Chat models tried in order until one succeeds
    pub suggestion_models: Vec<String>,
    /// Base URL of the sentiment/topic service
    pub sentiment_base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for retryable failures
    pub max_retries: u32,
}

impl std::fmt::Debug for MlClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlClientConfig")
            .field("openai_base_url", &self.openai_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("transcription_model", &self.transcription_model)
            .field("transcription_language", &self.transcription_language)
            .field("suggestion_models", &self.suggestion_models)
            .field("sentiment_base_url", &self.sentiment_base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            transcription_language: None,
            suggestion_models: DEFAULT_SUGGESTION_MODELS.iter().map(|m| m.to_string()).collect(),
            sentiment_base_url: DEFAULT_SENTIMENT_URL.to_string(),
            timeout: Duration::from_secs(300), // long uploads
            max_retries: 2,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            transcription_model: std::env::var("TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.transcription_model),
            transcription_language: std::env::var("TRANSCRIPTION_LANGUAGE")
                .ok()
                .filter(|l| !l.trim().is_empty()),
            suggestion_models: std::env::var("SUGGESTION_MODELS")
                .ok()
                .map(|s| parse_model_list(&s))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.suggestion_models),
            sentiment_base_url: std::env::var("SENTIMENT_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.sentiment_base_url),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| parse_retries(&s))
                .unwrap_or(2),
        }
    }
}

/// Parse a comma-separated model list, dropping blanks.
pub fn parse_model_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a retry count, clamped to [`MAX_RETRIES`].
pub fn parse_retries(s: &str) -> Option<u32> {
    s.trim()
        .parse::<u64>()
        .ok()
        .map(|n| n.min(u64::from(MAX_RETRIES)) as u32)
}
