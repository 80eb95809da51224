//! Clients for the external services the pipeline consumes.
//!
//! - Speech-to-text over an OpenAI-compatible `audio/transcriptions` API
//! - Sentiment classification and topic extraction over a small HTTP ML service
//! - Highlight suggestions over an OpenAI-compatible `chat/completions` API
//!
//! Each concern is exposed as a trait in [`services`] so the pipeline can
//! run against fakes.

pub mod config;
pub mod error;
pub mod retry;
pub mod sentiment;
pub mod services;
pub mod suggestion;
pub mod transcription;
pub mod types;

pub use config::MlClientConfig;
pub use error::{MlError, MlResult};
pub use sentiment::SentimentClient;
pub use services::{SentimentService, SuggestionService, TranscriptionService};
pub use suggestion::ChatSuggester;
pub use transcription::OpenAiTranscriber;
pub use types::{Sentiment, Transcription};
