//! Service traits the pipeline is written against.

use async_trait::async_trait;
use std::path::Path;

use crate::error::MlResult;
use crate::types::{Sentiment, Transcription};

/// Speech-to-text for a single audio file.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe `audio`. Segment times are relative to the file start.
    async fn transcribe(&self, audio: &Path) -> MlResult<Transcription>;
}

/// Sentiment classification and topic extraction.
#[async_trait]
pub trait SentimentService: Send + Sync {
    /// Classify one text. Depends only on `text`.
    async fn classify(&self, text: &str) -> MlResult<Sentiment>;

    /// Extract keywords for `num_topics` topics over the whole corpus,
    /// flattened in topic order.
    async fn extract_topics(
        &self,
        documents: &[String],
        num_topics: usize,
        num_keywords: usize,
    ) -> MlResult<Vec<String>>;
}

/// Free-text highlight suggestions from a language model.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(&self, prompt: &str) -> MlResult<String>;
}
