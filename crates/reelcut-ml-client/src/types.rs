//! Request and response types for the service clients.

use serde::{Deserialize, Serialize};

use reelcut_models::{SentimentLabel, TranscriptSegment};

/// Transcript of one audio file, with chunk-relative timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// `verbose_json` transcription response.
#[derive(Debug, Deserialize)]
pub(crate) struct VerboseTranscription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerboseSegment {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
}

impl From<VerboseTranscription> for Transcription {
    fn from(raw: VerboseTranscription) -> Self {
        Self {
            text: raw.text.trim().to_string(),
            segments: raw
                .segments
                .into_iter()
                .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
                .collect(),
        }
    }
}

/// Sentiment of one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Confidence in [0, 1]
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SentimentRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentResponse {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicsRequest<'a> {
    pub documents: &'a [String],
    pub num_topics: usize,
    pub num_keywords: usize,
}

/// Topic model output: one keyword list per topic.
#[derive(Debug, Deserialize)]
pub(crate) struct TopicsResponse {
    #[serde(default)]
    pub topics: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
