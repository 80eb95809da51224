//! Transcript segment models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A time-stamped span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds (absolute, relative to the source media)
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Segment duration in seconds. Never negative.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Returns a copy shifted by `offset` seconds.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            text: self.text.clone(),
        }
    }
}

/// Sentiment classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }

    /// Lenient parse of classifier output.
    ///
    /// Accepts plain names in any case as well as the `LABEL_0/1/2` and
    /// `POS/NEG/NEU` shapes common to sentiment models. Unknown labels map
    /// to `Neutral`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" | "pos" | "label_2" => SentimentLabel::Positive,
            "negative" | "neg" | "label_0" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transcript segment annotated by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredSegment {
    #[serde(flatten)]
    pub segment: TranscriptSegment,
    /// Sentiment label
    pub label: SentimentLabel,
    /// Classifier confidence in [0, 1]
    pub score: f64,
    /// Corpus-level topic keywords (identical across a transcript)
    #[serde(default)]
    pub topics: Vec<String>,
}

impl ScoredSegment {
    pub fn new(segment: TranscriptSegment, label: SentimentLabel, score: f64) -> Self {
        Self {
            segment,
            label,
            score,
            topics: Vec::new(),
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    pub fn start(&self) -> f64 {
        self.segment.start
    }

    pub fn end(&self) -> f64 {
        self.segment.end
    }

    pub fn duration(&self) -> f64 {
        self.segment.duration()
    }
}
