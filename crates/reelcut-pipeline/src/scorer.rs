//! Segment relevance scoring.

use std::sync::Arc;
use tracing::{debug, info, warn};

use reelcut_ml_client::SentimentService;
use reelcut_models::{ScoredSegment, SentimentLabel, TranscriptSegment};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::metrics;

#[derive(Debug, Clone)]
pub struct ScorerOptions {
    /// Segments with confidence below this are excluded
    pub min_score: f64,
    pub topics_enabled: bool,
    pub num_topics: usize,
    pub num_keywords: usize,
}

impl ScorerOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_score: config.min_sentiment_score,
            topics_enabled: config.topics_enabled,
            num_topics: config.num_topics,
            num_keywords: config.num_keywords,
        }
    }
}

/// Collapse runs of whitespace to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Annotates transcript segments with sentiment and corpus topics.
pub struct SegmentScorer {
    service: Arc<dyn SentimentService>,
    options: ScorerOptions,
}

impl SegmentScorer {
    pub fn new(service: Arc<dyn SentimentService>, options: ScorerOptions) -> Self {
        Self { service, options }
    }

    /// Label and confidence for a single segment. Depends only on its text.
    pub async fn score(&self, segment: &TranscriptSegment) -> PipelineResult<(SentimentLabel, f64)> {
        let sentiment = self.service.classify(&normalize_text(&segment.text)).await?;
        Ok((sentiment.label, sentiment.score))
    }

    /// Score `segments` in order, keeping those at or above the threshold.
    ///
    /// Topics are computed once for the whole transcript and attached to
    /// every kept segment. A topic failure leaves the list empty; a
    /// sentiment failure aborts the call.
    pub async fn score_segments(
        &self,
        segments: &[TranscriptSegment],
    ) -> PipelineResult<Vec<ScoredSegment>> {
        let topics = self.corpus_topics(segments).await;

        let mut kept = Vec::new();
        let mut scored = 0usize;
        for segment in segments {
            if segment.text.trim().is_empty() {
                debug!("Skipping empty segment at {:.2}s", segment.start);
                continue;
            }

            let (label, score) = self.score(segment).await?;
            scored += 1;

            if score < self.options.min_score {
                debug!(
                    "Dropping segment {:.2}-{:.2}s ({} {:.3} < {:.3})",
                    segment.start, segment.end, label, score, self.options.min_score
                );
                continue;
            }

            kept.push(ScoredSegment::new(segment.clone(), label, score).with_topics(topics.clone()));
        }

        info!(
            "Scored {} segments, kept {} at threshold {:.2}",
            scored,
            kept.len(),
            self.options.min_score
        );
        metrics::record_scoring(scored, kept.len());

        Ok(kept)
    }

    async fn corpus_topics(&self, segments: &[TranscriptSegment]) -> Vec<String> {
        if !self.options.topics_enabled {
            return Vec::new();
        }

        let documents: Vec<String> = segments
            .iter()
            .map(|s| normalize_text(&s.text))
            .filter(|t| !t.is_empty())
            .collect();
        if documents.is_empty() {
            return Vec::new();
        }

        match self
            .service
            .extract_topics(&documents, self.options.num_topics, self.options.num_keywords)
            .await
        {
            Ok(topics) => {
                debug!("Corpus topics: {:?}", topics);
                topics
            }
            Err(e) => {
                warn!("Topic extraction failed, continuing without topics: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelcut_ml_client::{MlError, MlResult, Sentiment};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores each text by the number in its first word; fails on "boom".
    struct KeywordSentiment {
        topics_fail: bool,
        topic_calls: AtomicUsize,
    }

    impl KeywordSentiment {
        fn new(topics_fail: bool) -> Self {
            Self {
                topics_fail,
                topic_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SentimentService for KeywordSentiment {
        async fn classify(&self, text: &str) -> MlResult<Sentiment> {
            if text.contains("boom") {
                return Err(MlError::ServiceUnavailable("down".into()));
            }
            let score = text
                .split_whitespace()
                .next()
                .and_then(|w| w.parse().ok())
                .unwrap_or(0.0);
            Ok(Sentiment {
                label: SentimentLabel::Positive,
                score,
            })
        }

        async fn extract_topics(
            &self,
            documents: &[String],
            _num_topics: usize,
            _num_keywords: usize,
        ) -> MlResult<Vec<String>> {
            self.topic_calls.fetch_add(1, Ordering::SeqCst);
            if self.topics_fail {
                return Err(MlError::InvalidResponse("no model".into()));
            }
            Ok(vec![format!("docs:{}", documents.len())])
        }
    }

    fn options(min_score: f64) -> ScorerOptions {
        ScorerOptions {
            min_score,
            topics_enabled: true,
            num_topics: 5,
            num_keywords: 10,
        }
    }

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 10.0, "0.9  very\n good"),
            TranscriptSegment::new(10.0, 20.0, "0.2 meh"),
            TranscriptSegment::new(20.0, 30.0, "0.5 borderline"),
            TranscriptSegment::new(30.0, 31.0, "   "),
        ]
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_text("   "), "");
    }

    #[tokio::test]
    async fn test_threshold_and_topics() {
        let service = Arc::new(KeywordSentiment::new(false));
        let scorer = SegmentScorer::new(service.clone(), options(0.5));

        let kept = scorer.score_segments(&segments()).await.unwrap();

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].start(), 0.0);
        assert_eq!(kept[1].start(), 20.0);
        assert_eq!(kept[1].score, 0.5);
        assert!(kept.iter().all(|s| s.topics == vec!["docs:3".to_string()]));
        assert_eq!(service.topic_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_topic_failure_is_soft() {
        let scorer = SegmentScorer::new(Arc::new(KeywordSentiment::new(true)), options(0.0));
        let kept = scorer.score_segments(&segments()).await.unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|s| s.topics.is_empty()));
    }

    #[tokio::test]
    async fn test_sentiment_failure_aborts() {
        let scorer = SegmentScorer::new(Arc::new(KeywordSentiment::new(false)), options(0.0));
        let mut input = segments();
        input.push(TranscriptSegment::new(40.0, 50.0, "boom"));
        assert!(scorer.score_segments(&input).await.is_err());
    }

    #[test]
    fn test_score_is_per_segment() {
        let scorer = SegmentScorer::new(Arc::new(KeywordSentiment::new(false)), options(0.5));
        let seg = TranscriptSegment::new(0.0, 1.0, "0.75 hello");
        let (label, score) = tokio_test::block_on(scorer.score(&seg)).unwrap();
        assert_eq!(label, SentimentLabel::Positive);
        assert_eq!(score, 0.75);
    }
}
