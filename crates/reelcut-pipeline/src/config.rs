//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;

use reelcut_models::AggregatePolicy;

use crate::error::{PipelineError, PipelineResult};

/// Where highlight ranges come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightSource {
    /// Sentiment scoring followed by the window combiner.
    #[default]
    Scoring,
    /// Free-text suggestions from a language model.
    Suggestion,
}

impl HighlightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightSource::Scoring => "scoring",
            HighlightSource::Suggestion => "suggestion",
        }
    }
}

impl FromStr for HighlightSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scoring" | "sentiment" => Ok(HighlightSource::Scoring),
            "suggestion" | "llm" => Ok(HighlightSource::Suggestion),
            other => Err(format!("unknown highlight source: {}", other)),
        }
    }
}

/// Pipeline configuration.
///
/// Passed explicitly into each stage; nothing reads it from globals.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Scratch directory for extracted audio and chunks
    pub work_dir: PathBuf,
    /// Directory receiving per-run output folders
    pub output_dir: PathBuf,
    /// Audio chunk length in seconds
    pub chunk_seconds: f64,
    /// Concurrent transcription workers
    pub max_transcription_workers: usize,
    /// Segments scoring below this are dropped
    pub min_sentiment_score: f64,
    /// Shortest cut the combiner emits (seconds)
    pub min_cut_duration: f64,
    /// Longest cut the combiner builds (seconds)
    pub max_cut_duration: f64,
    /// Cap on ranked cuts; `None` keeps all
    pub max_cuts: Option<usize>,
    pub aggregate_policy: AggregatePolicy,
    /// Ranges shorter than this are skipped at assembly (seconds)
    pub min_clip_seconds: f64,
    /// Margin added on both sides of each clip (seconds)
    pub clip_padding_secs: f64,
    /// Also join the clips into one file
    pub concatenate: bool,
    pub highlight_source: HighlightSource,
    /// Attach corpus-level topics to scored segments
    pub topics_enabled: bool,
    pub num_topics: usize,
    pub num_keywords: usize,
    /// Word cap for subtitle cues
    pub max_words_per_subtitle: usize,
    /// Optional `word=replacement` file applied to subtitles
    pub prohibited_words_path: Option<PathBuf>,
    /// Kill FFmpeg invocations running longer than this (seconds)
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/reelcut"),
            output_dir: PathBuf::from("output"),
            chunk_seconds: 600.0,
            max_transcription_workers: 4,
            min_sentiment_score: 0.5,
            min_cut_duration: 60.0,
            max_cut_duration: 90.0,
            max_cuts: Some(5),
            aggregate_policy: AggregatePolicy::Sum,
            min_clip_seconds: 10.0,
            clip_padding_secs: 0.0,
            concatenate: false,
            highlight_source: HighlightSource::Scoring,
            topics_enabled: true,
            num_topics: 5,
            num_keywords: 10,
            max_words_per_subtitle: 12,
            prohibited_words_path: None,
            ffmpeg_timeout_secs: None,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("REELCUT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("REELCUT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            chunk_seconds: env_parse("REELCUT_CHUNK_SECONDS").unwrap_or(defaults.chunk_seconds),
            max_transcription_workers: env_parse("REELCUT_TRANSCRIPTION_WORKERS")
                .unwrap_or(defaults.max_transcription_workers),
            min_sentiment_score: env_parse("REELCUT_MIN_SENTIMENT_SCORE")
                .unwrap_or(defaults.min_sentiment_score),
            min_cut_duration: env_parse("REELCUT_MIN_CUT_DURATION")
                .unwrap_or(defaults.min_cut_duration),
            max_cut_duration: env_parse("REELCUT_MAX_CUT_DURATION")
                .unwrap_or(defaults.max_cut_duration),
            // 0 means unlimited
            max_cuts: match env_parse::<usize>("REELCUT_MAX_CUTS") {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.max_cuts,
            },
            aggregate_policy: env_parse("REELCUT_AGGREGATE_POLICY")
                .unwrap_or(defaults.aggregate_policy),
            min_clip_seconds: env_parse("REELCUT_MIN_CLIP_SECONDS")
                .unwrap_or(defaults.min_clip_seconds),
            clip_padding_secs: env_parse("REELCUT_CLIP_PADDING_SECS")
                .unwrap_or(defaults.clip_padding_secs),
            concatenate: env_flag("REELCUT_CONCATENATE").unwrap_or(defaults.concatenate),
            highlight_source: env_parse("REELCUT_HIGHLIGHT_SOURCE")
                .unwrap_or(defaults.highlight_source),
            topics_enabled: env_flag("REELCUT_TOPICS_ENABLED").unwrap_or(defaults.topics_enabled),
            num_topics: env_parse("REELCUT_NUM_TOPICS").unwrap_or(defaults.num_topics),
            num_keywords: env_parse("REELCUT_NUM_KEYWORDS").unwrap_or(defaults.num_keywords),
            max_words_per_subtitle: env_parse("REELCUT_MAX_WORDS_PER_SUBTITLE")
                .unwrap_or(defaults.max_words_per_subtitle),
            prohibited_words_path: std::env::var("REELCUT_PROHIBITED_WORDS")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            ffmpeg_timeout_secs: env_parse("REELCUT_FFMPEG_TIMEOUT_SECS"),
        }
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.chunk_seconds.is_finite() && self.chunk_seconds > 0.0) {
            return Err(PipelineError::config(format!(
                "chunk_seconds must be positive, got {}",
                self.chunk_seconds
            )));
        }
        if self.max_transcription_workers == 0 {
            return Err(PipelineError::config("max_transcription_workers must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_sentiment_score) {
            return Err(PipelineError::config(format!(
                "min_sentiment_score must be within [0, 1], got {}",
                self.min_sentiment_score
            )));
        }
        if self.min_clip_seconds < 0.0 || self.clip_padding_secs < 0.0 {
            return Err(PipelineError::config(
                "min_clip_seconds and clip_padding_secs must not be negative",
            ));
        }
        if self.max_words_per_subtitle == 0 {
            return Err(PipelineError::config("max_words_per_subtitle must be at least 1"));
        }
        crate::combiner::CombineOptions::from_config(self).validate()
    }
}
