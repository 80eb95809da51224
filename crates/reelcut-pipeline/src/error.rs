//! Pipeline error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use reelcut_media::MediaError;
use reelcut_ml_client::MlError;
use reelcut_models::TimestampError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline stage, used to tag errors raised to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractAudio,
    Transcribe,
    Score,
    Combine,
    Suggest,
    Assemble,
    Concatenate,
    Subtitles,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ExtractAudio => "extract_audio",
            Stage::Transcribe => "transcribe",
            Stage::Score => "score",
            Stage::Combine => "combine",
            Stage::Suggest => "suggest",
            Stage::Assemble => "assemble",
            Stage::Concatenate => "concatenate",
            Stage::Subtitles => "subtitles",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription of chunk {chunk} (starting at {start_secs:.0}s) failed: {source}")]
    ChunkFailed {
        chunk: usize,
        start_secs: f64,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Output already exists: {0}")]
    OutputCollision(PathBuf),

    #[error("Stage {stage} failed for {video}: {source}")]
    Stage {
        stage: Stage,
        video: PathBuf,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Service error: {0}")]
    Service(#[from] MlError),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Attach the stage and source video to an error.
    pub fn in_stage(self, stage: Stage, video: impl Into<PathBuf>) -> Self {
        Self::Stage {
            stage,
            video: video.into(),
            source: Box::new(self),
        }
    }

    /// Stage the error was raised in, if tagged.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Extension for tagging results with a stage.
pub trait StageContext<T> {
    fn stage(self, stage: Stage, video: &std::path::Path) -> PipelineResult<T>;
}

impl<T, E> StageContext<T> for Result<T, E>
where
    E: Into<PipelineError>,
{
    fn stage(self, stage: Stage, video: &std::path::Path) -> PipelineResult<T> {
        self.map_err(|e| e.into().in_stage(stage, video))
    }
}
