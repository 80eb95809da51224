//! The media tool seam used by the pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use reelcut_models::{EncodingConfig, ResolvedRange};

use crate::audio::{extract_audio, extract_audio_chunk};
use crate::clip::{concat_clips, trim_clip};
use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::probe::get_duration;

/// Media operations the pipeline depends on.
///
/// Exit status and output presence are the only success signals; callers
/// still verify produced files themselves.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Duration of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Extract the audio track of `video` into `output`.
    async fn extract_audio(&self, video: &Path, output: &Path) -> MediaResult<()>;

    /// Copy a time window of `audio` into `output`.
    async fn extract_audio_chunk(
        &self,
        audio: &Path,
        output: &Path,
        start: f64,
        duration: f64,
    ) -> MediaResult<()>;

    /// Cut `range` of `source` into `output` without overwriting.
    async fn trim(&self, source: &Path, output: &Path, range: ResolvedRange) -> MediaResult<()>;

    /// Join `inputs` into `output` in order.
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()>;
}

/// [`MediaTool`] backed by the FFmpeg and FFprobe CLIs.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTool {
    runner: FfmpegRunner,
    encoding: EncodingConfig,
}

impl FfmpegTool {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            runner: FfmpegRunner::new(),
            encoding,
        }
    }

    /// Kill FFmpeg invocations running longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        get_duration(path).await
    }

    async fn extract_audio(&self, video: &Path, output: &Path) -> MediaResult<()> {
        extract_audio(&self.runner, video, output).await
    }

    async fn extract_audio_chunk(
        &self,
        audio: &Path,
        output: &Path,
        start: f64,
        duration: f64,
    ) -> MediaResult<()> {
        extract_audio_chunk(&self.runner, audio, output, start, duration).await
    }

    async fn trim(&self, source: &Path, output: &Path, range: ResolvedRange) -> MediaResult<()> {
        trim_clip(&self.runner, source, output, range, &self.encoding).await
    }

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()> {
        concat_clips(&self.runner, inputs, output).await
    }
}
