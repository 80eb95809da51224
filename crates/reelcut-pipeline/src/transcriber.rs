//! Chunked parallel transcription.
//!
//! Audio is split into fixed-length windows, each window is transcribed
//! concurrently (bounded by a semaphore), and segments are reassembled in
//! window order with absolute timestamps. One failing window fails the
//! whole call; every window file is removed before the call returns.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use reelcut_media::{remove_if_exists, MediaTool};
use reelcut_ml_client::{Transcription, TranscriptionService};
use reelcut_models::TranscriptSegment;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// One window of the source audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub index: usize,
    /// Offset of the window in the source audio (seconds)
    pub start: f64,
    /// Window length (seconds); only the last may be shorter
    pub duration: f64,
}

/// Tail windows shorter than this are folded into the previous window;
/// speech-to-text services reject near-empty audio.
const MIN_TAIL_SECONDS: f64 = 0.1;

/// Split `total_duration` into consecutive windows of `chunk_seconds`.
///
/// Zero-length audio yields no windows. Window `i` starts at exactly
/// `i * chunk_seconds`.
pub fn plan_chunks(total_duration: f64, chunk_seconds: f64) -> Vec<ChunkPlan> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(total_duration) || !positive(chunk_seconds) {
        return Vec::new();
    }

    let count = (total_duration / chunk_seconds).ceil() as usize;
    let mut chunks: Vec<ChunkPlan> = Vec::with_capacity(count);
    for index in 0..count {
        let start = index as f64 * chunk_seconds;
        let duration = chunk_seconds.min(total_duration - start);
        if duration <= 0.0 {
            break;
        }
        match chunks.last_mut() {
            Some(previous) if duration < MIN_TAIL_SECONDS => previous.duration += duration,
            _ => chunks.push(ChunkPlan {
                index,
                start,
                duration,
            }),
        }
    }
    chunks
}

/// Transcript of a whole audio file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptResult {
    /// Chunk texts joined with newlines, in chunk order
    pub text: String,
    /// Segments with absolute timestamps, ordered by start
    pub segments: Vec<TranscriptSegment>,
    /// Number of chunks transcribed
    pub chunk_count: usize,
}

#[derive(Debug, Clone)]
pub struct TranscriberOptions {
    pub chunk_seconds: f64,
    pub max_workers: usize,
    /// Directory receiving the temporary chunk files
    pub chunk_dir: PathBuf,
}

impl TranscriberOptions {
    pub fn from_config(config: &PipelineConfig, chunk_dir: impl Into<PathBuf>) -> Self {
        Self {
            chunk_seconds: config.chunk_seconds,
            max_workers: config.max_transcription_workers,
            chunk_dir: chunk_dir.into(),
        }
    }
}

/// Transcribes long audio through a bounded worker pool.
pub struct ChunkedTranscriber {
    media: Arc<dyn MediaTool>,
    service: Arc<dyn TranscriptionService>,
    options: TranscriberOptions,
}

impl ChunkedTranscriber {
    pub fn new(
        media: Arc<dyn MediaTool>,
        service: Arc<dyn TranscriptionService>,
        options: TranscriberOptions,
    ) -> Self {
        Self {
            media,
            service,
            options,
        }
    }

    /// Transcribe `audio` and return segments in chronological order.
    pub async fn transcribe(&self, audio: &Path) -> PipelineResult<TranscriptResult> {
        if self.options.max_workers == 0 {
            return Err(PipelineError::config("max_workers must be at least 1"));
        }

        let duration = self.media.probe_duration(audio).await?;
        let chunks = plan_chunks(duration, self.options.chunk_seconds);

        if chunks.is_empty() {
            info!("Audio {} is empty, nothing to transcribe", audio.display());
            return Ok(TranscriptResult::default());
        }

        tokio::fs::create_dir_all(&self.options.chunk_dir).await?;

        info!(
            "Transcribing {} ({:.1}s) in {} chunks of {:.0}s with {} workers",
            audio.display(),
            duration,
            chunks.len(),
            self.options.chunk_seconds,
            self.options.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_workers));
        let futures: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                let sem = Arc::clone(&semaphore);
                async move {
                    let _permit = sem
                        .acquire()
                        .await
                        .map_err(|_| PipelineError::internal("transcription pool closed"))?;
                    self.transcribe_chunk(audio, chunk).await
                }
            })
            .collect();

        // Join every worker before inspecting results so all chunk files
        // are gone even when one fails.
        let results = join_all(futures).await;

        reassemble(&chunks, results)
    }

    async fn transcribe_chunk(
        &self,
        audio: &Path,
        chunk: &ChunkPlan,
    ) -> PipelineResult<Transcription> {
        let chunk_path = self.chunk_path(audio, chunk.index);
        debug!(
            "Chunk {}: {:.1}s-{:.1}s -> {}",
            chunk.index,
            chunk.start,
            chunk.start + chunk.duration,
            chunk_path.display()
        );

        let result = async {
            self.media
                .extract_audio_chunk(audio, &chunk_path, chunk.start, chunk.duration)
                .await?;
            Ok::<_, PipelineError>(self.service.transcribe(&chunk_path).await?)
        }
        .await;

        if let Err(e) = remove_if_exists(&chunk_path).await {
            warn!("Failed to remove chunk file {}: {}", chunk_path.display(), e);
        }

        metrics::record_chunk(result.is_ok());
        result
    }

    fn chunk_path(&self, audio: &Path, index: usize) -> PathBuf {
        let stem = audio
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        self.options
            .chunk_dir
            .join(format!("{}_part_{:04}.mp3", stem, index))
    }
}

/// Merge per-chunk results in chunk order.
///
/// The first failure by chunk index is returned; no partial transcript
/// is ever produced.
fn reassemble(
    chunks: &[ChunkPlan],
    results: Vec<PipelineResult<Transcription>>,
) -> PipelineResult<TranscriptResult> {
    let mut texts = Vec::with_capacity(chunks.len());
    let mut segments = Vec::new();

    for (chunk, result) in chunks.iter().zip(results) {
        let transcription = result.map_err(|e| PipelineError::ChunkFailed {
            chunk: chunk.index,
            start_secs: chunk.start,
            source: Box::new(e),
        })?;

        texts.push(transcription.text);
        segments.extend(
            transcription
                .segments
                .iter()
                .map(|segment| segment.shifted(chunk.start)),
        );
    }

    // Stable: segments sharing a start keep chunk order.
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    Ok(TranscriptResult {
        text: texts.join("\n"),
        segments,
        chunk_count: chunks.len(),
    })
}
