//! End-to-end highlight pipeline.
//!
//! video -> audio -> chunked transcript -> {scorer -> combiner | suggestion
//! parser} -> time ranges -> clips (-> optional concatenation), plus SRT
//! files and a JSON report in the run's output directory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use reelcut_media::{remove_if_exists, MediaTool};
use reelcut_ml_client::{SentimentService, SuggestionService, TranscriptionService};
use reelcut_models::{CombinedCut, CutDetails, RunId, TimeRange, TranscriptSegment};

use crate::assembler::{dedup_ranges, AssemblerOptions, AssemblyReport, ClipAssembler};
use crate::combiner::{combine, CombineOptions};
use crate::config::{HighlightSource, PipelineConfig};
use crate::error::{PipelineError, PipelineResult, Stage, StageContext};
use crate::logging::RunLogger;
use crate::metrics;
use crate::scorer::{ScorerOptions, SegmentScorer};
use crate::subtitle::{split_by_words, write_srt, WordFilter};
use crate::suggestion::{build_prompt, parse_cut_details, parse_suggestions};
use crate::transcriber::{ChunkedTranscriber, TranscriberOptions, TranscriptResult};

/// External collaborators of a pipeline run.
#[derive(Clone)]
pub struct PipelineServices {
    pub media: Arc<dyn MediaTool>,
    pub transcription: Arc<dyn TranscriptionService>,
    /// Required for [`HighlightSource::Scoring`]
    pub sentiment: Option<Arc<dyn SentimentService>>,
    /// Required for [`HighlightSource::Suggestion`]
    pub suggestion: Option<Arc<dyn SuggestionService>>,
}

/// Summary of one run, written as `report.json` next to the clips.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: RunId,
    pub video: PathBuf,
    pub source: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub output_dir: PathBuf,
    pub chunk_count: usize,
    pub segment_count: usize,
    /// Ranked cuts (scoring source only)
    pub cuts: Vec<CombinedCut>,
    /// Ranges handed to the assembler, in clip order
    pub ranges: Vec<TimeRange>,
    /// Suggestion lines that could not be parsed
    pub parse_failures: usize,
    /// Per-cut metadata (suggestion source only)
    pub details: Vec<CutDetails>,
    pub assembly: AssemblyReport,
    pub concatenated: Option<PathBuf>,
    /// `None` when the file could not be written
    pub transcript_srt: Option<PathBuf>,
    pub cuts_srt: Option<PathBuf>,
}

#[derive(Default)]
struct Highlights {
    cuts: Vec<CombinedCut>,
    ranges: Vec<TimeRange>,
    parse_failures: usize,
    details: Vec<CutDetails>,
}

/// Runs the whole pipeline for one video at a time.
pub struct HighlightPipeline {
    services: PipelineServices,
    config: PipelineConfig,
}

impl HighlightPipeline {
    /// Fails when the config is invalid or the service the highlight
    /// source needs is missing.
    pub fn new(services: PipelineServices, config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        match config.highlight_source {
            HighlightSource::Scoring if services.sentiment.is_none() => {
                return Err(PipelineError::config("scoring source needs a sentiment service"));
            }
            HighlightSource::Suggestion if services.suggestion.is_none() => {
                return Err(PipelineError::config("suggestion source needs a suggestion service"));
            }
            _ => {}
        }
        Ok(Self { services, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `video` end to end.
    ///
    /// Errors carry the stage and the video path. The run's scratch
    /// directory is removed whatever the outcome.
    pub async fn run(&self, video: &Path) -> PipelineResult<PipelineReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        let run_id = RunId::from_time(started_at);
        let logger = RunLogger::new(&run_id);

        let suffix = Uuid::new_v4().simple().to_string();
        let scratch = self
            .config
            .work_dir
            .join(format!("{}-{}", run_id, &suffix[..8]));

        logger.log_start(&format!(
            "{} ({} source)",
            video.display(),
            self.config.highlight_source.as_str()
        ));

        let result = self
            .run_in(video, &run_id, started_at, &scratch, &logger)
            .instrument(logger.create_span())
            .await;

        if let Err(e) = clean_work_dir(&scratch).await {
            logger.log_warning(&format!("failed to clean {}: {}", scratch.display(), e));
        }

        metrics::record_run(
            self.config.highlight_source.as_str(),
            started.elapsed().as_secs_f64(),
        );

        match &result {
            Ok(report) => logger.log_completion(&format!(
                "{} clips in {}",
                report.assembly.artifacts.len(),
                report.output_dir.display()
            )),
            Err(e) => logger.log_error(&e.to_string()),
        }
        result
    }

    async fn run_in(
        &self,
        video: &Path,
        run_id: &RunId,
        started_at: DateTime<Utc>,
        scratch: &Path,
        logger: &RunLogger,
    ) -> PipelineResult<PipelineReport> {
        // Read before any media work so a bad path fails the run early.
        let filter = match &self.config.prohibited_words_path {
            Some(path) => WordFilter::load(path).await.stage(Stage::Subtitles, video)?,
            None => WordFilter::default(),
        };

        let transcript = self.transcribe(video, scratch, logger).await?;

        let highlights = match self.config.highlight_source {
            HighlightSource::Scoring => self.score_and_combine(video, &transcript, logger).await?,
            HighlightSource::Suggestion => self.suggest(video, &transcript, logger).await?,
        };

        let output_dir = self.config.output_dir.join(run_id.as_str());
        tokio::fs::create_dir_all(&output_dir)
            .await
            .stage(Stage::Assemble, video)?;

        let assembler = ClipAssembler::new(
            Arc::clone(&self.services.media),
            AssemblerOptions::from_config(&self.config, &output_dir),
        );
        logger.for_stage(Stage::Assemble).log_start(&format!(
            "{} ranges",
            highlights.ranges.len()
        ));
        let assembly = assembler
            .assemble(video, &highlights.ranges)
            .await
            .stage(Stage::Assemble, video)?;

        let concatenated = if self.config.concatenate && !assembly.artifacts.is_empty() {
            let target = output_dir.join(format!("{}_highlights.mp4", run_id));
            match assembler.concatenate(&assembly.artifacts, &target).await {
                Ok(path) => Some(path),
                Err(e) => {
                    // Individual clips stay usable.
                    logger
                        .for_stage(Stage::Concatenate)
                        .log_warning(&format!("concatenation failed: {}", e));
                    None
                }
            }
        } else {
            None
        };

        // Clips are on disk from here on; side outputs only warn.
        let subtitle_logger = logger.for_stage(Stage::Subtitles);
        let cues = split_by_words(&transcript.segments, self.config.max_words_per_subtitle);
        let transcript_srt = write_side_output(
            &output_dir.join("transcript.srt"),
            &write_srt(&filter.apply_all(&cues)),
            &subtitle_logger,
        )
        .await;
        let manifest = cut_manifest(&highlights.ranges, &transcript.segments);
        let cuts_srt = write_side_output(
            &output_dir.join("cuts.srt"),
            &write_srt(&filter.apply_all(&manifest)),
            &subtitle_logger,
        )
        .await;

        let report = PipelineReport {
            run_id: run_id.clone(),
            video: video.to_path_buf(),
            source: self.config.highlight_source.as_str(),
            started_at,
            finished_at: Utc::now(),
            output_dir: output_dir.clone(),
            chunk_count: transcript.chunk_count,
            segment_count: transcript.segments.len(),
            cuts: highlights.cuts,
            ranges: highlights.ranges,
            parse_failures: highlights.parse_failures,
            details: highlights.details,
            assembly,
            concatenated,
            transcript_srt,
            cuts_srt,
        };

        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                write_side_output(&output_dir.join("report.json"), &json, &subtitle_logger).await;
            }
            Err(e) => subtitle_logger.log_warning(&format!("report serialization failed: {}", e)),
        }

        Ok(report)
    }

    async fn transcribe(
        &self,
        video: &Path,
        scratch: &Path,
        logger: &RunLogger,
    ) -> PipelineResult<TranscriptResult> {
        let stage_logger = logger.for_stage(Stage::ExtractAudio);
        stage_logger.log_start(&video.display().to_string());

        tokio::fs::create_dir_all(scratch)
            .await
            .stage(Stage::ExtractAudio, video)?;
        let audio = scratch.join("audio.mp3");
        self.services
            .media
            .extract_audio(video, &audio)
            .await
            .stage(Stage::ExtractAudio, video)?;

        let transcriber = ChunkedTranscriber::new(
            Arc::clone(&self.services.media),
            Arc::clone(&self.services.transcription),
            TranscriberOptions::from_config(&self.config, scratch.join("chunks")),
        );
        let result = transcriber.transcribe(&audio).await;

        if let Err(e) = remove_if_exists(&audio).await {
            stage_logger.log_warning(&format!("failed to remove {}: {}", audio.display(), e));
        }

        let transcript = result.stage(Stage::Transcribe, video)?;
        logger.for_stage(Stage::Transcribe).log_progress(&format!(
            "{} segments from {} chunks",
            transcript.segments.len(),
            transcript.chunk_count
        ));
        Ok(transcript)
    }

    async fn score_and_combine(
        &self,
        video: &Path,
        transcript: &TranscriptResult,
        logger: &RunLogger,
    ) -> PipelineResult<Highlights> {
        let sentiment = self
            .services
            .sentiment
            .clone()
            .ok_or_else(|| PipelineError::config("no sentiment service"))
            .stage(Stage::Score, video)?;

        let scorer = SegmentScorer::new(sentiment, ScorerOptions::from_config(&self.config));
        let scored = scorer
            .score_segments(&transcript.segments)
            .await
            .stage(Stage::Score, video)?;

        let cuts = combine(&scored, &CombineOptions::from_config(&self.config))
            .stage(Stage::Combine, video)?;
        logger.for_stage(Stage::Combine).log_progress(&format!(
            "{} cuts from {} kept segments",
            cuts.len(),
            scored.len()
        ));

        let ranges = cuts.iter().map(|c| TimeRange::new(c.start, c.end)).collect();
        Ok(Highlights {
            cuts,
            ranges,
            ..Default::default()
        })
    }

    async fn suggest(
        &self,
        video: &Path,
        transcript: &TranscriptResult,
        logger: &RunLogger,
    ) -> PipelineResult<Highlights> {
        let stage_logger = logger.for_stage(Stage::Suggest);
        let service = self
            .services
            .suggestion
            .clone()
            .ok_or_else(|| PipelineError::config("no suggestion service"))
            .stage(Stage::Suggest, video)?;

        if transcript.segments.is_empty() {
            stage_logger.log_warning("empty transcript, no suggestions requested");
            return Ok(Highlights::default());
        }

        let text = service
            .suggest(&build_prompt(&transcript.segments))
            .await
            .stage(Stage::Suggest, video)?;

        let parse = parse_suggestions(&text);
        for failure in &parse.failures {
            warn!(
                line = failure.line_number,
                "Unparseable suggestion line '{}': {}", failure.line, failure.reason
            );
        }
        metrics::record_line_failures(parse.failures.len());

        let details = parse_cut_details(&text);
        for (i, detail) in details.iter().enumerate() {
            info!(
                "Cut {}: score {:.1} {} - {}",
                i + 1,
                detail.score,
                detail.hashtags.join(" "),
                detail.summary
            );
        }

        stage_logger.log_progress(&format!(
            "{} ranges, {} unparseable lines",
            parse.ranges.len(),
            parse.failures.len()
        ));

        Ok(Highlights {
            cuts: Vec::new(),
            ranges: parse.ranges,
            parse_failures: parse.failures.len(),
            details,
        })
    }
}

/// One cue per distinct range, carrying the transcript text spoken in it.
///
/// Open-ended ranges end at the last transcript segment.
pub fn cut_manifest(ranges: &[TimeRange], segments: &[TranscriptSegment]) -> Vec<TranscriptSegment> {
    let transcript_end = segments.iter().map(|s| s.end).fold(0.0, f64::max);

    dedup_ranges(ranges)
        .iter()
        .map(|range| {
            let end = range.end.seconds().unwrap_or(transcript_end.max(range.start));
            let text = segments
                .iter()
                .filter(|s| s.start >= range.start && s.start < end)
                .map(|s| s.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            TranscriptSegment::new(range.start, end, text)
        })
        .collect()
}

/// Write a file that must not exist yet, returning its path on success.
async fn write_side_output(path: &Path, contents: &str, logger: &RunLogger) -> Option<PathBuf> {
    match write_new(path, contents).await {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) => {
            logger.log_warning(&format!("failed to write {}: {}", path.display(), e));
            None
        }
    }
}

/// Create `path` and write `contents`, failing if the file already exists.
async fn write_new(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    file.flush().await
}

/// Remove a scratch directory and everything in it.
pub async fn clean_work_dir(dir: &Path) -> PipelineResult<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_manifest_collects_text() {
        let segments = vec![
            TranscriptSegment::new(0.0, 10.0, "a"),
            TranscriptSegment::new(10.0, 20.0, "b"),
            TranscriptSegment::new(20.0, 30.0, "c"),
            TranscriptSegment::new(30.0, 45.0, "d"),
        ];
        let ranges = vec![
            TimeRange::new(10.0, 30.0),
            TimeRange::to_end(30.0),
            TimeRange::new(10.0, 30.0),
        ];

        let manifest = cut_manifest(&ranges, &segments);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0], TranscriptSegment::new(10.0, 30.0, "b c"));
        assert_eq!(manifest[1], TranscriptSegment::new(30.0, 45.0, "d"));
    }

    #[tokio::test]
    async fn test_write_new_never_overwrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        write_new(&path, "first").await.unwrap();
        let err = write_new(&path, "second").await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }

    #[tokio::test]
    async fn test_clean_work_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let scratch = dir.path().join("run");
        std::fs::create_dir_all(scratch.join("chunks")).unwrap();
        std::fs::write(scratch.join("chunks/a.mp3"), b"x").unwrap();

        clean_work_dir(&scratch).await.unwrap();
        assert!(!scratch.exists());
        // Already gone is fine.
        clean_work_dir(&scratch).await.unwrap();
    }
}
