//! Clip assembly: trims one clip per time range and optionally joins them.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use reelcut_media::{output_size, MediaTool};
use reelcut_models::{ClipArtifact, ResolvedRange, TimeRange};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Remove repeated ranges, keeping the first occurrence of each.
pub fn dedup_ranges(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut seen = HashSet::new();
    ranges
        .iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .copied()
        .collect()
}

#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    /// Ranges shorter than this are skipped (seconds)
    pub min_clip_seconds: f64,
    /// Margin added to both sides of every clip (seconds)
    pub padding: f64,
    pub output_dir: PathBuf,
    /// Clip files are named `{prefix}_{n}.mp4`
    pub file_prefix: String,
}

impl AssemblerOptions {
    pub fn from_config(config: &PipelineConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            min_clip_seconds: config.min_clip_seconds,
            padding: config.clip_padding_secs,
            output_dir: output_dir.into(),
            file_prefix: "corte".to_string(),
        }
    }
}

/// A range that was not cut because it is too short.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRange {
    pub range: TimeRange,
    /// Duration after resolving the end (seconds)
    pub duration: f64,
}

/// A clip whose trim failed or produced no usable file.
#[derive(Debug, Clone, Serialize)]
pub struct FailedClip {
    pub range: TimeRange,
    pub file_path: PathBuf,
    pub reason: String,
}

/// Outcome of one assembly call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyReport {
    /// Produced clips, in range order
    pub artifacts: Vec<ClipArtifact>,
    pub skipped: Vec<SkippedRange>,
    pub failed: Vec<FailedClip>,
}

struct PlannedClip {
    range: TimeRange,
    resolved: ResolvedRange,
    output: PathBuf,
}

/// Materializes time ranges as clip files.
pub struct ClipAssembler {
    media: Arc<dyn MediaTool>,
    options: AssemblerOptions,
}

impl ClipAssembler {
    pub fn new(media: Arc<dyn MediaTool>, options: AssemblerOptions) -> Self {
        Self { media, options }
    }

    /// Cut one clip per distinct range of `source`.
    ///
    /// Short ranges and failed trims are reported, not raised. An existing
    /// file at any planned output path fails the call before any trim.
    pub async fn assemble(
        &self,
        source: &Path,
        ranges: &[TimeRange],
    ) -> PipelineResult<AssemblyReport> {
        let ranges = dedup_ranges(ranges);
        let mut report = AssemblyReport::default();
        if ranges.is_empty() {
            info!("No ranges to assemble for {}", source.display());
            return Ok(report);
        }

        let media_duration = if self.needs_duration(&ranges) {
            Some(self.media.probe_duration(source).await?)
        } else {
            None
        };

        let plan = self.plan(&ranges, media_duration, &mut report);
        for clip in &plan {
            if tokio::fs::try_exists(&clip.output).await? {
                return Err(PipelineError::OutputCollision(clip.output.clone()));
            }
        }

        if !plan.is_empty() {
            tokio::fs::create_dir_all(&self.options.output_dir).await?;
        }

        for clip in plan {
            match self.cut(source, &clip).await {
                Ok(byte_size) => {
                    info!(
                        "Produced {} ({}, {} bytes)",
                        clip.output.display(),
                        clip.range,
                        byte_size
                    );
                    metrics::record_clip_produced();
                    report.artifacts.push(ClipArtifact {
                        source_range: clip.range,
                        file_path: clip.output,
                        byte_size,
                    });
                }
                Err(e) => {
                    error!("Clip {} for {} failed: {}", clip.output.display(), clip.range, e);
                    metrics::record_clip_failed();
                    report.failed.push(FailedClip {
                        range: clip.range,
                        file_path: clip.output,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Assembled {} clips ({} skipped, {} failed)",
            report.artifacts.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Join `artifacts` into `output` in the given order.
    ///
    /// The individual clips are left in place whatever the outcome.
    pub async fn concatenate(
        &self,
        artifacts: &[ClipArtifact],
        output: &Path,
    ) -> PipelineResult<PathBuf> {
        if artifacts.is_empty() {
            return Err(PipelineError::internal("no clips to concatenate"));
        }
        if tokio::fs::try_exists(output).await? {
            return Err(PipelineError::OutputCollision(output.to_path_buf()));
        }

        let inputs: Vec<PathBuf> = artifacts.iter().map(|a| a.file_path.clone()).collect();
        self.media.concat(&inputs, output).await?;
        output_size(output).await?;

        info!("Concatenated {} clips into {}", inputs.len(), output.display());
        Ok(output.to_path_buf())
    }

    fn needs_duration(&self, ranges: &[TimeRange]) -> bool {
        self.options.padding > 0.0 || ranges.iter().any(|r| r.end.is_end_of_media())
    }

    fn plan(
        &self,
        ranges: &[TimeRange],
        media_duration: Option<f64>,
        report: &mut AssemblyReport,
    ) -> Vec<PlannedClip> {
        let mut plan = Vec::new();
        for range in ranges {
            // `media_duration` is always present when a sentinel is.
            let resolved = range.resolve(media_duration.unwrap_or(0.0));
            let duration = resolved.duration();

            if duration < self.options.min_clip_seconds {
                warn!(
                    "Skipping {}: {:.1}s is shorter than {:.0}s",
                    range, duration, self.options.min_clip_seconds
                );
                metrics::record_clip_skipped("too_short");
                report.skipped.push(SkippedRange {
                    range: *range,
                    duration,
                });
                continue;
            }

            let output = self.options.output_dir.join(format!(
                "{}_{}.mp4",
                self.options.file_prefix,
                plan.len() + 1
            ));
            plan.push(PlannedClip {
                range: *range,
                resolved: resolved.padded(self.options.padding, media_duration),
                output,
            });
        }
        plan
    }

    async fn cut(&self, source: &Path, clip: &PlannedClip) -> PipelineResult<u64> {
        self.media.trim(source, &clip.output, clip.resolved).await?;
        Ok(output_size(&clip.output).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelcut_media::{MediaError, MediaResult};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes a small file per trim; ranges starting at `empty_at` produce
    /// a zero-byte file and ranges starting at `fail_at` fail outright.
    struct FakeMedia {
        duration: f64,
        empty_at: Option<f64>,
        fail_at: Option<f64>,
        probes: Mutex<usize>,
        trims: Mutex<Vec<ResolvedRange>>,
    }

    impl FakeMedia {
        fn new(duration: f64) -> Self {
            Self {
                duration,
                empty_at: None,
                fail_at: None,
                probes: Mutex::new(0),
                trims: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaTool for FakeMedia {
        async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
            *self.probes.lock().unwrap() += 1;
            Ok(self.duration)
        }

        async fn extract_audio(&self, _video: &Path, _output: &Path) -> MediaResult<()> {
            Ok(())
        }

        async fn extract_audio_chunk(
            &self,
            _audio: &Path,
            _output: &Path,
            _start: f64,
            _duration: f64,
        ) -> MediaResult<()> {
            Ok(())
        }

        async fn trim(&self, _source: &Path, output: &Path, range: ResolvedRange) -> MediaResult<()> {
            self.trims.lock().unwrap().push(range);
            if self.fail_at == Some(range.start) {
                return Err(MediaError::ffmpeg_failed("trim", Some("boom".to_string()), Some(1)));
            }
            let body: &[u8] = if self.empty_at == Some(range.start) { b"" } else { b"clip" };
            tokio::fs::write(output, body).await?;
            Ok(())
        }

        async fn concat(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()> {
            let mut joined = Vec::new();
            for input in inputs {
                joined.extend(tokio::fs::read(input).await?);
            }
            tokio::fs::write(output, joined).await?;
            Ok(())
        }
    }

    fn assembler(media: Arc<FakeMedia>, dir: &TempDir) -> ClipAssembler {
        ClipAssembler::new(
            media,
            AssemblerOptions {
                min_clip_seconds: 10.0,
                padding: 0.0,
                output_dir: dir.path().join("clips"),
                file_prefix: "corte".to_string(),
            },
        )
    }

    #[test]
    fn test_dedup_is_idempotent_and_ordered() {
        let ranges = vec![
            TimeRange::new(60.0, 120.0),
            TimeRange::new(10.0, 40.0),
            TimeRange::new(60.0, 120.0),
            TimeRange::to_end(300.0),
            TimeRange::new(10.0, 40.0),
            TimeRange::to_end(300.0),
        ];
        let once = dedup_ranges(&ranges);
        assert_eq!(
            once,
            vec![
                TimeRange::new(60.0, 120.0),
                TimeRange::new(10.0, 40.0),
                TimeRange::to_end(300.0)
            ]
        );
        assert_eq!(dedup_ranges(&once), once);
    }

    #[tokio::test]
    async fn test_short_range_is_skipped() {
        let dir = TempDir::new().unwrap();
        let media = Arc::new(FakeMedia::new(600.0));
        let report = assembler(media.clone(), &dir)
            .assemble(Path::new("in.mp4"), &[TimeRange::new(100.0, 107.0)])
            .await
            .unwrap();

        assert!(report.artifacts.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].duration, 7.0);
        assert!(media.trims.lock().unwrap().is_empty());
        assert_eq!(*media.probes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sentinel_resolves_to_media_duration() {
        let dir = TempDir::new().unwrap();
        let media = Arc::new(FakeMedia::new(1500.0));
        let report = assembler(media.clone(), &dir)
            .assemble(Path::new("in.mp4"), &[TimeRange::to_end(1240.0)])
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].source_range, TimeRange::to_end(1240.0));
        assert_eq!(report.artifacts[0].byte_size, 4);
        assert!(report.artifacts[0].file_path.ends_with("clips/corte_1.mp4"));
        assert_eq!(
            media.trims.lock().unwrap()[0],
            ResolvedRange { start: 1240.0, end: 1500.0 }
        );
    }

    #[tokio::test]
    async fn test_collision_fails_before_any_trim() {
        let dir = TempDir::new().unwrap();
        let clips = dir.path().join("clips");
        std::fs::create_dir_all(&clips).unwrap();
        std::fs::write(clips.join("corte_2.mp4"), b"old").unwrap();

        let media = Arc::new(FakeMedia::new(600.0));
        let ranges = [TimeRange::new(0.0, 30.0), TimeRange::new(60.0, 90.0)];
        let result = assembler(media.clone(), &dir)
            .assemble(Path::new("in.mp4"), &ranges)
            .await;

        assert!(matches!(result, Err(PipelineError::OutputCollision(p)) if p.ends_with("corte_2.mp4")));
        assert!(media.trims.lock().unwrap().is_empty());
        assert!(!clips.join("corte_1.mp4").exists());
    }

    #[tokio::test]
    async fn test_failed_outputs_are_excluded() {
        let dir = TempDir::new().unwrap();
        let mut fake = FakeMedia::new(600.0);
        fake.empty_at = Some(60.0);
        fake.fail_at = Some(120.0);
        let media = Arc::new(fake);

        let ranges = [
            TimeRange::new(0.0, 30.0),
            TimeRange::new(60.0, 90.0),
            TimeRange::new(120.0, 150.0),
            TimeRange::new(200.0, 230.0),
        ];
        let report = assembler(media, &dir)
            .assemble(Path::new("in.mp4"), &ranges)
            .await
            .unwrap();

        let starts: Vec<f64> = report.artifacts.iter().map(|a| a.source_range.start).collect();
        assert_eq!(starts, vec![0.0, 200.0]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.artifacts[1].file_path.ends_with("corte_4.mp4"));
    }

    #[tokio::test]
    async fn test_padding_is_clamped() {
        let dir = TempDir::new().unwrap();
        let media = Arc::new(FakeMedia::new(100.0));
        let mut assembler = assembler(media.clone(), &dir);
        assembler.options.padding = 0.5;

        assembler
            .assemble(
                Path::new("in.mp4"),
                &[TimeRange::new(0.2, 20.0), TimeRange::new(80.0, 99.8)],
            )
            .await
            .unwrap();

        let trims = media.trims.lock().unwrap();
        assert_eq!(trims[0], ResolvedRange { start: 0.0, end: 20.5 });
        assert_eq!(trims[1], ResolvedRange { start: 79.5, end: 100.0 });
    }

    #[tokio::test]
    async fn test_concatenate_keeps_clips() {
        let dir = TempDir::new().unwrap();
        let media = Arc::new(FakeMedia::new(600.0));
        let assembler = assembler(media, &dir);
        let report = assembler
            .assemble(
                Path::new("in.mp4"),
                &[TimeRange::new(0.0, 30.0), TimeRange::new(60.0, 90.0)],
            )
            .await
            .unwrap();

        let output = dir.path().join("all.mp4");
        let joined = assembler.concatenate(&report.artifacts, &output).await.unwrap();
        assert_eq!(std::fs::read(&joined).unwrap(), b"clipclip");
        assert!(report.artifacts.iter().all(|a| a.file_path.exists()));

        // A second attempt collides and still leaves the clips alone.
        assert!(assembler.concatenate(&report.artifacts, &output).await.is_err());
        assert!(report.artifacts.iter().all(|a| a.file_path.exists()));
    }
}
