//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder for this process.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const CHUNKS_TRANSCRIBED_TOTAL: &str = "reelcut_chunks_transcribed_total";
    pub const CHUNKS_FAILED_TOTAL: &str = "reelcut_chunks_failed_total";
    pub const SEGMENTS_SCORED_TOTAL: &str = "reelcut_segments_scored_total";
    pub const SEGMENTS_KEPT_TOTAL: &str = "reelcut_segments_kept_total";
    pub const SUGGESTION_LINE_FAILURES_TOTAL: &str = "reelcut_suggestion_line_failures_total";
    pub const CLIPS_PRODUCED_TOTAL: &str = "reelcut_clips_produced_total";
    pub const CLIPS_SKIPPED_TOTAL: &str = "reelcut_clips_skipped_total";
    pub const CLIPS_FAILED_TOTAL: &str = "reelcut_clips_failed_total";
    pub const RUN_DURATION_SECONDS: &str = "reelcut_run_duration_seconds";
}

pub fn record_chunk(success: bool) {
    if success {
        counter!(names::CHUNKS_TRANSCRIBED_TOTAL).increment(1);
    } else {
        counter!(names::CHUNKS_FAILED_TOTAL).increment(1);
    }
}

pub fn record_scoring(scored: usize, kept: usize) {
    counter!(names::SEGMENTS_SCORED_TOTAL).increment(scored as u64);
    counter!(names::SEGMENTS_KEPT_TOTAL).increment(kept as u64);
}

pub fn record_line_failures(count: usize) {
    counter!(names::SUGGESTION_LINE_FAILURES_TOTAL).increment(count as u64);
}

pub fn record_clip_produced() {
    counter!(names::CLIPS_PRODUCED_TOTAL).increment(1);
}

pub fn record_clip_skipped(reason: &'static str) {
    counter!(names::CLIPS_SKIPPED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_clip_failed() {
    counter!(names::CLIPS_FAILED_TOTAL).increment(1);
}

pub fn record_run(source: &'static str, duration_secs: f64) {
    histogram!(names::RUN_DURATION_SECONDS, "source" => source).record(duration_secs);
}
