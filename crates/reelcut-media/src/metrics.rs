//! FFmpeg timing metrics.

use metrics::histogram;

/// Wall-clock duration of FFmpeg invocations, labelled by operation.
pub const FFMPEG_DURATION_SECONDS: &str = "reelcut_ffmpeg_duration_seconds";

pub fn record_ffmpeg(operation: &'static str, duration_secs: f64) {
    histogram!(FFMPEG_DURATION_SECONDS, "operation" => operation).record(duration_secs);
}
