//! Audio extraction and chunking.

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Codec for extracted audio. MP3 keeps ten-minute chunks small enough
/// for hosted speech-to-text upload limits.
pub const AUDIO_CODEC: &str = "libmp3lame";
/// Bitrate for extracted audio.
pub const AUDIO_BITRATE: &str = "64k";

/// Extract the audio track of a video into a standalone MP3 file.
pub async fn extract_audio(
    runner: &FfmpegRunner,
    video: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let video = video.as_ref();
    let output = output.as_ref();

    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }

    info!("Extracting audio: {} -> {}", video.display(), output.display());

    let cmd = FfmpegCommand::new(video, output)
        .no_video()
        .audio_codec(AUDIO_CODEC)
        .audio_bitrate(AUDIO_BITRATE);

    let started = Instant::now();
    runner.run(&cmd).await?;
    metrics::record_ffmpeg("extract_audio", started.elapsed().as_secs_f64());

    Ok(())
}

/// Copy `duration` seconds of `audio` starting at `start` into `output`.
pub async fn extract_audio_chunk(
    runner: &FfmpegRunner,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: f64,
    duration: f64,
) -> MediaResult<()> {
    let audio = audio.as_ref();
    let output = output.as_ref();

    if duration <= 0.0 {
        return Err(MediaError::invalid_range(format!(
            "chunk duration must be positive, got {:.3}",
            duration
        )));
    }

    debug!(
        "Extracting audio chunk: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        audio.display(),
        output.display(),
        start,
        duration
    );

    let cmd = FfmpegCommand::new(audio, output)
        .seek(start)
        .duration(duration)
        .codec_copy();

    let started = Instant::now();
    runner.run(&cmd).await?;
    metrics::record_ffmpeg("extract_chunk", started.elapsed().as_secs_f64());

    Ok(())
}
