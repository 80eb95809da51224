//! Clip trimming and concatenation.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use reelcut_models::{EncodingConfig, ResolvedRange};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{concat_escape, remove_if_exists};
use crate::metrics;

/// Cut `range` out of `source` into `output`.
///
/// Never replaces an existing file: an existing `output` is reported as
/// [`MediaError::OutputExists`] and FFmpeg runs with `-n`.
pub async fn trim_clip(
    runner: &FfmpegRunner,
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    range: ResolvedRange,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let source = source.as_ref();
    let output = output.as_ref();

    if !source.exists() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }
    if output.exists() {
        return Err(MediaError::OutputExists(output.to_path_buf()));
    }
    if range.duration() <= 0.0 {
        return Err(MediaError::invalid_range(format!(
            "end {:.3} is not after start {:.3}",
            range.end, range.start
        )));
    }

    info!(
        "Trimming clip: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        source.display(),
        output.display(),
        range.start,
        range.duration()
    );

    let cmd = FfmpegCommand::new(source, output)
        .seek(range.start)
        .duration(range.duration())
        .no_overwrite();

    let cmd = if encoding.stream_copy {
        cmd.codec_copy()
    } else {
        cmd.video_codec(&encoding.codec)
            .preset(&encoding.preset)
            .crf(encoding.crf)
            .audio_codec(&encoding.audio_codec)
            .audio_bitrate(&encoding.audio_bitrate)
    };

    let started = Instant::now();
    runner.run(&cmd).await?;
    metrics::record_ffmpeg("trim", started.elapsed().as_secs_f64());

    Ok(())
}

/// Join `inputs` into `output`, in the given order.
///
/// Uses the concat demuxer with a list file written next to `output`.
/// Inputs are left untouched whether or not the join succeeds.
pub async fn concat_clips(
    runner: &FfmpegRunner,
    inputs: &[PathBuf],
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();

    if inputs.is_empty() {
        return Err(MediaError::internal("no clips to concatenate"));
    }
    if output.exists() {
        return Err(MediaError::OutputExists(output.to_path_buf()));
    }

    let list_path = output.with_extension("concat.txt");
    let list_body = build_concat_list(inputs);
    tokio::fs::write(&list_path, list_body).await?;

    info!("Concatenating {} clips -> {}", inputs.len(), output.display());

    let cmd = FfmpegCommand::new(&list_path, output)
        .concat_list()
        .codec_copy()
        .no_overwrite();

    let started = Instant::now();
    let result = runner.run(&cmd).await;
    metrics::record_ffmpeg("concat", started.elapsed().as_secs_f64());

    if let Err(e) = remove_if_exists(&list_path).await {
        warn!("Failed to remove concat list {}: {}", list_path.display(), e);
    }

    result
}

fn build_concat_list(inputs: &[PathBuf]) -> String {
    let mut body = String::new();
    for path in inputs {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
        body.push_str("file '");
        body.push_str(&concat_escape(&absolute));
        body.push_str("'\n");
    }
    body
}
