//! FFmpeg CLI wrapper for the reelcut pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with optional timeouts
//! - Media probing through FFprobe
//! - Audio extraction and fixed-window chunking
//! - Non-overwriting clip trims and ordered concatenation
//! - The [`MediaTool`] trait the pipeline is written against

pub mod audio;
pub mod clip;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod metrics;
pub mod probe;
pub mod tool;

pub use audio::{extract_audio, extract_audio_chunk};
pub use clip::{concat_clips, trim_clip};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{output_size, remove_if_exists};
pub use probe::{get_duration, probe_media, MediaInfo};
pub use tool::{FfmpegTool, MediaTool};
