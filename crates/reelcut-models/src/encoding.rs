//! Clip encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Encoding settings used when trimming clips.
///
/// With `stream_copy` set, trims copy the source streams instead of
/// re-encoding. That is fast but snaps cuts to keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Copy streams instead of re-encoding
    #[serde(default)]
    pub stream_copy: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            crf: DEFAULT_CRF,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            stream_copy: false,
        }
    }
}

impl EncodingConfig {
    /// Load overrides from `REELCUT_VIDEO_CODEC`, `REELCUT_PRESET`,
    /// `REELCUT_CRF` and `REELCUT_STREAM_COPY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            codec: std::env::var("REELCUT_VIDEO_CODEC").unwrap_or(defaults.codec),
            preset: std::env::var("REELCUT_PRESET").unwrap_or(defaults.preset),
            crf: std::env::var("REELCUT_CRF")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|crf| *crf <= 51)
                .unwrap_or(defaults.crf),
            audio_codec: defaults.audio_codec,
            audio_bitrate: defaults.audio_bitrate,
            stream_copy: std::env::var("REELCUT_STREAM_COPY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoding() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.crf, 18);
        assert!(!config.stream_copy);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: EncodingConfig = serde_json::from_str(r#"{"crf": 23}"#).unwrap();
        assert_eq!(config.crf, 23);
        assert_eq!(config.preset, "fast");
        assert_eq!(config.audio_bitrate, "128k");
    }
}
