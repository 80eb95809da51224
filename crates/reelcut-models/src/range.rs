//! Time ranges and clip artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::timestamp::format_seconds;

/// End of a time range: a concrete time, or "until the media ends".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "seconds")]
pub enum RangeEnd {
    At(f64),
    EndOfMedia,
}

impl RangeEnd {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            RangeEnd::At(secs) => Some(*secs),
            RangeEnd::EndOfMedia => None,
        }
    }

    pub fn is_end_of_media(&self) -> bool {
        matches!(self, RangeEnd::EndOfMedia)
    }
}

/// A span of source media, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeRange {
    pub start: f64,
    pub end: RangeEnd,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end: RangeEnd::At(end),
        }
    }

    /// A range that runs until the end of the media.
    pub fn to_end(start: f64) -> Self {
        Self {
            start,
            end: RangeEnd::EndOfMedia,
        }
    }

    /// Resolve the end against the media duration.
    ///
    /// Concrete ends are returned as-is; the sentinel becomes `media_duration`.
    pub fn resolve(&self, media_duration: f64) -> ResolvedRange {
        let end = match self.end {
            RangeEnd::At(secs) => secs,
            RangeEnd::EndOfMedia => media_duration,
        };
        ResolvedRange {
            start: self.start,
            end,
        }
    }

    /// Millisecond key identifying the interval.
    ///
    /// Values that differ only by float noise share a key.
    pub fn dedup_key(&self) -> (i64, Option<i64>) {
        let to_ms = |s: f64| (s * 1000.0).round() as i64;
        (to_ms(self.start), self.end.seconds().map(to_ms))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            RangeEnd::At(end) => write!(f, "{}-{}", format_seconds(self.start), format_seconds(end)),
            RangeEnd::EndOfMedia => write!(f, "{}-end", format_seconds(self.start)),
        }
    }
}

/// A time range with a concrete end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedRange {
    pub start: f64,
    pub end: f64,
}

impl ResolvedRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Widen by `padding` on both sides, clamped to `[0, media_duration]`.
    pub fn padded(&self, padding: f64, media_duration: Option<f64>) -> Self {
        let start = (self.start - padding).max(0.0);
        let mut end = self.end + padding;
        if let Some(limit) = media_duration {
            end = end.min(limit);
        }
        Self { start, end }
    }
}

/// A clip file produced from one time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipArtifact {
    /// Range the clip was cut from (as requested, before resolution)
    pub source_range: TimeRange,
    /// Location of the clip file
    #[schemars(with = "String")]
    pub file_path: PathBuf,
    /// Size of the clip file in bytes (always > 0)
    pub byte_size: u64,
}
