//! Shared data models for the reelcut pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Transcript segments and their sentiment annotations
//! - Combined cuts and suggestion metadata
//! - Time ranges (with an end-of-media sentinel) and clip artifacts
//! - Encoding configuration and run identifiers

pub mod cut;
pub mod encoding;
pub mod range;
pub mod run;
pub mod segment;
pub mod timestamp;

// Re-export common types
pub use cut::{AggregatePolicy, CombinedCut, CutDetails};
pub use encoding::EncodingConfig;
pub use range::{ClipArtifact, RangeEnd, ResolvedRange, TimeRange};
pub use run::RunId;
pub use segment::{ScoredSegment, SentimentLabel, TranscriptSegment};
pub use timestamp::TimestampError;
