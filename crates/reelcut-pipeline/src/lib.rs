//! Highlight extraction and clip assembly.
//!
//! This crate provides:
//! - Chunked parallel transcription
//! - Segment scoring and the duration-bounded window combiner
//! - Parsing of free-text highlight suggestions
//! - Clip assembly, concatenation and SRT output
//! - The [`HighlightPipeline`] tying them together

pub mod assembler;
pub mod combiner;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod scorer;
pub mod subtitle;
pub mod suggestion;
pub mod transcriber;

pub use assembler::{dedup_ranges, AssemblerOptions, AssemblyReport, ClipAssembler};
pub use combiner::{combine, CombineOptions};
pub use config::{HighlightSource, PipelineConfig};
pub use error::{PipelineError, PipelineResult, Stage};
pub use logging::RunLogger;
pub use pipeline::{HighlightPipeline, PipelineReport, PipelineServices};
pub use scorer::{ScorerOptions, SegmentScorer};
pub use suggestion::{parse_cut_details, parse_suggestions, SuggestionParse};
pub use transcriber::{ChunkedTranscriber, TranscriberOptions, TranscriptResult};
