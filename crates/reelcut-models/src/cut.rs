//! Cut models produced by the combiner and the suggestion parser.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a run's segment scores fold into one ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AggregatePolicy {
    /// Sum of segment scores. Favors longer, consistently relevant runs.
    #[default]
    Sum,
    /// Highest single segment score.
    Max,
}

impl AggregatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregatePolicy::Sum => "sum",
            AggregatePolicy::Max => "max",
        }
    }

    /// Fold a sequence of scores according to this policy.
    pub fn aggregate<I>(&self, scores: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        match self {
            AggregatePolicy::Sum => scores.into_iter().sum(),
            AggregatePolicy::Max => scores.into_iter().fold(0.0, f64::max),
        }
    }
}

impl FromStr for AggregatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(AggregatePolicy::Sum),
            "max" => Ok(AggregatePolicy::Max),
            other => Err(format!("unknown aggregate policy: {}", other)),
        }
    }
}

/// A contiguous run of scored segments merged into one candidate clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CombinedCut {
    /// Start of the first constituent segment (seconds)
    pub start: f64,
    /// End of the last constituent segment (seconds)
    pub end: f64,
    /// Constituent texts joined with single spaces, in order
    pub text: String,
    /// Ranking score
    pub aggregate_score: f64,
    /// Sum of constituent segment durations
    pub total_duration: f64,
    /// Number of merged segments
    pub segment_count: usize,
}

/// Per-cut metadata returned by the suggestion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CutDetails {
    /// Short description of the cut
    pub summary: String,
    /// Hashtags, each including the leading `#`
    pub hashtags: Vec<String>,
    /// Virality score on a 0-10 scale
    pub score: f64,
}
