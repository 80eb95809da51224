//! Greedy duration-bounded combination of scored segments into cuts.

use tracing::debug;

use reelcut_models::{AggregatePolicy, CombinedCut, ScoredSegment};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Tolerance for duration comparisons; segment times come back from
/// services as decimals.
const DURATION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct CombineOptions {
    /// Shortest emitted cut (seconds)
    pub min_duration: f64,
    /// Longest cut built from more than one segment (seconds)
    pub max_duration: f64,
    /// Keep at most this many ranked cuts
    pub max_cuts: Option<usize>,
    pub policy: AggregatePolicy,
}

impl CombineOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_duration: config.min_cut_duration,
            max_duration: config.max_cut_duration,
            max_cuts: config.max_cuts,
            policy: config.aggregate_policy,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.min_duration) || !positive(self.max_duration) {
            return Err(PipelineError::config(format!(
                "cut duration bounds must be positive, got [{}, {}]",
                self.min_duration, self.max_duration
            )));
        }
        if self.max_duration < self.min_duration {
            return Err(PipelineError::config(format!(
                "max_cut_duration ({}) is below min_cut_duration ({})",
                self.max_duration, self.min_duration
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Run<'a> {
    segments: Vec<&'a ScoredSegment>,
    duration: f64,
}

impl<'a> Run<'a> {
    fn push(&mut self, segment: &'a ScoredSegment) {
        self.duration += segment.duration();
        self.segments.push(segment);
    }

    fn into_cut(self, options: &CombineOptions) -> Option<CombinedCut> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;

        if self.duration + DURATION_EPSILON < options.min_duration {
            debug!(
                "Dropping run {:.2}-{:.2}s ({:.2}s < {:.2}s)",
                first.start(),
                last.end(),
                self.duration,
                options.min_duration
            );
            return None;
        }

        let text = self
            .segments
            .iter()
            .map(|s| s.segment.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Some(CombinedCut {
            start: first.start(),
            end: last.end(),
            text,
            aggregate_score: options.policy.aggregate(self.segments.iter().map(|s| s.score)),
            total_duration: self.duration,
            segment_count: self.segments.len(),
        })
    }
}

/// Merge consecutive segments into cuts and rank them.
///
/// A segment longer than `max_duration` forms a cut on its own. Runs that
/// never reach `min_duration` are dropped. Cuts with equal scores keep
/// transcript order.
pub fn combine(
    segments: &[ScoredSegment],
    options: &CombineOptions,
) -> PipelineResult<Vec<CombinedCut>> {
    options.validate()?;

    let mut cuts = Vec::new();
    let mut run = Run::default();

    for segment in segments {
        let fits = run.duration + segment.duration() <= options.max_duration + DURATION_EPSILON;
        if !run.segments.is_empty() && !fits {
            cuts.extend(std::mem::take(&mut run).into_cut(options));
        }
        run.push(segment);
    }
    cuts.extend(run.into_cut(options));

    // Stable sort keeps chronological order among equal scores.
    cuts.sort_by(|a, b| b.aggregate_score.total_cmp(&a.aggregate_score));

    if let Some(limit) = options.max_cuts {
        cuts.truncate(limit);
    }

    debug!("Combined {} segments into {} cuts", segments.len(), cuts.len());
    Ok(cuts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_models::{SentimentLabel, TranscriptSegment};

    fn seg(start: f64, end: f64, score: f64) -> ScoredSegment {
        ScoredSegment::new(
            TranscriptSegment::new(start, end, format!("s{}", start)),
            SentimentLabel::Positive,
            score,
        )
    }

    fn options(min: f64, max: f64) -> CombineOptions {
        CombineOptions {
            min_duration: min,
            max_duration: max,
            max_cuts: None,
            policy: AggregatePolicy::Sum,
        }
    }

    #[test]
    fn test_combine_respects_duration_bounds() {
        // 10s segments: runs of 3 (30s) fit under max 30
        let segments: Vec<_> = (0..8).map(|i| seg(i as f64 * 10.0, i as f64 * 10.0 + 10.0, 0.5)).collect();
        let cuts = combine(&segments, &options(20.0, 30.0)).unwrap();

        // 30 + 30 + 20 seconds
        assert_eq!(cuts.len(), 3);
        for cut in &cuts {
            assert!(cut.total_duration >= 20.0 && cut.total_duration <= 30.0);
        }
    }

    #[test]
    fn test_residual_run_is_dropped() {
        let segments = vec![seg(0.0, 20.0, 0.5), seg(20.0, 40.0, 0.5), seg(40.0, 45.0, 0.9)];
        let cuts = combine(&segments, &options(30.0, 40.0)).unwrap();
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].start, 0.0);
        assert_eq!(cuts[0].end, 40.0);
        assert_eq!(cuts[0].text, "s0 s20");
    }

    #[test]
    fn test_oversized_segment_is_its_own_cut() {
        let segments = vec![seg(0.0, 120.0, 0.6), seg(120.0, 160.0, 0.6), seg(160.0, 200.0, 0.6)];
        let cuts = combine(&segments, &options(60.0, 90.0)).unwrap();

        assert_eq!(cuts.len(), 2);
        let oversized = cuts.iter().find(|c| c.start == 0.0).unwrap();
        assert_eq!(oversized.segment_count, 1);
        assert_eq!(oversized.total_duration, 120.0);
        let rest = cuts.iter().find(|c| c.start == 120.0).unwrap();
        assert_eq!(rest.total_duration, 80.0);
    }

    #[test]
    fn test_ranking_is_stable_for_equal_scores() {
        let segments = vec![
            seg(0.0, 30.0, 0.5),
            seg(30.0, 60.0, 0.9),
            seg(60.0, 90.0, 0.5),
            seg(90.0, 120.0, 0.5),
        ];
        let mut opts = options(30.0, 30.0);
        opts.max_cuts = Some(3);
        let cuts = combine(&segments, &opts).unwrap();

        let starts: Vec<f64> = cuts.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![30.0, 0.0, 60.0]);
    }

    #[test]
    fn test_total_duration_ignores_gaps() {
        let segments = vec![seg(0.0, 10.0, 0.5), seg(50.0, 60.0, 0.5)];
        let cuts = combine(&segments, &options(15.0, 30.0)).unwrap();
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].total_duration, 20.0);
        assert_eq!(cuts[0].end - cuts[0].start, 60.0);
    }

    #[test]
    fn test_max_policy() {
        let segments = vec![seg(0.0, 30.0, 0.6), seg(30.0, 60.0, 0.8)];
        let mut opts = options(30.0, 60.0);
        opts.policy = AggregatePolicy::Max;
        let cuts = combine(&segments, &opts).unwrap();
        assert_eq!(cuts[0].aggregate_score, 0.8);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            combine(&[], &options(90.0, 60.0)),
            Err(PipelineError::Config(_))
        ));
        assert!(combine(&[], &options(0.0, 60.0)).is_err());
        assert!(combine(&[], &options(60.0, 90.0)).unwrap().is_empty());
    }
}
