//! SRT output for transcripts and selected cuts.

use regex::{NoExpand, Regex, RegexBuilder};
use std::path::Path;
use tracing::{debug, warn};

use reelcut_models::timestamp::format_srt_time;
use reelcut_models::TranscriptSegment;

use crate::error::PipelineResult;

/// Render segments as SRT cues numbered from 1.
pub fn write_srt(segments: &[TranscriptSegment]) -> String {
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(segment.start),
            format_srt_time(segment.end),
            segment.text.trim()
        ));
    }
    out
}

/// Split segments into cues of at most `max_words` words.
///
/// Cue times are interpolated from word positions within the segment.
pub fn split_by_words(segments: &[TranscriptSegment], max_words: usize) -> Vec<TranscriptSegment> {
    let max_words = max_words.max(1);
    let mut cues = Vec::new();

    for segment in segments {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        if words.len() <= max_words {
            cues.push(segment.clone());
            continue;
        }

        let total = words.len() as f64;
        let duration = segment.duration();
        for (i, chunk) in words.chunks(max_words).enumerate() {
            let first = (i * max_words) as f64;
            let last = first + chunk.len() as f64;
            cues.push(TranscriptSegment::new(
                segment.start + duration * first / total,
                segment.start + duration * last / total,
                chunk.join(" "),
            ));
        }
    }
    cues
}

/// Case-insensitive whole-word replacements applied to subtitle text.
#[derive(Debug, Default)]
pub struct WordFilter {
    rules: Vec<(Regex, String)>,
}

impl WordFilter {
    /// Parse `word=replacement` lines. Blank lines and `#` comments are
    /// ignored, as are lines without `=`.
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((word, replacement)) = line.split_once('=') else {
                warn!("Ignoring word filter line without '=': {}", line);
                continue;
            };
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            let pattern = format!(r"\b{}\b", regex::escape(word));
            match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(re) => rules.push((re, replacement.trim().to_string())),
                Err(e) => warn!("Ignoring word filter entry '{}': {}", word, e),
            }
        }
        debug!("Loaded {} word filter rules", rules.len());
        Self { rules }
    }

    pub async fn load(path: &Path) -> PipelineResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (re, replacement) in &self.rules {
            out = re.replace_all(&out, NoExpand(replacement)).into_owned();
        }
        out
    }

    /// Copy of `segments` with the filter applied to every text.
    pub fn apply_all(&self, segments: &[TranscriptSegment]) -> Vec<TranscriptSegment> {
        segments
            .iter()
            .map(|s| TranscriptSegment::new(s.start, s.end, self.apply(&s.text)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_srt() {
        let segments = vec![
            TranscriptSegment::new(0.0, 2.5, " Hello "),
            TranscriptSegment::new(3661.25, 3662.0, "World"),
        ];
        assert_eq!(
            write_srt(&segments),
            "1\n00:00:00,000 --> 00:00:02,500\nHello\n\n\
             2\n01:01:01,250 --> 01:01:02,000\nWorld\n\n"
        );
        assert_eq!(write_srt(&[]), "");
    }

    #[test]
    fn test_split_by_words_interpolates() {
        let segments = vec![TranscriptSegment::new(10.0, 20.0, "a b c d e f g h i j")];
        let cues = split_by_words(&segments, 4);

        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].text, "a b c d");
        assert_eq!((cues[0].start, cues[0].end), (10.0, 14.0));
        assert_eq!((cues[1].start, cues[1].end), (14.0, 18.0));
        assert_eq!(cues[2].text, "i j");
        assert_eq!((cues[2].start, cues[2].end), (18.0, 20.0));
    }

    #[test]
    fn test_split_keeps_short_segments() {
        let segments = vec![TranscriptSegment::new(0.0, 1.0, "short one")];
        assert_eq!(split_by_words(&segments, 12), segments);
    }

    #[test]
    fn test_word_filter() {
        let filter = WordFilter::parse("# comment\n\nporra=p***a\nmerda = m***a\nbroken line\n");
        assert_eq!(
            filter.apply("Que PORRA é essa, merda! Merdinha fica."),
            "Que p***a é essa, m***a! Merdinha fica."
        );
    }

    #[test]
    fn test_word_filter_replacement_is_literal() {
        let filter = WordFilter::parse("x=$1");
        assert_eq!(filter.apply("a x b"), "a $1 b");
    }

    #[tokio::test]
    async fn test_word_filter_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "bad=good\n").unwrap();
        let filter = WordFilter::load(&path).await.unwrap();
        let segments = filter.apply_all(&[TranscriptSegment::new(0.0, 1.0, "so bad")]);
        assert_eq!(segments[0].text, "so good");
        assert!(WordFilter::load(&dir.path().join("missing")).await.is_err());
    }
}
