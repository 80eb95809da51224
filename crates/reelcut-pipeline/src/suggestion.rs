//! Suggestion prompt and parsing of free-text highlight suggestions.
//!
//! The language model answers in a loose line format:
//!
//! ```text
//! ---
//! Pontos relevantes:
//! - De 00:01 a 03:00: Discussão sobre investimento
//! Pontos irrelevantes:
//! - De 00:00 a 00:40: Introdução
//! Hashtags:
//! #investimento #finanças
//! Resumo:
//! Estratégias de investimento.
//! Score:
//! 8.5
//! ---
//! ```
//!
//! Parsing recovers per line: a malformed line is reported and skipped
//! while the remaining lines still produce ranges.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use reelcut_models::timestamp::{format_clock, parse_clock};
use reelcut_models::{CutDetails, RangeEnd, TimeRange, TimestampError, TranscriptSegment};

// Whole tokens only: `100:00` must not match as `00:00`.
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{2,}:\d{2}(?::\d{2})?\b").expect("time token pattern")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern"));

static DETAIL_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s*_#]*(resumo|summary|hashtags|score)[\s*_]*:[\s*_]*(.*)$")
        .expect("detail heading pattern")
});

const RELEVANT_MARKERS: &[&str] = &["pontos relevantes:", "relevant points:"];
const IRRELEVANT_MARKERS: &[&str] = &["pontos irrelevantes:", "irrelevant points:"];

/// Phrases meaning "until the end of the video".
const END_PHRASES: &[&str] = &[
    "ao final",
    "ao fim",
    "até o fim",
    "no final",
    "até o final",
    "no fim",
    "to the end",
    "until the end",
];

const LIST_MARKERS: &[char] = &['-', '*', '•', '–'];

/// Why a suggestion line produced no range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("no time tokens found")]
    NoTimestamps,

    #[error("expected two time tokens, found {0}")]
    UnexpectedTokenCount(usize),

    #[error("single time token without an end-of-video phrase")]
    MissingEndPhrase,

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("range end {end:.0}s is not after start {start:.0}s")]
    EmptyRange { start: f64, end: f64 },
}

/// A relevant-section line that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFailure {
    /// 1-based line number in the suggestion text
    pub line_number: usize,
    pub line: String,
    pub reason: LineError,
}

/// Result of parsing suggestion text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionParse {
    /// Ranges in suggestion order, with touching ranges merged
    pub ranges: Vec<TimeRange>,
    pub failures: Vec<LineFailure>,
}

/// Parse suggestion text into time ranges.
pub fn parse_suggestions(text: &str) -> SuggestionParse {
    let mut parse = SuggestionParse::default();
    let mut in_relevant = false;

    for (index, line) in text.lines().enumerate() {
        let lowered = line.to_lowercase();

        // The irrelevant marker contains the relevant one; test it first.
        if IRRELEVANT_MARKERS.iter().any(|m| lowered.contains(m)) {
            in_relevant = false;
            continue;
        }
        if RELEVANT_MARKERS.iter().any(|m| lowered.contains(m)) {
            in_relevant = true;
            continue;
        }
        if line.trim() == "---" {
            in_relevant = false;
            continue;
        }
        if !in_relevant || !is_list_item(line) {
            continue;
        }

        match parse_line(line) {
            Ok(range) => push_merged(&mut parse.ranges, range),
            Err(reason) => parse.failures.push(LineFailure {
                line_number: index + 1,
                line: line.trim().to_string(),
                reason,
            }),
        }
    }

    parse
}

fn is_list_item(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    match (chars.next(), chars.next()) {
        (Some(marker), Some(next)) => LIST_MARKERS.contains(&marker) && next.is_whitespace(),
        _ => false,
    }
}

/// Parse one list item into a range.
pub fn parse_line(line: &str) -> Result<TimeRange, LineError> {
    let tokens: Vec<&str> = TIME_TOKEN.find_iter(line).map(|m| m.as_str()).collect();

    match tokens.as_slice() {
        [] => Err(LineError::NoTimestamps),
        [start, end] => {
            let start = parse_clock(start)?;
            let end = parse_clock(end)?;
            if end <= start {
                return Err(LineError::EmptyRange { start, end });
            }
            Ok(TimeRange::new(start, end))
        }
        [start] => {
            let lowered = line.to_lowercase();
            if END_PHRASES.iter().any(|p| lowered.contains(p)) {
                Ok(TimeRange::to_end(parse_clock(start)?))
            } else {
                Err(LineError::MissingEndPhrase)
            }
        }
        more => Err(LineError::UnexpectedTokenCount(more.len())),
    }
}

/// Append `range`, extending the previous range when it ends exactly where
/// `range` starts. Open-ended ranges are never extended.
fn push_merged(ranges: &mut Vec<TimeRange>, range: TimeRange) {
    if let Some(last) = ranges.last_mut() {
        if let RangeEnd::At(end) = last.end {
            if (end - range.start).abs() < 1e-6 {
                last.end = range.end;
                return;
            }
        }
    }
    ranges.push(range);
}

/// Extract per-cut metadata from `---` separated blocks.
///
/// Blocks missing a summary, hashtags or score are ignored.
pub fn parse_cut_details(text: &str) -> Vec<CutDetails> {
    split_blocks(text)
        .into_iter()
        .filter_map(|block| parse_details_block(&block))
        .collect()
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = vec![Vec::new()];
    for line in text.lines() {
        if line.trim() == "---" {
            blocks.push(Vec::new());
        } else if let Some(current) = blocks.last_mut() {
            current.push(line);
        }
    }
    blocks.retain(|b| b.iter().any(|l| !l.trim().is_empty()));
    blocks
}

fn parse_details_block(lines: &[&str]) -> Option<CutDetails> {
    let mut summary = None;
    let mut hashtags = None;
    let mut score = None;

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = DETAIL_HEADING.captures(line.trim()) else {
            continue;
        };
        let inline = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        // Value is either on the heading line or the next non-empty one.
        let value = if inline.is_empty() {
            lines[i + 1..]
                .iter()
                .map(|l| l.trim())
                .find(|l| !l.is_empty())
                .unwrap_or_default()
        } else {
            inline
        };
        if value.is_empty() {
            continue;
        }

        match caps[1].to_lowercase().as_str() {
            "resumo" | "summary" => summary = Some(value.to_string()),
            "hashtags" => hashtags = Some(parse_hashtags(value)),
            "score" => score = parse_score(value),
            _ => {}
        }
    }

    Some(CutDetails {
        summary: summary?,
        hashtags: hashtags.filter(|h| !h.is_empty())?,
        score: score?,
    })
}

fn parse_hashtags(value: &str) -> Vec<String> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t))
        .collect()
}

fn parse_score(value: &str) -> Option<f64> {
    NUMBER
        .find(value)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

const PROMPT_HEADER: &str = "\
Abaixo está a transcrição de um vídeo, com a marcação de minutos e segundos de cada trecho.
Analise e divida os trechos em duas categorias: Pontos relevantes e Pontos irrelevantes.
Crie cortes de 2 a 3 minutos cada, que transmitam a ideia central com um fluxo coerente.

Transcrição:
";

const PROMPT_FOOTER: &str = "
Para cada corte, informe:
Pontos relevantes: momentos importantes, com marcação de minutos e segundos.
Pontos irrelevantes: trechos que podem ser ignorados, com marcação de minutos e segundos.
Hashtags: cerca de 5 hashtags relevantes e com alto potencial de engajamento.
Resumo: no máximo 255 caracteres.
Score: potencial de viralização entre 0 e 10 para TikTok, Shorts e Reels.

Formato de saída (não altere este modelo):
---
Pontos relevantes:
- De 00:01 a 03:00: Discussão sobre investimento
Pontos irrelevantes:
- De 00:00 a 00:40: Introdução
Hashtags:
#investimento #finanças #sucesso #crescimento #dinheiro
Resumo:
Foco nas melhores estratégias de investimento e no crescimento financeiro.
Score:
8.5
---

Use sempre dois horários por linha (início e fim). A precisão dos minutos e segundos é essencial.
";

/// Build the suggestion prompt for a transcript.
///
/// Each segment is rendered as a `[MM:SS] text` line, or `[HH:MM:SS] text`
/// from one hour on.
pub fn build_prompt(segments: &[TranscriptSegment]) -> String {
    let mut prompt = String::from(PROMPT_HEADER);
    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        prompt.push_str(&format!("[{}] {}\n", format_clock(segment.start), text));
    }
    prompt.push_str(PROMPT_FOOTER);
    prompt
}
