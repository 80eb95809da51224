//! Timestamp parsing and formatting utilities.
//!
//! Clock tokens found in suggestion text come in two shapes, `MM:SS` and
//! `HH:MM:SS`. Everything downstream works in seconds (`f64`).

use thiserror::Error;

/// Parse a clock token (`MM:SS` or `HH:MM:SS`) to total seconds.
///
/// # Examples
/// ```
/// use reelcut_models::timestamp::parse_clock;
/// assert_eq!(parse_clock("20:40").unwrap(), 1240.0);
/// assert_eq!(parse_clock("01:02:03").unwrap(), 3723.0);
/// ```
pub fn parse_clock(token: &str) -> Result<f64, TimestampError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = token.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(TimestampError::InvalidFormat(token.to_string())),
    };

    let hours = parse_component("hours", hours)?;
    let minutes = parse_component("minutes", minutes)?;
    let seconds = parse_component("seconds", seconds)?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_component(name: &'static str, value: &str) -> Result<f64, TimestampError> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, value.to_string()))?;
    if parsed < 0.0 || !parsed.is_finite() {
        return Err(TimestampError::InvalidValue(name, value.to_string()));
    }
    Ok(parsed)
}

/// Format seconds as `HH:MM:SS`, dropping any fractional part.
pub fn format_seconds(total_secs: f64) -> String {
    let total = total_secs.max(0.0).floor() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` from one hour on, the shapes
/// used when presenting a transcript to the suggestion model.
pub fn format_clock(total_secs: f64) -> String {
    let total = total_secs.max(0.0).floor() as u64;
    if total >= 3600 {
        format_seconds(total as f64)
    } else {
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

/// Format seconds as an SRT cue time (`HH:MM:SS,mmm`).
pub fn format_srt_time(total_secs: f64) -> String {
    let millis_total = (total_secs.max(0.0) * 1000.0).round() as u64;
    let millis = millis_total % 1000;
    let secs = millis_total / 1000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis
    )
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("timestamp cannot be empty")]
    Empty,

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("invalid timestamp format '{0}', expected MM:SS or HH:MM:SS")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_mm_ss() {
        assert_eq!(parse_clock("00:01").unwrap(), 1.0);
        assert_eq!(parse_clock("03:00").unwrap(), 180.0);
        assert_eq!(parse_clock("20:40").unwrap(), 1240.0);
    }

    #[test]
    fn test_parse_clock_hh_mm_ss() {
        assert_eq!(parse_clock("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_clock("01:30:45").unwrap(), 5445.0);
        // Minute counts past an hour are accepted as written.
        assert_eq!(parse_clock("100:00").unwrap(), 6000.0);
    }

    #[test]
    fn test_parse_clock_rejects_other_shapes() {
        assert!(matches!(parse_clock(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_clock("90"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(
            parse_clock("1:2:3:4"),
            Err(TimestampError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_clock("ab:10"),
            Err(TimestampError::InvalidValue("minutes", _))
        ));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.7), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(61.0), "01:01");
        assert_eq!(format_clock(3599.9), "59:59");
        assert_eq!(format_clock(3725.0), "01:02:05");
        assert_eq!(format_clock(6000.0), "01:40:00");
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3.5), "00:00:03,500");
        assert_eq!(format_srt_time(3723.042), "01:02:03,042");
    }
}
