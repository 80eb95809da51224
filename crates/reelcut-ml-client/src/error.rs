//! ML client error types.

use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MlError {
    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::ServiceUnavailable(_) | MlError::Timeout(_) => true,
            MlError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Map a non-success HTTP status to an error. 429 and 5xx are retryable.
    pub fn from_status(service: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let message = format!("{} returned {}: {}", service, status, truncate(body, 500));
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            MlError::ServiceUnavailable(message)
        } else {
            MlError::RequestFailed(message)
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classification() {
        assert!(MlError::from_status("svc", StatusCode::SERVICE_UNAVAILABLE, "").is_retryable());
        assert!(MlError::from_status("svc", StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(!MlError::from_status("svc", StatusCode::BAD_REQUEST, "").is_retryable());
        assert!(!MlError::InvalidResponse("x".into()).is_retryable());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ação", 2), "aç");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
