//! Error type for calls against the platform REST API

use crate::http::ApiResponse;

/// Longest response body excerpt kept in an error message
const BODY_EXCERPT_LEN: usize = 512;

/// Error from a single API call.
///
/// Network failures carry no status. Non-success responses keep their
/// status and a body excerpt so structured error payloads end up in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Server kept answering 429 past the configured ceiling
    RateLimitExhausted { retries: u32 },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::RateLimitExhausted { retries } => {
                write!(f, "still rate limited after {retries} retries")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        // Strip URL from error to avoid leaking project ids in logs
        let e = e.without_url();
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Create HTTP error from a non-success response
    pub fn from_response(resp: &ApiResponse) -> Self {
        Self::Http {
            status: Some(resp.status),
            message: excerpt(&resp.body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::RateLimitExhausted { .. } => Some(429),
        }
    }
}

/// Trim a body to a loggable single-line excerpt
fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "(empty body)".to_string();
    }
    let mut end = body.len().min(BODY_EXCERPT_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    let cut = &body[..end];
    let flat: String = cut.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if end < body.len() {
        format!("{flat}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn display_http_with_status() {
        let err = ApiError::Http {
            status: Some(404),
            message: "test".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP 404: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = ApiError::Http {
            status: None,
            message: "timeout".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: timeout");
    }

    #[test]
    fn from_response_keeps_body() {
        let err = ApiError::from_response(&response(400, r#"{"errors":[{"detail":"bad urn"}]}"#));
        assert_eq!(err.status(), Some(400));
        assert!(format!("{err}").contains("bad urn"));
    }

    #[test]
    fn from_response_empty_body() {
        let err = ApiError::from_response(&response(500, "  "));
        assert_eq!(format!("{err}"), "HTTP 500: (empty body)");
    }

    #[test]
    fn long_body_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_response(&response(502, &body));
        let msg = format!("{err}");
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 600);
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let body = "é".repeat(400);
        let out = excerpt(&body);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn exhausted_reports_429() {
        let err = ApiError::RateLimitExhausted { retries: 3 };
        assert_eq!(err.status(), Some(429));
        assert_eq!(format!("{err}"), "still rate limited after 3 retries");
    }
}
