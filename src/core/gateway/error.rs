use std::error::Error as StdError;
use std::fmt;

const SUMMARY_LIMIT: usize = 240;

/// Coarse classification used by the UI to phrase failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Missing or rejected credentials.
    Configuration,
    /// Network trouble, server failures, or responses we could not decode.
    Transport,
    /// Parameters the API refused.
    Validation,
}

/// Errors raised while talking to the completion API.
#[derive(Debug)]
pub enum ChatError {
    /// No API key was available when the request was about to be sent.
    MissingCredential,

    /// The HTTP exchange itself failed.
    Transport(reqwest::Error),

    /// The API answered with a non-success status.
    Api {
        /// HTTP status code.
        status: u16,
        /// One-line description extracted from the response body.
        summary: String,
    },

    /// A response body did not have the expected shape.
    Decode(String),

    /// The server reported an error inside an event stream.
    Stream(String),
}

impl ChatError {
    pub fn api(status: u16, body: &str) -> Self {
        ChatError::Api {
            status,
            summary: summarize_error_body(body),
        }
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            ChatError::MissingCredential => FaultKind::Configuration,
            ChatError::Api { status, .. } => match status {
                401 | 403 => FaultKind::Configuration,
                400 | 422 => FaultKind::Validation,
                _ => FaultKind::Transport,
            },
            ChatError::Transport(_) | ChatError::Decode(_) | ChatError::Stream(_) => {
                FaultKind::Transport
            }
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingCredential => write!(
                f,
                "No API key configured. Set GROQ_API_KEY or run `playground auth`."
            ),
            ChatError::Transport(err) => write!(f, "Request failed: {err}"),
            ChatError::Api { status, summary } => write!(f, "API error ({status}): {summary}"),
            ChatError::Decode(detail) => write!(f, "Unexpected response: {detail}"),
            ChatError::Stream(detail) => write!(f, "Stream error: {detail}"),
        }
    }
}

impl StdError for ChatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ChatError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err)
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: String) -> String {
    if text.chars().count() <= SUMMARY_LIMIT {
        return text;
    }
    let mut truncated: String = text.chars().take(SUMMARY_LIMIT).collect();
    truncated.push('…');
    truncated
}

/// Reduce an error body (JSON, XML or plain text) to a single line suitable
/// for a status bar.
pub fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty response>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json) {
            let summary = collapse_whitespace(&summary);
            if !summary.is_empty() {
                return truncate(summary);
            }
        }
        return truncate(json.to_string());
    }

    truncate(collapse_whitespace(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prefers_nested_error_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(summarize_error_body(body), "Invalid API Key");
    }

    #[test]
    fn summary_accepts_string_error_and_top_level_message() {
        assert_eq!(summarize_error_body(r#"{"error":"rate limited"}"#), "rate limited");
        assert_eq!(
            summarize_error_body(r#"{"message":"model   overloaded"}"#),
            "model overloaded"
        );
    }

    #[test]
    fn summary_falls_back_to_compact_json_or_text() {
        assert_eq!(
            summarize_error_body("{\n  \"status\": \"failed\"\n}"),
            r#"{"status":"failed"}"#
        );
        assert_eq!(
            summarize_error_body("<html>\n  <body>bad gateway</body>\n</html>"),
            "<html> <body>bad gateway</body> </html>"
        );
        assert_eq!(summarize_error_body("   "), "<empty response>");
    }

    #[test]
    fn long_summaries_are_truncated() {
        let long = "x".repeat(SUMMARY_LIMIT + 50);
        let summary = summarize_error_body(&long);
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT + 1);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn status_codes_map_to_fault_kinds() {
        assert_eq!(ChatError::api(401, "").kind(), FaultKind::Configuration);
        assert_eq!(ChatError::api(400, "").kind(), FaultKind::Validation);
        assert_eq!(ChatError::api(429, "").kind(), FaultKind::Transport);
        assert_eq!(ChatError::MissingCredential.kind(), FaultKind::Configuration);
        assert_eq!(
            ChatError::Stream("boom".into()).kind(),
            FaultKind::Transport
        );
    }

    #[test]
    fn display_includes_status_and_summary() {
        let err = ChatError::api(429, r#"{"error":{"message":"Rate limit reached"}}"#);
        assert_eq!(err.to_string(), "API error (429): Rate limit reached");
    }
}
