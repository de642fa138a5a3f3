use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced a response.
    Transport,
    /// A response arrived with a non-2xx status.
    Http,
    /// A 2xx response carried an `error` field.
    Application,
    /// A 2xx response body did not match the expected schema.
    Decode,
    /// The caller's input was rejected before any request was sent.
    InvalidInput,
}

/// The single error type surfaced by the stock API client.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn transport(context: &str, cause: impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            message: format!("{context}: {cause}"),
            status_code: None,
            details: None,
        }
    }

    /// Uses the body's `detail` string when present, otherwise a generic status message.
    pub fn http(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let detail = parsed
            .as_ref()
            .and_then(|v| v.get("detail"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            kind: ApiErrorKind::Http,
            message: detail.unwrap_or_else(|| format!("HTTP error! status: {status}")),
            status_code: Some(status),
            details: parsed,
        }
    }

    pub fn application(message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            kind: ApiErrorKind::Application,
            message: message.into(),
            status_code: None,
            details,
        }
    }

    pub fn decode(context: &str, cause: impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: format!("{context}: {cause}"),
            status_code: None,
            details: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::InvalidInput,
            message: message.into(),
            status_code: None,
            details: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "API error (status={status}): {}", self.message),
            None => write!(f, "API error ({:?}): {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}
