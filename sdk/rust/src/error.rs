//! Failure classification for API calls.
//!
//! These never reach callers as `Err` from a request method. The `Display`
//! text of each variant becomes the envelope's `error` message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL could not be parsed.
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection refused, DNS failure, timeout, broken connection.
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx status. `message` is taken from the body when it has one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request could not be built (body serialization, bad MIME type).
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// 2xx status with a body that is not JSON.
    #[error("Invalid response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status failure, preferring the backend's own message.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &[u8]) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            format!(
                "Request failed with status {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
        });

        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks for a non-empty `error` string, then a `message` string.
fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
