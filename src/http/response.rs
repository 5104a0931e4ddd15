//! Proxy failure responses.
//!
//! Upstream failures never escape the handler. Each one becomes a `500`
//! with a JSON body of the form `{"error": "Proxy Error", "message": ...}`.

use axum::http::header::InvalidHeaderValue;
use axum::http::uri::InvalidUriParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROXY_ERROR: &str = "Proxy Error";

pub const BACKEND_UNREACHABLE: &str =
    "Cannot connect to API server. Make sure the Flask server is running.";

/// JSON body sent when forwarding fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyErrorBody {
    pub error: String,
    pub message: String,
}

impl ProxyErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: PROXY_ERROR.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection refused, connect timeout, or the backend dropped the
    /// connection before responding.
    #[error("upstream request to {target} failed: {source}")]
    Upstream {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("invalid upstream uri: {0}")]
    Uri(#[from] InvalidUriParts),

    #[error("invalid upstream host header: {0}")]
    Host(#[from] InvalidHeaderValue),
}

impl ProxyError {
    pub fn body(&self) -> ProxyErrorBody {
        match self {
            ProxyError::Upstream { .. } => ProxyErrorBody::new(BACKEND_UNREACHABLE),
            other => ProxyErrorBody::new(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}
