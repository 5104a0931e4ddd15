//! The uniform response envelope returned by every API call.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a single API call.
///
/// Failures never surface as `Err`; callers branch on [`ApiResponse::ok`].
/// Serializes as `{ "ok": bool, "data"?: any, "error"?: string }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Convert into a `Result` for callers that want `?`.
    ///
    /// A successful envelope without data is reported as an error, so use
    /// this only with endpoints that always return a body.
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("Response contained no data".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}

impl ApiResponse<Value> {
    /// Decode the payload into a typed envelope.
    ///
    /// Failures pass through unchanged; a payload that does not match `T`
    /// turns a success into a failure.
    pub fn decode<T: DeserializeOwned>(self) -> ApiResponse<T> {
        if !self.ok {
            return ApiResponse {
                ok: false,
                data: None,
                error: self.error,
            };
        }

        match serde_json::from_value(self.data.unwrap_or(Value::Null)) {
            Ok(data) => ApiResponse::success(data),
            Err(e) => ApiResponse::failure(format!("Invalid response from server: {}", e)),
        }
    }
}
