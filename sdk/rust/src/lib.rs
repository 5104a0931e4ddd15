//! Client-side access to the kennel backend API.
//!
//! All network access from application code goes through [`ApiClient`].
//! Each call resolves to an [`ApiResponse`] envelope:
//!
//! ```text
//! { "ok": true,  "data": <parsed body> }
//! { "ok": false, "error": "<message>" }
//! ```
//!
//! HTTP failures, connection failures and malformed bodies all become
//! `ok: false`; no request method returns `Err`. The underlying HTTP client
//! is never exposed.

mod client;
mod envelope;
mod error;
mod resource;

pub use client::{ApiClient, ApiConfig, UploadFile};
pub use envelope::ApiResponse;
pub use error::ApiError;
pub use resource::{format_api_url, format_with_root, DEFAULT_API_ROOT};
