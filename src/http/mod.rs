//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace layer)
//!     → request.rs (request id for log correlation)
//!     → routing::RuleTable (prefix lookup)
//!         matched   → forward to rule target, stream response back
//!         unmatched → static_dir or 404
//!     → response.rs (upstream failure → 500 JSON)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, X_REQUEST_ID};
pub use response::{ProxyError, ProxyErrorBody, BACKEND_UNREACHABLE, PROXY_ERROR};
pub use server::DevProxy;
