//! Kennel development bridge.
//!
//! Forwards the front end's `/api` and `/uploads` traffic to the backend
//! during local development, turning connection failures into a JSON
//! `500 Proxy Error` response. The matching client side lives in the
//! `kennel-api` crate.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::BridgeConfig;
pub use http::DevProxy;
pub use lifecycle::Shutdown;
