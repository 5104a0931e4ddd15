//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every
//! section has defaults, so an empty file yields the stock dev setup:
//! `/api` and `/uploads` forwarded to `http://localhost:5000`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default backend origin for local development.
pub const DEFAULT_TARGET: &str = "http://localhost:5000";

/// Root configuration for the dev proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Prefix rules forwarded to the backend.
    pub rules: Vec<RuleConfig>,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Directory served for requests no rule matches (the built front end).
    pub static_dir: Option<PathBuf>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            rules: vec![
                RuleConfig::new("/api", DEFAULT_TARGET),
                RuleConfig::new("/uploads", DEFAULT_TARGET),
            ],
            timeouts: TimeoutConfig::default(),
            static_dir: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Point every rule at `target`.
    pub fn retarget(&mut self, target: &str) {
        for rule in &mut self.rules {
            rule.target = target.to_string();
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// A path prefix forwarded to a backend origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Path prefix to match (e.g., "/api").
    pub prefix: String,

    /// Backend origin (e.g., "http://localhost:5000").
    pub target: String,
}

impl RuleConfig {
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

/// Timeout configuration for upstream connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 5 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "kennel_bridge=debug,tower_http=debug".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
