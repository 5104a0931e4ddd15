//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. Every problem is
//! reported, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("at least one rule is required")]
    NoRules,

    #[error("rule prefix '{0}' must start with '/'")]
    PrefixNotAbsolute(String),

    #[error("rule prefix '{0}' is declared more than once")]
    DuplicatePrefix(String),

    #[error("rule target '{target}' for '{prefix}' is not an http origin")]
    Target { prefix: String, target: String },

    #[error("timeouts.connect_secs must be greater than zero")]
    ConnectTimeout,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check `config` and return every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.rules.is_empty() {
        errors.push(ValidationError::NoRules);
    }

    let mut seen = HashSet::new();
    for rule in &config.rules {
        if !rule.prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(rule.prefix.clone()));
        }
        if !seen.insert(rule.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(rule.prefix.clone()));
        }
        if !is_http_origin(&rule.target) {
            errors.push(ValidationError::Target {
                prefix: rule.prefix.clone(),
                target: rule.target.clone(),
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ConnectTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_origin(target: &str) -> bool {
    match Url::parse(target) {
        Ok(url) => url.scheme() == "http" && url.host_str().is_some(),
        Err(_) => false,
    }
}
