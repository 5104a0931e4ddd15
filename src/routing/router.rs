//! Rule lookup.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Targets parsed once at startup, never per request
//! - Longest matching prefix wins, so the outcome does not depend on rule
//!   order in the config file
//! - Explicit `None` rather than a silent default

use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use thiserror::Error;
use url::Url;

use crate::config::RuleConfig;
use crate::routing::matcher::PathPrefixMatcher;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid target '{target}' for rule '{prefix}': {reason}")]
    InvalidTarget {
        prefix: String,
        target: String,
        reason: String,
    },
}

/// A compiled prefix rule.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    matcher: PathPrefixMatcher,
    scheme: Scheme,
    authority: Authority,
}

impl ProxyRule {
    pub fn from_config(config: &RuleConfig) -> Result<Self, RoutingError> {
        let invalid = |reason: String| RoutingError::InvalidTarget {
            prefix: config.prefix.clone(),
            target: config.target.clone(),
            reason,
        };

        let url = Url::parse(&config.target).map_err(|e| invalid(e.to_string()))?;
        let scheme = Scheme::from_str(url.scheme()).map_err(|e| invalid(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            matcher: PathPrefixMatcher::new(config.prefix.clone()),
            scheme,
            authority,
        })
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// The backend `host[:port]`, also used as the forwarded `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Target origin, e.g. `http://localhost:5000`.
    pub fn target(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }
}

/// Immutable table of prefix rules.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<ProxyRule>,
}

impl RuleTable {
    pub fn from_config(configs: &[RuleConfig]) -> Result<Self, RoutingError> {
        let mut rules = configs
            .iter()
            .map(ProxyRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        // Most specific first; stable sort keeps config order among equals.
        rules.sort_by(|a, b| b.matcher.specificity().cmp(&a.matcher.specificity()));

        Ok(Self { rules })
    }

    /// Find the rule owning `path`.
    pub fn match_path(&self, path: &str) -> Option<&ProxyRule> {
        self.rules.iter().find(|r| r.matcher.matches_path(path))
    }

    pub fn rules(&self) -> &[ProxyRule] {
        &self.rules
    }
}
