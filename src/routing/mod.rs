//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (rule lookup)
//!     → matcher.rs (prefix test)
//!     → Return: matched ProxyRule or None
//!
//! Rule compilation (at startup):
//!     RuleConfig[]
//!     → parse target origins
//!     → sort by prefix length
//!     → freeze as immutable RuleTable
//! ```

pub mod matcher;
pub mod router;

pub use router::{ProxyRule, RoutingError, RuleTable};
