//! Declarative configuration for dejavu.
//!
//! Rules, TTL, marker toggle and fingerprint store are read from YAML (via
//! `serde-saphyr`) or JSON and validated into a [`dejavu::Config`]. Validation
//! happens once, at startup; every error is reported with the index of the
//! offending rule.
//!
//! Predicate matchers only exist in code and cannot be declared here.
//!
//! ```
//! use dejavu_configuration::DedupConfig;
//!
//! let config = DedupConfig::from_yaml(
//!     r#"
//! marker: true
//! ttl: 60s
//! rules:
//!   - method: get
//!     route: /home
//! "#,
//! )
//! .unwrap()
//! .into_config()
//! .unwrap();
//!
//! assert_eq!(config.rules().len(), 1);
//! assert!(config.marker_enabled());
//! ```

#![warn(missing_docs)]

/// Fingerprint store configuration.
pub mod backend;
mod config;
mod error;
pub mod rule;

pub use backend::{Backend, Moka};
pub use config::{ConfiguredDeduplicator, DedupConfig};
pub use error::ConfigError;
pub use rule::{BodyOperation, MethodOperation, RouteOperation, RuleConfig};
