use std::time::Duration;

use dejavu::RuleError;
use thiserror::Error;

/// Error raised while loading or validating a deduplication configuration.
///
/// Every variant is fatal: a configuration that fails to load must stop
/// startup rather than silently deduplicate less than declared.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("invalid YAML configuration: {0}")]
    Yaml(String),
    /// The JSON document could not be parsed.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A rule declares a matcher the engine does not support.
    #[error("invalid rule #{index}: {source}")]
    InvalidRule {
        /// Position of the rule in the `rules` list.
        index: usize,
        /// What is wrong with it.
        #[source]
        source: RuleError,
    },
    /// The TTL is zero, so no request could ever be a duplicate.
    #[error("ttl must be greater than zero")]
    ZeroTtl,
    /// The TTL exceeds [`dejavu::MAX_TTL`].
    #[error("ttl of {ttl:?} exceeds the maximum of {max:?}")]
    TtlTooLong {
        /// Configured TTL.
        ttl: Duration,
        /// Largest accepted TTL.
        max: Duration,
    },
}
