use std::sync::Arc;
use std::time::Duration;

use dejavu::{Config, DEFAULT_TTL, Deduplicator, MAX_TTL};
use dejavu_backend::Backend as BackendTrait;
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::ConfigError;
use crate::rule::RuleConfig;

/// Deduplicator backed by the store selected in the configuration.
pub type ConfiguredDeduplicator = Deduplicator<Arc<dyn BackendTrait + Send + 'static>>;

/// Top-level deduplication configuration.
///
/// ```yaml
/// marker: true
/// ttl: 60s
/// backend:
///   type: Moka
///   max_capacity: 10000
/// rules:
///   - method: get
///     route: /home
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Mark responses to duplicate requests.
    #[serde(default)]
    pub marker: bool,
    /// How long a fingerprint stays "seen" (e.g. "500ms", "60s", "5m").
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
    /// Fingerprint store.
    #[serde(default)]
    pub backend: Backend,
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            marker: false,
            ttl: DEFAULT_TTL,
            backend: Backend::default(),
            rules: Vec::new(),
        }
    }
}

impl DedupConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates the rules and builds a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRule`] for the first rule that cannot be
    /// built, [`ConfigError::ZeroTtl`] for a zero TTL and
    /// [`ConfigError::TtlTooLong`] for a TTL above [`MAX_TTL`].
    pub fn into_config(self) -> Result<Config, ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.ttl > MAX_TTL {
            return Err(ConfigError::TtlTooLong {
                ttl: self.ttl,
                max: MAX_TTL,
            });
        }
        let rules = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                rule.into_rule()
                    .map_err(|source| ConfigError::InvalidRule { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config::builder()
            .rules(rules)
            .ttl(self.ttl)
            .marker(self.marker)
            .build())
    }

    /// Builds a ready to use deduplicator with the configured store.
    pub fn into_deduplicator(mut self) -> Result<ConfiguredDeduplicator, ConfigError> {
        let backend = std::mem::take(&mut self.backend).into_backend();
        let config = self.into_config()?;
        Ok(Deduplicator::from_shared(Arc::new(config), Arc::new(backend)))
    }
}
