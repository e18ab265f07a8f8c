use std::time::Duration;

use dejavu_core::{Rule, RuleSet};

/// Default time-to-live of a fingerprint: one minute.
pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);

/// Longest TTL the configuration loader accepts: one hundred years.
///
/// Stores reject a TTL whose deadline falls outside the representable time
/// range with a backend error.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Default capacity of the in-memory store created by [`Deduplicator::new`].
///
/// [`Deduplicator::new`]: crate::Deduplicator::new
pub const DEFAULT_MAX_ENTRIES: u64 = 100_000;

/// Deduplication settings, built once at startup.
///
/// | Setting | Default |
/// |---------|---------|
/// | rules | none (nothing is deduplicated) |
/// | ttl | [`DEFAULT_TTL`] |
/// | marker | disabled |
#[derive(Debug, Clone)]
pub struct Config {
    rules: RuleSet,
    ttl: Duration,
    marker: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            ttl: DEFAULT_TTL,
            marker: false,
        }
    }
}

impl Config {
    /// Creates a new [`ConfigBuilder`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// How long a fingerprint stays "seen".
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the host should mark duplicate responses.
    pub fn marker_enabled(&self) -> bool {
        self.marker
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Appends a rule after the ones already added.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.config.rules.push(rule);
        self
    }

    /// Appends several rules, keeping their order.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        for rule in rules {
            self.config.rules.push(rule);
        }
        self
    }

    /// Sets the fingerprint time-to-live.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Enables or disables the duplicate marker.
    pub fn marker(mut self, enabled: bool) -> Self {
        self.config.marker = enabled;
        self
    }

    /// Finalizes the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}
