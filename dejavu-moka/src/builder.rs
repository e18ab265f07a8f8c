//! Builder for configuring [`MokaBackend`].

use std::time::{Duration, Instant};

use chrono::Utc;
use dejavu_core::Fingerprint;
use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;

use crate::backend::{Entry, MokaBackend};

/// Expiration policy that derives each entry's TTL from its expiry timestamp.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<Fingerprint, Entry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &Fingerprint,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(value))
    }

    fn expire_after_update(
        &self,
        _key: &Fingerprint,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Moka keeps the old deadline by default; a rewrite must reset it.
        Some(Self::remaining(value))
    }
}

impl Expiration {
    fn remaining(value: &Entry) -> Duration {
        let millis = (value.expire - Utc::now()).num_milliseconds();
        if millis <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(millis as u64)
        }
    }
}

/// Marker type: capacity has not been configured yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaBackend`].
///
/// `build()` is only available once [`max_entries`](Self::max_entries) has
/// been called.
///
/// ```
/// use dejavu_moka::{EvictionPolicy, MokaBackend};
///
/// let backend = MokaBackend::builder()
///     .label("fingerprints")
///     .max_entries(50_000)
///     .eviction_policy(EvictionPolicy::lru())
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap> {
    capacity: Cap,
    label: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of fingerprints kept in memory.
    ///
    /// Once full, Moka evicts entries according to the eviction policy even
    /// if their TTL has not elapsed.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaBackendBuilder<Cap> {
    /// Sets the label used in logs and metrics.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy used when capacity is reached.
    ///
    /// # Default
    ///
    /// [`EvictionPolicy::tiny_lfu()`]
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaBackendBuilder<EntryCapacity> {
    /// Builds the [`MokaBackend`].
    pub fn build(self) -> MokaBackend {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<Fingerprint, Entry> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();

        MokaBackend {
            cache,
            label: self.label,
        }
    }
}
