//! Moka backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dejavu_backend::{Backend, BackendError, BackendResult, Sighting};
use dejavu_core::Fingerprint;
use moka::future::Cache;
use smol_str::SmolStr;

/// Stored sighting together with its absolute expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) sighting: Sighting,
    pub(crate) expire: DateTime<Utc>,
}

impl Entry {
    pub(crate) fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expire > now
    }
}

/// In-memory fingerprint store powered by Moka.
///
/// Each entry carries its own expiry, derived from the `ttl` passed to
/// [`Backend::write`]. A rewrite replaces the expiry rather than keeping the
/// old one, which is what lets repeated requests extend their window.
///
/// # Caveats
///
/// - Data is **not persisted**; it is lost on process restart
/// - Data is **not shared** across processes
/// - Moka evicts expired entries lazily, so [`MokaBackend::entry_count`] may
///   include expired entries until maintenance runs; reads never return them
#[derive(Clone)]
pub struct MokaBackend {
    pub(crate) cache: Cache<Fingerprint, Entry>,
    pub(crate) label: SmolStr,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder. Capacity must be set before building.
    pub fn builder() -> crate::builder::MokaBackendBuilder<crate::builder::NoCapacity> {
        crate::builder::MokaBackendBuilder::new()
    }

    /// Approximate number of entries, expired ones included until evicted.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance tasks such as expiry and eviction.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<Sighting>> {
        let now = Utc::now();
        Ok(self
            .cache
            .get(key)
            .await
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.sighting))
    }

    async fn write(&self, key: &Fingerprint, value: Sighting, ttl: Duration) -> BackendResult<()> {
        let ttl = chrono::Duration::from_std(ttl).map_err(BackendError::internal)?;
        let expire = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| BackendError::internal("ttl is out of the supported time range"))?;
        let entry = Entry {
            sighting: value,
            expire,
        };
        self.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}
