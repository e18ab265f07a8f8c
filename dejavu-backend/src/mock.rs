//! Counting in-memory backend for tests.
//!
//! [`MockBackend`] records every call so tests can assert exactly how many
//! reads and writes a request caused, and can be switched into an
//! "unavailable" mode to exercise error paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dejavu_core::Fingerprint;

use crate::{Backend, BackendError, BackendResult, Sighting};

/// Call counters shared by clones of a [`MockBackend`].
#[derive(Debug, Default)]
pub struct BackendCounters {
    read_count: AtomicUsize,
    read_hit_count: AtomicUsize,
    write_count: AtomicUsize,
}

impl BackendCounters {
    /// Number of `read` calls.
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    /// Number of `read` calls that found a live entry.
    pub fn read_hit_count(&self) -> usize {
        self.read_hit_count.load(Ordering::SeqCst)
    }

    /// Number of `write` calls.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.read_count.store(0, Ordering::SeqCst);
        self.read_hit_count.store(0, Ordering::SeqCst);
        self.write_count.store(0, Ordering::SeqCst);
    }
}

/// In-memory backend with call counters and an outage switch.
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    entries: Arc<DashMap<Fingerprint, (Sighting, DateTime<Utc>)>>,
    counters: Arc<BackendCounters>,
    unavailable: Arc<AtomicBool>,
}

impl MockBackend {
    /// Creates an empty, available backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared call counters.
    pub fn counters(&self) -> &BackendCounters {
        &self.counters
    }

    /// Total number of `read` and `write` calls.
    pub fn call_count(&self) -> usize {
        self.counters.read_count() + self.counters.write_count()
    }

    /// Number of stored entries, expired ones included.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Makes every subsequent call fail with [`BackendError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> BackendResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BackendError::unavailable("mock backend is down"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<Sighting>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let result = self
            .entries
            .get(key)
            .filter(|entry| entry.value().1 > Utc::now())
            .map(|entry| entry.value().0);
        if result.is_some() {
            self.counters.read_hit_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(result)
    }

    async fn write(&self, key: &Fingerprint, value: Sighting, ttl: Duration) -> BackendResult<()> {
        self.counters.write_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let ttl = chrono::Duration::from_std(ttl).map_err(BackendError::internal)?;
        let expire = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| BackendError::internal("ttl is out of the supported time range"))?;
        self.entries.insert(key.clone(), (value, expire));
        Ok(())
    }

    fn label(&self) -> &str {
        "mock"
    }
}
