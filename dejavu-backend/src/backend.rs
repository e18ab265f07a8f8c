use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use dejavu_core::Fingerprint;

use crate::{BackendError, Sighting};

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Time-to-live keyed fingerprint store.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Returns the sighting stored under `key` if present and not expired.
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<Sighting>>;

    /// Stores `value` under `key`, replacing any previous entry and resetting
    /// its expiry to `ttl` from now.
    async fn write(&self, key: &Fingerprint, value: Sighting, ttl: Duration) -> BackendResult<()>;

    /// Returns the name of this backend for logs and metrics labels.
    fn label(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<Sighting>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &Fingerprint, value: Sighting, ttl: Duration) -> BackendResult<()> {
        (*self).write(key, value, ttl).await
    }

    fn label(&self) -> &str {
        (*self).label()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<Sighting>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &Fingerprint, value: Sighting, ttl: Duration) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<Sighting>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &Fingerprint, value: Sighting, ttl: Duration) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}
