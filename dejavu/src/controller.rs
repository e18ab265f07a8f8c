use std::sync::Arc;

use chrono::Utc;
use dejavu_backend::{Backend, Sighting};
use dejavu_core::RequestDescriptor;
use dejavu_moka::MokaBackend;
use tracing::{debug, error, warn};

use crate::config::{Config, DEFAULT_MAX_ENTRIES};
use crate::error::DedupError;
use crate::metrics;

/// Outcome of [`Deduplicator::process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decision {
    /// A rule matched the request.
    pub matched: bool,
    /// The request's fingerprint was already present in the store.
    pub duplicate: bool,
}

impl Decision {
    /// Decision for a request no rule matched.
    pub const UNMATCHED: Decision = Decision {
        matched: false,
        duplicate: false,
    };
}

/// Evaluates rules, fingerprints matched requests and tracks them in a store.
///
/// Cloning is cheap: configuration and backend are shared behind `Arc`s, so a
/// single deduplicator can serve any number of concurrent requests.
pub struct Deduplicator<B = MokaBackend> {
    config: Arc<Config>,
    backend: Arc<B>,
}

impl<B> Clone for Deduplicator<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B> std::fmt::Debug for Deduplicator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("config", &self.config)
            .field("backend", &std::any::type_name::<B>())
            .finish()
    }
}

impl Deduplicator<MokaBackend> {
    /// Creates a deduplicator backed by an in-memory Moka store holding up to
    /// [`DEFAULT_MAX_ENTRIES`] fingerprints.
    pub fn new(config: Config) -> Self {
        let backend = MokaBackend::builder()
            .max_entries(DEFAULT_MAX_ENTRIES)
            .build();
        Self::with_backend(config, backend)
    }
}

impl<B> Deduplicator<B> {
    /// Creates a deduplicator over `backend`.
    pub fn with_backend(config: Config, backend: B) -> Self {
        Self::from_shared(Arc::new(config), Arc::new(backend))
    }

    /// Creates a deduplicator from already shared parts.
    pub fn from_shared(config: Arc<Config>, backend: Arc<B>) -> Self {
        Self { config, backend }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The fingerprint store in use.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B> Deduplicator<B>
where
    B: Backend,
{
    /// Decides whether `request` repeats a recent request.
    ///
    /// A matched request costs exactly one store read and one store write; the
    /// write happens whether or not the fingerprint was present, so repeats
    /// keep extending their window. Unmatched requests return
    /// [`Decision::UNMATCHED`] without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::Backend`] if the store read or write fails. No
    /// retry is attempted.
    pub async fn process(&self, request: &RequestDescriptor) -> Result<Decision, DedupError> {
        let (matched, failures) = self.config.rules().evaluate(request).into_parts();
        for failure in &failures {
            error!(
                rule = failure.rule,
                error = %failure.error,
                "rule predicate failed, rule treated as non-matching"
            );
            metrics::record_predicate_failure(failure.rule);
        }

        let Some(matched) = matched else {
            debug!(
                method = %request.method(),
                path = request.raw_path(),
                "no deduplication rule matched"
            );
            return Ok(Decision::UNMATCHED);
        };

        let fingerprint = matched.fingerprint(request);
        let backend = self.backend.label();

        let previous = self.backend.read(&fingerprint).await.inspect_err(|err| {
            warn!(backend, %fingerprint, error = %err, "fingerprint lookup failed");
            metrics::record_backend_error(backend, "read");
        })?;

        let duplicate = previous.is_some();
        let sighting = Sighting::next(previous.as_ref(), Utc::now());

        self.backend
            .write(&fingerprint, sighting, self.config.ttl())
            .await
            .inspect_err(|err| {
                warn!(backend, %fingerprint, error = %err, "fingerprint write failed");
                metrics::record_backend_error(backend, "write");
            })?;

        debug!(
            rule = matched.index(),
            %fingerprint,
            duplicate,
            count = sighting.count,
            "request fingerprinted"
        );
        metrics::record_decision(matched.index(), duplicate);

        Ok(Decision {
            matched: true,
            duplicate,
        })
    }
}
