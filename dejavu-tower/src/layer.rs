use std::sync::Arc;

use dejavu::{Backend, Config, DEFAULT_MAX_ENTRIES, Deduplicator, MokaBackend};
use http::{HeaderName, HeaderValue};
use tower::Layer;

use crate::{DEFAULT_MARKER_HEADER, DEFAULT_MAX_BODY_BYTES};
use crate::policy::StoreFailurePolicy;
use crate::service::DedupService;

/// Tower [`Layer`] adding request deduplication to a service.
///
/// Every service produced by the layer shares the same rules and the same
/// fingerprint store.
pub struct Dedup<B = MokaBackend> {
    deduplicator: Deduplicator<B>,
    marker: Option<Marker>,
    policy: StoreFailurePolicy,
    max_body_bytes: usize,
}

/// Header inserted into responses to duplicate requests.
#[derive(Debug, Clone)]
pub(crate) struct Marker {
    pub(crate) name: HeaderName,
    pub(crate) value: HeaderValue,
}

impl<B> Clone for Dedup<B> {
    fn clone(&self) -> Self {
        Self {
            deduplicator: self.deduplicator.clone(),
            marker: self.marker.clone(),
            policy: self.policy,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl Dedup<MokaBackend> {
    /// Creates a builder with an empty rule set and an in-memory Moka store.
    pub fn builder() -> DedupBuilder<MokaBackend> {
        DedupBuilder::default()
    }
}

impl<B> Dedup<B> {
    /// Creates a layer around an existing deduplicator with the default
    /// marker header, [`StoreFailurePolicy::Fail`] and
    /// [`DEFAULT_MAX_BODY_BYTES`].
    pub fn new(deduplicator: Deduplicator<B>) -> Self {
        let marker = deduplicator
            .config()
            .marker_enabled()
            .then(|| Marker::new(DEFAULT_MARKER_HEADER));
        Self {
            deduplicator,
            marker,
            policy: StoreFailurePolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// The deduplicator shared by all services of this layer.
    pub fn deduplicator(&self) -> &Deduplicator<B> {
        &self.deduplicator
    }
}

impl<S, B> Layer<S> for Dedup<B> {
    type Service = DedupService<S, B>;

    fn layer(&self, inner: S) -> Self::Service {
        DedupService::new(
            inner,
            self.deduplicator.clone(),
            self.marker.clone(),
            self.policy,
            self.max_body_bytes,
        )
    }
}

impl Marker {
    fn new(name: HeaderName) -> Self {
        Self {
            name,
            value: HeaderValue::from_static("1"),
        }
    }
}

/// Builder for [`Dedup`].
pub struct DedupBuilder<B> {
    backend: B,
    config: Config,
    marker_header: HeaderName,
    policy: StoreFailurePolicy,
    max_body_bytes: usize,
}

impl Default for DedupBuilder<MokaBackend> {
    fn default() -> Self {
        Self {
            backend: MokaBackend::builder()
                .max_entries(DEFAULT_MAX_ENTRIES)
                .build(),
            config: Config::default(),
            marker_header: DEFAULT_MARKER_HEADER,
            policy: StoreFailurePolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl<B> DedupBuilder<B>
where
    B: Backend,
{
    /// Replaces the fingerprint store.
    pub fn backend<NB: Backend>(self, backend: NB) -> DedupBuilder<NB> {
        DedupBuilder {
            backend,
            config: self.config,
            marker_header: self.marker_header,
            policy: self.policy,
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Sets rules, TTL and the marker toggle.
    pub fn config(self, config: Config) -> Self {
        DedupBuilder { config, ..self }
    }

    /// Sets the name of the marker header. Defaults to [`DEFAULT_MARKER_HEADER`].
    ///
    /// The header is only emitted when [`Config::marker_enabled`] is `true`.
    pub fn marker_header(self, name: HeaderName) -> Self {
        DedupBuilder {
            marker_header: name,
            ..self
        }
    }

    /// Sets what happens when the fingerprint store fails.
    pub fn store_failure_policy(self, policy: StoreFailurePolicy) -> Self {
        DedupBuilder { policy, ..self }
    }

    /// Sets how many body bytes are read to match body rules. Defaults to
    /// [`DEFAULT_MAX_BODY_BYTES`].
    ///
    /// A larger body is forwarded unchanged and the request is not
    /// deduplicated.
    pub fn max_body_bytes(self, limit: usize) -> Self {
        DedupBuilder {
            max_body_bytes: limit,
            ..self
        }
    }

    /// Builds the layer.
    pub fn build(self) -> Dedup<B> {
        let marker = self
            .config
            .marker_enabled()
            .then(|| Marker::new(self.marker_header));
        Dedup {
            deduplicator: Deduplicator::from_shared(Arc::new(self.config), Arc::new(self.backend)),
            marker,
            policy: self.policy,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
