use std::task::{Context, Poll};

use bytes::Bytes;
use dejavu::{Backend, Deduplicator, RequestDescriptor};
use http::{Request, Response};
use http_body::Body as HttpBody;
use serde_json::Value;
use tower::{BoxError, Service};
use tracing::{debug, warn};

use crate::body::{Collected, DedupBody, collect_limited};
use crate::future::ResponseFuture;
use crate::layer::Marker;
use crate::policy::StoreFailurePolicy;

/// Tower [`Service`] that deduplicates requests before forwarding them.
///
/// The wrapped service receives the request body as a [`DedupBody`]. The body
/// is only read when a rule with a body matcher could match the request, and
/// never further than the configured limit.
pub struct DedupService<S, B> {
    inner: S,
    deduplicator: Deduplicator<B>,
    marker: Option<Marker>,
    policy: StoreFailurePolicy,
    max_body_bytes: usize,
}

impl<S, B> DedupService<S, B> {
    pub(crate) fn new(
        inner: S,
        deduplicator: Deduplicator<B>,
        marker: Option<Marker>,
        policy: StoreFailurePolicy,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            inner,
            deduplicator,
            marker,
            policy,
            max_body_bytes,
        }
    }
}

impl<S, B> Clone for DedupService<S, B>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            deduplicator: self.deduplicator.clone(),
            marker: self.marker.clone(),
            policy: self.policy,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl<S, B, ReqBody, ResBody> Service<Request<ReqBody>> for DedupService<S, B>
where
    S: Service<Request<DedupBody<ReqBody>>, Response = Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: Backend + 'static,
    ReqBody: HttpBody + Unpin + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Send,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = BoxError;
    type Future = ResponseFuture<ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Keep the service that was driven to readiness for this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let deduplicator = self.deduplicator.clone();
        let policy = self.policy;
        let max_body_bytes = self.max_body_bytes;

        let forwarded = async move {
            let (parts, body) = req.into_parts();
            let descriptor = RequestDescriptor::from_parts(&parts, None);

            let (body, descriptor) = if deduplicator
                .config()
                .rules()
                .may_inspect_body(descriptor.method(), descriptor.raw_path())
            {
                match collect_limited(body, max_body_bytes).await {
                    Collected::Complete(bytes) => {
                        let parsed = parse_body(&bytes);
                        (DedupBody::buffered(bytes), Some(descriptor.with_body(parsed)))
                    }
                    Collected::Exceeded(body) => {
                        debug!(
                            method = %descriptor.method(),
                            path = descriptor.raw_path(),
                            limit = max_body_bytes,
                            "request body over the size limit, deduplication skipped"
                        );
                        (body, None)
                    }
                    Collected::Failed(body) => {
                        debug!(
                            method = %descriptor.method(),
                            path = descriptor.raw_path(),
                            "request body failed, deduplication skipped"
                        );
                        (body, None)
                    }
                }
            } else {
                (DedupBody::passthrough(body), Some(descriptor))
            };

            let duplicate = match descriptor {
                Some(descriptor) => match deduplicator.process(&descriptor).await {
                    Ok(decision) => decision.duplicate,
                    Err(err) => match policy {
                        StoreFailurePolicy::Fail => return Err(BoxError::from(err)),
                        StoreFailurePolicy::Proceed => {
                            warn!(
                                method = %descriptor.method(),
                                path = descriptor.raw_path(),
                                error = %err,
                                "deduplication skipped, forwarding request"
                            );
                            false
                        }
                    },
                },
                None => false,
            };

            let request = Request::from_parts(parts, body);
            let response = inner.call(request).await.map_err(Into::<BoxError>::into)?;
            Ok::<_, BoxError>((response, duplicate))
        };

        ResponseFuture::new(Box::pin(forwarded), self.marker.clone())
    }
}

/// Parses a buffered request body into the value rules match on.
fn parse_body(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_slice(bytes) {
        return Some(value);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(Value::String(text.to_owned())),
        Err(_) => {
            debug!(len = bytes.len(), "binary request body ignored for matching");
            None
        }
    }
}
