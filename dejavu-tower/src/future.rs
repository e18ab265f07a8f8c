use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Future;
use futures::future::BoxFuture;
use futures::ready;
use http::Response;
use pin_project::pin_project;
use tower::BoxError;

use crate::layer::Marker;

/// Response of the wrapped service together with the duplicate flag.
pub(crate) type Forwarded<ResBody> = (Response<ResBody>, bool);

/// Future returned by [`DedupService`](crate::DedupService).
///
/// Wraps the deduplicate-then-forward future and inserts the marker header
/// into responses to duplicate requests.
#[pin_project]
pub struct ResponseFuture<ResBody> {
    #[pin]
    inner: BoxFuture<'static, Result<Forwarded<ResBody>, BoxError>>,
    marker: Option<Marker>,
}

impl<ResBody> ResponseFuture<ResBody> {
    pub(crate) fn new(
        inner: BoxFuture<'static, Result<Forwarded<ResBody>, BoxError>>,
        marker: Option<Marker>,
    ) -> Self {
        Self { inner, marker }
    }
}

impl<ResBody> Future for ResponseFuture<ResBody> {
    type Output = Result<Response<ResBody>, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));

        let response = result.map(|(mut response, duplicate)| {
            if duplicate && let Some(marker) = this.marker.take() {
                response.headers_mut().insert(marker.name, marker.value);
            }
            response
        });

        Poll::Ready(response)
    }
}
