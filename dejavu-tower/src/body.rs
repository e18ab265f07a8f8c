//! Request body forwarding.
//!
//! Rules with a body matcher need the request body before a decision can be
//! made, but only up to a configured size. [`DedupBody`] is what the wrapped
//! service receives in every case:
//!
//! - **Buffered**: the body was read to its end within the limit and is
//!   replayed from memory.
//! - **Partial**: reading stopped early, either because the limit was
//!   exceeded or because the body failed. The buffered prefix is replayed
//!   first, then the unread remainder is streamed (or the error is yielded at
//!   the same position).
//! - **Passthrough**: no rule needed the body, so it was never touched.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::BodyExt;
use pin_project::pin_project;

/// Request body handed to the wrapped service.
#[pin_project]
pub struct DedupBody<B>
where
    B: HttpBody,
{
    #[pin]
    kind: Kind<B>,
}

#[pin_project(project = KindProj)]
enum Kind<B>
where
    B: HttpBody,
{
    Buffered(Option<Bytes>),
    Partial {
        prefix: Option<Bytes>,
        #[pin]
        remaining: Remaining<B>,
    },
    Passthrough(#[pin] B),
}

#[pin_project(project = RemainingProj)]
enum Remaining<B>
where
    B: HttpBody,
{
    Body(#[pin] B),
    // Yielded once, then the stream ends.
    Error(Option<B::Error>),
}

impl<B> DedupBody<B>
where
    B: HttpBody,
{
    /// Body fully held in memory.
    pub(crate) fn buffered(bytes: Bytes) -> Self {
        let bytes = (!bytes.is_empty()).then_some(bytes);
        Self {
            kind: Kind::Buffered(bytes),
        }
    }

    /// Buffered prefix followed by the rest of `body`.
    pub(crate) fn partial(prefix: Bytes, body: B) -> Self {
        Self::with_remaining(prefix, Remaining::Body(body))
    }

    /// Buffered prefix followed by `error`.
    pub(crate) fn failed(prefix: Bytes, error: B::Error) -> Self {
        Self::with_remaining(prefix, Remaining::Error(Some(error)))
    }

    /// Body forwarded untouched.
    pub(crate) fn passthrough(body: B) -> Self {
        Self {
            kind: Kind::Passthrough(body),
        }
    }

    fn with_remaining(prefix: Bytes, remaining: Remaining<B>) -> Self {
        Self {
            kind: Kind::Partial {
                prefix: (!prefix.is_empty()).then_some(prefix),
                remaining,
            },
        }
    }
}

impl<B> HttpBody for DedupBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project().kind.project() {
            KindProj::Buffered(bytes) => {
                Poll::Ready(bytes.take().map(|bytes| Ok(Frame::data(bytes))))
            }
            KindProj::Partial { prefix, remaining } => {
                if let Some(prefix) = prefix.take() {
                    return Poll::Ready(Some(Ok(Frame::data(prefix))));
                }
                match remaining.project() {
                    RemainingProj::Body(body) => poll_bytes(body, cx),
                    RemainingProj::Error(error) => Poll::Ready(error.take().map(Err)),
                }
            }
            KindProj::Passthrough(body) => poll_bytes(body, cx),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Buffered(bytes) => {
                SizeHint::with_exact(bytes.as_ref().map_or(0, |bytes| bytes.len() as u64))
            }
            Kind::Partial { prefix, remaining } => {
                let prefix_len = prefix.as_ref().map_or(0, |prefix| prefix.len() as u64);
                match remaining {
                    Remaining::Body(body) => {
                        let hint = body.size_hint();
                        let lower = hint.lower().saturating_add(prefix_len);
                        let mut result = SizeHint::new();
                        result.set_lower(lower);
                        // The inner hint may still count the bytes already read.
                        if let Some(upper) = hint.upper() {
                            result.set_upper(upper.saturating_add(prefix_len).max(lower));
                        }
                        result
                    }
                    Remaining::Error(_) => SizeHint::with_exact(prefix_len),
                }
            }
            Kind::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Buffered(bytes) => bytes.is_none(),
            Kind::Partial { prefix, remaining } => {
                prefix.is_none()
                    && match remaining {
                        Remaining::Body(body) => body.is_end_stream(),
                        Remaining::Error(error) => error.is_none(),
                    }
            }
            Kind::Passthrough(body) => body.is_end_stream(),
        }
    }
}

fn poll_bytes<B: HttpBody>(
    body: Pin<&mut B>,
    cx: &mut Context<'_>,
) -> Poll<Option<Result<Frame<Bytes>, B::Error>>> {
    body.poll_frame(cx).map(|frame| {
        frame.map(|result| {
            result.map(|frame| frame.map_data(|mut data| data.copy_to_bytes(data.remaining())))
        })
    })
}

impl<B> fmt::Debug for DedupBody<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Buffered(bytes) => f
                .debug_tuple("Buffered")
                .field(&bytes.as_ref().map_or(0, Bytes::len))
                .finish(),
            Kind::Partial { prefix, .. } => f
                .debug_struct("Partial")
                .field("prefix_len", &prefix.as_ref().map_or(0, Bytes::len))
                .finish_non_exhaustive(),
            Kind::Passthrough(_) => f.write_str("Passthrough(..)"),
        }
    }
}

/// Outcome of reading a request body up to a size limit.
pub(crate) enum Collected<B>
where
    B: HttpBody,
{
    /// The body ended within the limit.
    Complete(Bytes),
    /// The body is larger than the limit. Reading stopped at the first frame
    /// past it.
    Exceeded(DedupBody<B>),
    /// The body failed before it ended.
    Failed(DedupBody<B>),
}

/// Reads `body` until it ends or more than `limit` bytes have been buffered.
pub(crate) async fn collect_limited<B>(mut body: B, limit: usize) -> Collected<B>
where
    B: HttpBody + Unpin,
{
    if body.size_hint().lower() > limit as u64 {
        return Collected::Exceeded(DedupBody::passthrough(body));
    }

    let mut buffer = BytesMut::new();
    loop {
        match body.frame().await {
            Some(Ok(frame)) => {
                if let Ok(mut data) = frame.into_data() {
                    buffer.extend_from_slice(&data.copy_to_bytes(data.remaining()));
                }
                if buffer.len() > limit {
                    return Collected::Exceeded(DedupBody::partial(buffer.freeze(), body));
                }
            }
            Some(Err(error)) => {
                return Collected::Failed(DedupBody::failed(buffer.freeze(), error));
            }
            None => return Collected::Complete(buffer.freeze()),
        }
    }
}
