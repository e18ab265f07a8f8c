//! Tower middleware integration for dejavu.
//!
//! This crate provides [`Dedup`], a Tower [`Layer`] that runs every inbound
//! request through a [`Deduplicator`] before handing it to the wrapped
//! service. Requests reported as duplicates get a marker header on their
//! response when the configuration enables it.
//!
//! # Core Concepts
//!
//! - **[`Dedup`]**: the Tower [`Layer`]. Use [`Dedup::builder()`] to configure it.
//! - **[`DedupService`]**: the [`Service`] doing the work. It reads the
//!   request body when a rule needs it, asks the deduplicator for a decision
//!   and forwards the request with a [`DedupBody`].
//! - **[`StoreFailurePolicy`]**: what to do when the fingerprint store fails.
//!
//! [`Layer`]: tower::Layer
//! [`Service`]: tower::Service
//! [`Deduplicator`]: dejavu::Deduplicator
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use dejavu::{Config, RouteMatcher, Rule};
//! use dejavu_tower::{Dedup, DedupBody};
//! use http_body_util::Full;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let config = Config::builder()
//!     .rule(Rule::new().route(RouteMatcher::exact("/home")))
//!     .ttl(Duration::from_secs(60))
//!     .marker(true)
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(Dedup::builder().config(config).build())
//!     .service(service_fn(|_req: http::Request<DedupBody<Full<bytes::Bytes>>>| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new("Hello"))
//!     }));
//! # drop(service);
//! ```
//!
//! # Response Headers
//!
//! | Header | When |
//! |--------|------|
//! | `x-dejavu: 1` | the request repeats a recent one and the marker is enabled |
//!
//! The header name is customizable with [`DedupBuilder::marker_header`].
//!
//! # Request Bodies
//!
//! The body is only read when a rule with a body matcher could match the
//! request's method and path, and at most [`DEFAULT_MAX_BODY_BYTES`] of it
//! (see [`DedupBuilder::max_body_bytes`]). A larger or failing body is
//! forwarded as received and the request is not deduplicated.
//!
//! A body that parses as JSON is matched as such; any other UTF-8 payload is
//! matched as a JSON string; an empty or binary body is treated as absent.

#![warn(missing_docs)]

use http::HeaderName;

pub mod body;
/// Response future adding the duplicate marker.
pub mod future;
/// Tower layer and builder.
pub mod layer;
/// Store failure handling.
pub mod policy;
/// The Tower service performing deduplication.
pub mod service;

pub use dejavu::{Config, ConfigBuilder, Decision, Deduplicator};
pub use body::DedupBody;
pub use layer::{Dedup, DedupBuilder};
pub use policy::StoreFailurePolicy;
pub use service::DedupService;

/// Default marker header name: `x-dejavu`.
pub const DEFAULT_MARKER_HEADER: HeaderName = HeaderName::from_static("x-dejavu");

/// Default limit on the request body bytes read for matching: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
