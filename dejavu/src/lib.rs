#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # dejavu
//!
//! Detects repeated HTTP requests and tags them as "seen before" within a
//! time window.
//!
//! For every inbound request the [`Deduplicator`]:
//!
//! 1. finds the first configured [`Rule`] matching the request;
//! 2. derives a [`Fingerprint`] from the rule and the request;
//! 3. reads the fingerprint from the store: present means duplicate;
//! 4. writes the fingerprint back with the configured TTL, always.
//!
//! Requests that match no rule never touch the store.
//!
//! The deduplicator reports a [`Decision`]; adding an observable marker to the
//! response is the host integration's job (see `dejavu-tower`).
//!
//! ```
//! use std::time::Duration;
//! use dejavu::{Config, Deduplicator, MethodMatcher, RequestDescriptor, RouteMatcher, Rule};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder()
//!     .rule(
//!         Rule::new()
//!             .method("get".parse::<MethodMatcher>()?)
//!             .route(RouteMatcher::exact("/home")),
//!     )
//!     .ttl(Duration::from_secs(60))
//!     .build();
//! let dedup = Deduplicator::new(config);
//!
//! let home = RequestDescriptor::new(http::Method::GET, "/home", None);
//! assert!(!dedup.process(&home).await?.duplicate);
//! assert!(dedup.process(&home).await?.duplicate);
//!
//! let other = RequestDescriptor::new(http::Method::GET, "/other-path", None);
//! assert!(!dedup.process(&other).await?.matched);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The store read and write are two separate calls. Two concurrent requests
//! with the same fingerprint may both observe "absent" and both be reported as
//! first sightings: deduplication is best-effort, not exactly-once.
//!
//! ## Feature Flags
//!
//! - `metrics` - record decision counters through the `metrics` crate

/// Deduplication configuration.
pub mod config;

/// The deduplication controller.
pub mod controller;

/// Error types returned by [`Deduplicator::process`].
pub mod error;

/// Metrics collection for deduplication decisions.
///
/// With the `metrics` feature enabled this module records counters for
/// matched requests, duplicates, predicate failures and backend errors.
pub mod metrics;

pub use config::{Config, ConfigBuilder, DEFAULT_MAX_ENTRIES, DEFAULT_TTL, MAX_TTL};
pub use controller::{Decision, Deduplicator};
pub use error::DedupError;

pub use dejavu_backend::{Backend, BackendError, BackendResult, Sighting};
pub use dejavu_core::{
    BodyMatcher, BodyShape, FieldCheck, Fingerprint, MatchError, MethodMatcher,
    RequestDescriptor, RouteMatcher, Rule, RuleError, RuleSet,
};
pub use dejavu_moka::MokaBackend;
