#![warn(missing_docs)]
//! # dejavu-core
//!
//! Rule matching and fingerprinting for the dejavu request deduplication layer.
//!
//! This crate is **protocol-light** and **storage-agnostic**. It knows how to:
//!
//! - **Describe** an inbound request ([`RequestDescriptor`])
//! - **Match** a request against a [`Rule`] built from method, route and body
//!   matchers ([`MethodMatcher`], [`RouteMatcher`], [`BodyMatcher`])
//! - **Select** the first matching rule of an ordered [`RuleSet`]
//! - **Derive** a deterministic [`Fingerprint`] for a matched request
//!
//! Storage of fingerprints lives in `dejavu-backend`, the orchestration that ties
//! both together lives in the `dejavu` crate.
//!
//! ## Example
//!
//! ```
//! use dejavu_core::{MethodMatcher, RequestDescriptor, RouteMatcher, Rule, RuleSet};
//!
//! let rules = RuleSet::new(vec![
//!     Rule::new()
//!         .method("get".parse::<MethodMatcher>().unwrap())
//!         .route(RouteMatcher::exact("/home")),
//! ]);
//!
//! let request = RequestDescriptor::new(http::Method::GET, "/home", None);
//! let evaluation = rules.evaluate(&request);
//! let matched = evaluation.matched().unwrap();
//! assert_eq!(matched.index(), 0);
//! assert_eq!(
//!     matched.fingerprint(&request).to_string(),
//!     "r0:method=GET&route=/home"
//! );
//! ```

pub mod error;
pub mod fingerprint;
pub mod matcher;
pub mod request;
pub mod rule;

pub use error::{BoxError, Dimension, MatchError, RuleError};
pub use fingerprint::{Fingerprint, FingerprintPart, canonical_json};
pub use matcher::{BodyMatcher, BodyShape, FieldCheck, MethodMatcher, RouteMatcher};
pub use request::RequestDescriptor;
pub use rule::{Evaluation, Matched, Rule, RuleFailure, RuleSet};
