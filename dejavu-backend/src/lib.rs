#![warn(missing_docs)]
//! Fingerprint store contract for dejavu.
//!
//! The deduplication controller only ever talks to a [`Backend`]: a keyed store
//! with per-entry time-to-live. Implement the trait to plug in a new storage
//! engine; `dejavu-moka` provides the default in-process implementation.
//!
//! ## Contract
//!
//! - [`Backend::read`] returns the stored [`Sighting`] while it is not
//!   expired, `None` otherwise.
//! - [`Backend::write`] overwrites the entry and resets its expiry to
//!   `now + ttl`.
//! - Both fail with [`BackendError::Unavailable`] when the storage cannot be
//!   reached. A backend must never report an outage as a missing entry.
//! - Each call is atomic on its own. No read-then-write atomicity is expected.

mod backend;
mod error;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
mod sighting;

pub use backend::{Backend, BackendResult};
pub use error::BackendError;
pub use sighting::Sighting;
