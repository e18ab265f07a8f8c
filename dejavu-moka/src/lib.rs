#![warn(missing_docs)]
//! In-process fingerprint store for dejavu, backed by [Moka](https://docs.rs/moka).
//!
//! This is the default [`Backend`](dejavu_backend::Backend): it needs no
//! external service, keeps entries in memory and expires each one after the
//! time-to-live it was written with.
//!
//! ```
//! use dejavu_moka::MokaBackend;
//!
//! let backend = MokaBackend::builder().max_entries(10_000).build();
//! ```

mod backend;
mod builder;

pub use backend::MokaBackend;
pub use builder::{EntryCapacity, MokaBackendBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
