use dejavu_backend::BackendError;
use thiserror::Error;

/// Error returned when a deduplication decision could not be made.
///
/// Matching problems never surface here: a failing predicate only makes its
/// rule non-matching. Store problems always do, because reporting a request as
/// "not a duplicate" during an outage would change what the decision means.
/// The host picks the policy: fail the request or proceed without
/// deduplication.
#[derive(Debug, Error)]
pub enum DedupError {
    /// The fingerprint store failed to read or write.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DedupError {
    /// Returns `true` when the store could not be reached.
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            DedupError::Backend(error) => error.is_unavailable(),
        }
    }
}
