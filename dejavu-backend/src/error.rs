//! Error types for backend operations.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store could not be reached or did not answer in time.
    ///
    /// Callers must not treat this as "fingerprint not seen".
    #[error("fingerprint store unavailable: {0}")]
    Unavailable(#[source] BoxError),

    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to reaching the store.
    #[error(transparent)]
    InternalError(BoxError),
}

impl BackendError {
    /// Wraps `error` as [`BackendError::Unavailable`].
    pub fn unavailable(error: impl Into<BoxError>) -> Self {
        BackendError::Unavailable(error.into())
    }

    /// Wraps `error` as [`BackendError::InternalError`].
    pub fn internal(error: impl Into<BoxError>) -> Self {
        BackendError::InternalError(error.into())
    }

    /// Returns `true` for [`BackendError::Unavailable`].
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }
}
