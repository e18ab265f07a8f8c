/// What [`DedupService`](crate::DedupService) does when the fingerprint store
/// cannot be read or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Return the store error from the service. The wrapped service is not called.
    #[default]
    Fail,
    /// Log a warning and forward the request without a duplicate marker.
    Proceed,
}
