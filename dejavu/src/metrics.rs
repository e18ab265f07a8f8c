//! Metrics declaration and recording.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of requests that matched a rule.
    pub static ref MATCHED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "dejavu_matched_total",
            "Total number of requests matching a deduplication rule."
        );
        "dejavu_matched_total"
    };
    /// Track number of requests reported as duplicates.
    pub static ref DUPLICATE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "dejavu_duplicate_total",
            "Total number of requests reported as duplicates."
        );
        "dejavu_duplicate_total"
    };
    /// Track number of failed rule predicates.
    pub static ref PREDICATE_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "dejavu_predicate_failure_total",
            "Total number of rule predicates that failed or panicked."
        );
        "dejavu_predicate_failure_total"
    };
    /// Track number of fingerprint store errors.
    pub static ref BACKEND_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "dejavu_backend_error_total",
            "Total number of fingerprint store errors."
        );
        "dejavu_backend_error_total"
    };
}

/// Record the decision for a matched request.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_decision(rule: usize, duplicate: bool) {
    let rule = rule.to_string();
    metrics::counter!(*MATCHED_COUNTER, "rule" => rule.clone()).increment(1);
    if duplicate {
        metrics::counter!(*DUPLICATE_COUNTER, "rule" => rule).increment(1);
    }
}

/// Record the decision for a matched request (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_decision(_rule: usize, _duplicate: bool) {}

/// Record a failed rule predicate.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_predicate_failure(rule: usize) {
    metrics::counter!(*PREDICATE_FAILURE_COUNTER, "rule" => rule.to_string()).increment(1);
}

/// Record a failed rule predicate (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_predicate_failure(_rule: usize) {}

/// Record a fingerprint store error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_backend_error(backend: &str, operation: &'static str) {
    metrics::counter!(
        *BACKEND_ERROR_COUNTER,
        "backend" => backend.to_string(),
        "operation" => operation
    )
    .increment(1);
}

/// Record a fingerprint store error (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_backend_error(_backend: &str, _operation: &'static str) {}
