//! Error types for rule construction and evaluation.

use std::fmt;

use thiserror::Error;

/// Type-erased error returned by user supplied predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised while building a rule.
///
/// These errors are configuration errors: a rule set containing a malformed
/// matcher must never be used, so callers are expected to abort startup.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Method matcher is not `*` and not a valid HTTP method token.
    #[error("invalid method matcher `{0}`")]
    InvalidMethod(String),

    /// Route pattern failed to compile.
    #[error("invalid route pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Matcher field has a shape that is not recognized.
    #[error("unsupported {dimension} matcher: {reason}")]
    UnsupportedMatcher {
        /// Rule dimension the matcher was declared for.
        dimension: Dimension,
        /// Human readable description of what was wrong.
        reason: String,
    },
}

/// Rule dimension a matcher belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Request method.
    Method,
    /// Raw request path including the query string.
    Route,
    /// Parsed request body.
    Body,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Method => f.write_str("method"),
            Dimension::Route => f.write_str("route"),
            Dimension::Body => f.write_str("body"),
        }
    }
}

/// Failure of a user supplied predicate during matching.
///
/// A failing predicate never counts as a match. The evaluator keeps going with
/// the next rule and reports the failure alongside the evaluation result.
#[derive(Debug, Error)]
#[error("{dimension} predicate failed: {source}")]
pub struct MatchError {
    /// Dimension of the predicate that failed.
    pub dimension: Dimension,
    /// Error returned by the predicate, or the panic message it raised.
    #[source]
    pub source: BoxError,
}

impl MatchError {
    pub(crate) fn new(dimension: Dimension, source: BoxError) -> Self {
        Self { dimension, source }
    }
}

/// Panic raised inside a predicate, captured as an error.
#[derive(Debug, Error)]
#[error("predicate panicked: {0}")]
pub(crate) struct PredicatePanic(pub(crate) String);
