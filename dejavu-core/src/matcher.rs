//! Per-dimension matchers.
//!
//! A [`Rule`](crate::Rule) is made of up to three matchers, one per request
//! dimension:
//!
//! | Matcher | Variants |
//! |---------|----------|
//! | [`MethodMatcher`] | `Any`, `Exact` |
//! | [`RouteMatcher`] | `Any`, `Exact`, `Pattern`, `Predicate` |
//! | [`BodyMatcher`] | `Any`, `Shape`, `Predicate` |
//!
//! Predicates are fallible. A predicate that returns an error or panics is
//! reported as a [`MatchError`] and never counts as a match.

use std::any::Any as StdAny;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use serde_json::Value;

use crate::error::{BoxError, Dimension, MatchError, PredicatePanic, RuleError};

type RouteFn = dyn Fn(&str) -> Result<bool, BoxError> + Send + Sync;
type BodyFn = dyn Fn(Option<&Value>) -> Result<bool, BoxError> + Send + Sync;

/// Matches the request method.
///
/// Parse from a string with [`FromStr`]: `*` yields [`MethodMatcher::Any`],
/// anything else must be a single HTTP method token and is compared
/// case-insensitively.
///
/// ```
/// use dejavu_core::MethodMatcher;
///
/// let matcher: MethodMatcher = "get".parse().unwrap();
/// assert!(matcher.is_match(&http::Method::GET));
/// assert!(!matcher.is_match(&http::Method::POST));
///
/// let any: MethodMatcher = "*".parse().unwrap();
/// assert!(any.is_match(&http::Method::DELETE));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    /// Any method.
    Any,
    /// A single method, compared ignoring ASCII case.
    Exact(Method),
}

impl MethodMatcher {
    /// Returns `true` when `method` satisfies this matcher.
    pub fn is_match(&self, method: &Method) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::Exact(expected) => {
                expected.as_str().eq_ignore_ascii_case(method.as_str())
            }
        }
    }
}

impl From<Method> for MethodMatcher {
    fn from(method: Method) -> Self {
        MethodMatcher::Exact(method)
    }
}

impl FromStr for MethodMatcher {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token == "*" {
            return Ok(MethodMatcher::Any);
        }
        if token.is_empty() {
            return Err(RuleError::InvalidMethod(s.to_owned()));
        }
        Method::from_bytes(token.to_ascii_uppercase().as_bytes())
            .map(MethodMatcher::Exact)
            .map_err(|_| RuleError::InvalidMethod(s.to_owned()))
    }
}

/// Matches the raw request path, query string included.
#[derive(Clone)]
pub enum RouteMatcher {
    /// Any path.
    Any,
    /// Byte-for-byte equality with the raw path.
    Exact(String),
    /// Regular expression tested against the raw path.
    Pattern(Regex),
    /// User supplied predicate over the raw path.
    Predicate(Arc<RouteFn>),
}

impl RouteMatcher {
    /// Matches exactly `path`.
    pub fn exact(path: impl Into<String>) -> Self {
        RouteMatcher::Exact(path.into())
    }

    /// Compiles `pattern` into a regular expression matcher.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, RuleError> {
        Ok(RouteMatcher::Pattern(Regex::new(pattern)?))
    }

    /// Wraps an infallible predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        RouteMatcher::Predicate(Arc::new(move |path| Ok(predicate(path))))
    }

    /// Wraps a fallible predicate. An `Err` is reported as a [`MatchError`].
    pub fn try_predicate<F, E>(predicate: F) -> Self
    where
        F: Fn(&str) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        RouteMatcher::Predicate(Arc::new(move |path| predicate(path).map_err(Into::into)))
    }

    /// Checks `raw_path` against this matcher.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when a predicate fails or panics.
    pub fn check(&self, raw_path: &str) -> Result<bool, MatchError> {
        match self {
            RouteMatcher::Any => Ok(true),
            RouteMatcher::Exact(path) => Ok(path == raw_path),
            RouteMatcher::Pattern(regex) => Ok(regex.is_match(raw_path)),
            RouteMatcher::Predicate(predicate) => {
                guarded(Dimension::Route, || predicate(raw_path))
            }
        }
    }

    /// Like [`check`](Self::check), but without running predicates: a
    /// predicate matcher may always match.
    pub fn may_match(&self, raw_path: &str) -> bool {
        match self {
            RouteMatcher::Any | RouteMatcher::Predicate(_) => true,
            RouteMatcher::Exact(path) => path == raw_path,
            RouteMatcher::Pattern(regex) => regex.is_match(raw_path),
        }
    }
}

impl From<Regex> for RouteMatcher {
    fn from(regex: Regex) -> Self {
        RouteMatcher::Pattern(regex)
    }
}

impl fmt::Debug for RouteMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMatcher::Any => f.write_str("Any"),
            RouteMatcher::Exact(path) => f.debug_tuple("Exact").field(path).finish(),
            RouteMatcher::Pattern(regex) => {
                f.debug_tuple("Pattern").field(&regex.as_str()).finish()
            }
            RouteMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Check applied to a single field of a [`BodyShape`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCheck {
    /// Field must exist, whatever its value (`0`, `""`, `false` and `null` included).
    Present,
    /// Field must be deep-equal to the value.
    Equals(Value),
}

/// Declared value: `true` means "present", anything else is a literal.
impl From<Value> for FieldCheck {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(true) => FieldCheck::Present,
            other => FieldCheck::Equals(other),
        }
    }
}

impl FieldCheck {
    fn is_match(&self, field: Option<&Value>) -> bool {
        match (self, field) {
            (FieldCheck::Present, Some(_)) => true,
            (FieldCheck::Equals(expected), Some(actual)) => actual == expected,
            (_, None) => false,
        }
    }
}

/// Declared body shape: an ordered list of field checks.
///
/// A body matches when it is a JSON object and every declared field passes
/// its check. Fields that are not declared are ignored.
///
/// ```
/// use dejavu_core::BodyShape;
/// use serde_json::json;
///
/// let shape = BodyShape::new().present("id").equals("name", "Alice");
/// assert!(shape.is_match(Some(&json!({"id": 0, "name": "Alice", "extra": true}))));
/// assert!(!shape.is_match(Some(&json!({"id": 0}))));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyShape {
    fields: Vec<(String, FieldCheck)>,
}

impl BodyShape {
    /// Creates an empty shape. An empty shape matches any body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to be present.
    pub fn present(self, field: impl Into<String>) -> Self {
        self.field(field, FieldCheck::Present)
    }

    /// Requires `field` to equal `value`.
    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(field, FieldCheck::Equals(value.into()))
    }

    /// Adds a check for `field`, replacing any earlier check on the same field.
    pub fn field(mut self, field: impl Into<String>, check: FieldCheck) -> Self {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(existing) => existing.1 = check,
            None => self.fields.push((field, check)),
        }
        self
    }

    /// Iterates declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldCheck)> {
        self.fields.iter().map(|(name, check)| (name.as_str(), check))
    }

    /// Returns `true` when `body` satisfies every declared field.
    pub fn is_match(&self, body: Option<&Value>) -> bool {
        if self.fields.is_empty() {
            return true;
        }
        let Some(Value::Object(map)) = body else {
            return false;
        };
        self.fields
            .iter()
            .all(|(name, check)| check.is_match(map.get(name)))
    }
}

impl<K, V> FromIterator<(K, V)> for BodyShape
where
    K: Into<String>,
    V: Into<FieldCheck>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |shape, (name, check)| shape.field(name, check.into()))
    }
}

/// Matches the parsed request body.
#[derive(Clone)]
pub enum BodyMatcher {
    /// Any body, including an absent one.
    Any,
    /// Field-by-field shape check.
    Shape(BodyShape),
    /// User supplied predicate over the (possibly absent) body.
    Predicate(Arc<BodyFn>),
}

impl BodyMatcher {
    /// Wraps an infallible predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        BodyMatcher::Predicate(Arc::new(move |body| Ok(predicate(body))))
    }

    /// Wraps a fallible predicate. An `Err` is reported as a [`MatchError`].
    pub fn try_predicate<F, E>(predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        BodyMatcher::Predicate(Arc::new(move |body| predicate(body).map_err(Into::into)))
    }

    /// Checks `body` against this matcher.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when a predicate fails or panics.
    pub fn check(&self, body: Option<&Value>) -> Result<bool, MatchError> {
        match self {
            BodyMatcher::Any => Ok(true),
            BodyMatcher::Shape(shape) => Ok(shape.is_match(body)),
            BodyMatcher::Predicate(predicate) => guarded(Dimension::Body, || predicate(body)),
        }
    }
}

impl From<BodyShape> for BodyMatcher {
    fn from(shape: BodyShape) -> Self {
        BodyMatcher::Shape(shape)
    }
}

impl fmt::Debug for BodyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyMatcher::Any => f.write_str("Any"),
            BodyMatcher::Shape(shape) => f.debug_tuple("Shape").field(shape).finish(),
            BodyMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Runs a predicate, turning both errors and panics into [`MatchError`].
fn guarded<F>(dimension: Dimension, predicate: F) -> Result<bool, MatchError>
where
    F: FnOnce() -> Result<bool, BoxError>,
{
    match catch_unwind(AssertUnwindSafe(predicate)) {
        Ok(result) => result.map_err(|source| MatchError::new(dimension, source)),
        Err(payload) => Err(MatchError::new(
            dimension,
            Box::new(PredicatePanic(panic_message(payload.as_ref()))),
        )),
    }
}

fn panic_message(payload: &(dyn StdAny + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        let matcher: MethodMatcher = "pOsT".parse().unwrap();
        assert_eq!(matcher, MethodMatcher::Exact(Method::POST));
        assert!(matcher.is_match(&Method::POST));
        assert!(!matcher.is_match(&Method::GET));
    }

    #[test]
    fn test_method_extension_compares_ignoring_case() {
        let matcher = MethodMatcher::Exact(Method::from_bytes(b"purge").unwrap());
        assert!(matcher.is_match(&Method::from_bytes(b"PURGE").unwrap()));
    }

    #[test]
    fn test_method_rejects_invalid_tokens() {
        assert!(matches!(
            "".parse::<MethodMatcher>(),
            Err(RuleError::InvalidMethod(_))
        ));
        assert!(matches!(
            "get, post".parse::<MethodMatcher>(),
            Err(RuleError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_route_exact_includes_query() {
        let matcher = RouteMatcher::exact("/search?q=1");
        assert!(matcher.check("/search?q=1").unwrap());
        assert!(!matcher.check("/search").unwrap());
        assert!(!matcher.check("/search?q=2").unwrap());
    }

    #[test]
    fn test_route_pattern_sees_query() {
        let matcher = RouteMatcher::pattern(r"[?&]debug=1").unwrap();
        assert!(matcher.check("/a?debug=1").unwrap());
        assert!(!matcher.check("/a").unwrap());
    }

    #[test]
    fn test_route_pattern_rejects_invalid_regex() {
        assert!(matches!(
            RouteMatcher::pattern("(unclosed"),
            Err(RuleError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_route_predicate() {
        let matcher =
            RouteMatcher::predicate(|path| path.contains("user/10") && !path.contains("user/20"));
        assert!(matcher.check("/path/to/user/10").unwrap());
        assert!(!matcher.check("/path/to/user/20").unwrap());
    }

    #[test]
    fn test_route_predicate_error_is_reported() {
        let matcher = RouteMatcher::try_predicate(|_| Err::<bool, _>("backend lookup failed"));
        let error = matcher.check("/a").unwrap_err();
        assert_eq!(error.dimension, Dimension::Route);
        assert_eq!(error.source.to_string(), "backend lookup failed");
    }

    #[test]
    fn test_body_predicate_panic_is_reported() {
        let matcher = BodyMatcher::predicate(|_| panic!("boom"));
        let error = matcher.check(None).unwrap_err();
        assert_eq!(error.dimension, Dimension::Body);
        assert_eq!(error.source.to_string(), "predicate panicked: boom");
    }

    #[test]
    fn test_field_present_accepts_falsy_values() {
        let shape = BodyShape::new().present("flag");
        for value in [json!(0), json!(""), json!(false), json!(null)] {
            assert!(shape.is_match(Some(&json!({ "flag": value }))));
        }
        assert!(!shape.is_match(Some(&json!({ "other": 1 }))));
    }

    #[test]
    fn test_field_equals_is_deep() {
        let shape = BodyShape::new().equals("user", json!({"tags": ["a", "b"]}));
        assert!(shape.is_match(Some(&json!({"user": {"tags": ["a", "b"]}}))));
        assert!(!shape.is_match(Some(&json!({"user": {"tags": ["b", "a"]}}))));
    }

    #[test]
    fn test_shape_requires_object_body() {
        let shape = BodyShape::new().present("id");
        assert!(!shape.is_match(None));
        assert!(!shape.is_match(Some(&json!([1, 2]))));
        assert!(!shape.is_match(Some(&json!("id"))));
    }

    #[test]
    fn test_empty_shape_matches_anything() {
        assert!(BodyShape::new().is_match(None));
    }

    #[test]
    fn test_shape_from_declared_values() {
        let shape: BodyShape = [
            ("id", json!(true)),
            ("name", json!("Mimì")),
            ("n", json!(1)),
            ("id", json!(true)),
        ]
        .into_iter()
        .collect();
        let fields: Vec<_> = shape.fields().collect();
        assert_eq!(
            fields,
            vec![
                ("id", &FieldCheck::Present),
                ("name", &FieldCheck::Equals(json!("Mimì"))),
                ("n", &FieldCheck::Equals(json!(1))),
            ]
        );
        assert_eq!(FieldCheck::from(json!(false)), FieldCheck::Equals(json!(false)));
    }

    #[test]
    fn test_shape_field_replaces_existing_check() {
        let shape = BodyShape::new().present("id").equals("id", 3);
        assert_eq!(shape.fields().count(), 1);
        assert!(!shape.is_match(Some(&json!({"id": 4}))));
    }
}
