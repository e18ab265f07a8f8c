//! Request fingerprints.
//!
//! A [`Fingerprint`] identifies "the same request" for deduplication. It is
//! derived from the index of the matched rule and the request parts that rule
//! cares about:
//!
//! 1. **Method** - always, upper-cased
//! 2. **Route** - always, the raw path including the query string
//! 3. **Body** - depends on the rule's body matcher:
//!    - shape matcher: one `body.<field>` part per declared field, holding the
//!      canonical JSON of that field (undeclared fields are not folded in)
//!    - any other matcher: one `body` part holding the canonical JSON of the
//!      whole body, omitted when the request has no body
//!
//! ## Format
//!
//! `r{rule}:key1=value1&key2=value2`
//!
//! ```
//! use dejavu_core::{Fingerprint, FingerprintPart};
//!
//! let fingerprint = Fingerprint::new(
//!     2,
//!     vec![
//!         FingerprintPart::new("method", "POST"),
//!         FingerprintPart::new("route", "/update"),
//!         FingerprintPart::new("body.id", "9"),
//!     ],
//! );
//! assert_eq!(fingerprint.to_string(), "r2:method=POST&route=/update&body.id=9");
//! ```
//!
//! [`Fingerprint`] wraps its data in an `Arc`, so cloning only bumps a reference
//! count.

use std::fmt::{self, Write};
use std::sync::Arc;

use serde_json::Value;
use smol_str::SmolStr;

use crate::matcher::{BodyMatcher, FieldCheck};
use crate::request::RequestDescriptor;
use crate::rule::Rule;

#[derive(Debug, Eq, PartialEq, Hash)]
struct FingerprintInner {
    rule: usize,
    parts: Vec<FingerprintPart>,
}

/// Store key identifying a matched request.
#[derive(Clone, Debug)]
pub struct Fingerprint {
    inner: Arc<FingerprintInner>,
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for Fingerprint {}

impl std::hash::Hash for Fingerprint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl Fingerprint {
    /// Creates a fingerprint from a rule index and ordered parts.
    pub fn new(rule: usize, parts: Vec<FingerprintPart>) -> Self {
        Self {
            inner: Arc::new(FingerprintInner { rule, parts }),
        }
    }

    /// Computes the fingerprint of `request` matched by `rule` at position `index`.
    pub fn compute(index: usize, rule: &Rule, request: &RequestDescriptor) -> Self {
        let mut parts = vec![
            FingerprintPart::new("method", request.method().as_str().to_ascii_uppercase()),
            FingerprintPart::new("route", request.raw_path()),
        ];

        match (rule.body_matcher(), request.body()) {
            (Some(BodyMatcher::Shape(shape)), body) => {
                let object = body.and_then(Value::as_object);
                parts.extend(shape.fields().map(|(name, check)| {
                    let value = match (object.and_then(|o| o.get(name)), check) {
                        (Some(value), _) => canonical_json(value),
                        (None, FieldCheck::Equals(expected)) => canonical_json(expected),
                        (None, FieldCheck::Present) => String::new(),
                    };
                    FingerprintPart::new(format!("body.{name}"), value)
                }));
            }
            (_, Some(body)) => parts.push(FingerprintPart::new("body", canonical_json(body))),
            (_, None) => {}
        }

        Self::new(index, parts)
    }

    /// Index of the rule that produced this fingerprint.
    pub fn rule(&self) -> usize {
        self.inner.rule
    }

    /// Iterates over the fingerprint parts in order.
    pub fn parts(&self) -> impl Iterator<Item = &FingerprintPart> {
        self.inner.parts.iter()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}:", self.inner.rule)?;
        for (i, part) in self.inner.parts.iter().enumerate() {
            if i > 0 {
                f.write_char('&')?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// A single `key=value` component of a [`Fingerprint`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FingerprintPart {
    key: SmolStr,
    value: SmolStr,
}

impl FingerprintPart {
    /// Creates a new part.
    pub fn new(key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Part key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Part value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for FingerprintPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Serializes `value` as compact JSON with object keys sorted recursively.
///
/// Two bodies that differ only in key order produce the same output.
///
/// ```
/// use dejavu_core::canonical_json;
/// use serde_json::json;
///
/// assert_eq!(
///     canonical_json(&json!({"b": [1, {"d": 0, "c": null}], "a": "x"})),
///     r#"{"a":"x","b":[1,{"c":null,"d":0}]}"#
/// );
/// ```
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{BodyShape, MethodMatcher, RouteMatcher};
    use http::Method;
    use serde_json::json;

    fn post(body: Option<Value>) -> RequestDescriptor {
        RequestDescriptor::new(Method::POST, "/update", body)
    }

    #[test]
    fn test_method_and_route_only() {
        let rule = Rule::new()
            .method(MethodMatcher::Any)
            .route(RouteMatcher::Any);
        let request =
            RequestDescriptor::new(Method::from_bytes(b"get").unwrap(), "/home?x=1", None);
        let fingerprint = Fingerprint::compute(0, &rule, &request);
        assert_eq!(fingerprint.to_string(), "r0:method=GET&route=/home?x=1");
    }

    #[test]
    fn test_whole_body_is_folded_for_any_matcher() {
        let rule = Rule::new().body(BodyMatcher::Any);
        let first = Fingerprint::compute(0, &rule, &post(Some(json!({"id": 11}))));
        let second =
            Fingerprint::compute(0, &rule, &post(Some(json!({"id": 11, "name": "Alice"}))));
        assert_ne!(first, second);
        assert_eq!(
            first,
            Fingerprint::compute(0, &rule, &post(Some(json!({"id": 11}))))
        );
    }

    #[test]
    fn test_body_key_order_does_not_matter() {
        let rule = Rule::new();
        let a = Fingerprint::compute(0, &rule, &post(Some(json!({"a": 1, "b": 2}))));
        let b = Fingerprint::compute(0, &rule, &post(Some(json!({"b": 2, "a": 1}))));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shape_folds_only_declared_fields() {
        let rule = Rule::new().body(BodyShape::new().present("id").equals("name", "Alice"));
        let fingerprint = Fingerprint::compute(
            1,
            &rule,
            &post(Some(json!({"id": 9, "name": "Alice", "ignored": true}))),
        );
        assert_eq!(
            fingerprint.to_string(),
            r#"r1:method=POST&route=/update&body.id=9&body.name="Alice""#
        );
        let other = Fingerprint::compute(
            1,
            &rule,
            &post(Some(json!({"id": 9, "name": "Alice", "ignored": false}))),
        );
        assert_eq!(fingerprint, other);
    }

    #[test]
    fn test_shape_distinguishes_inspected_values() {
        let rule = Rule::new().body(BodyShape::new().present("id"));
        let nine = Fingerprint::compute(0, &rule, &post(Some(json!({"id": 9}))));
        let ten = Fingerprint::compute(0, &rule, &post(Some(json!({"id": 10}))));
        assert_ne!(nine, ten);
    }

    #[test]
    fn test_rule_index_is_part_of_identity() {
        let rule = Rule::new();
        let request = post(None);
        assert_ne!(
            Fingerprint::compute(0, &rule, &request),
            Fingerprint::compute(1, &rule, &request)
        );
    }
}
