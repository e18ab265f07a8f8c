//! Rule configuration.
//!
//! ```yaml
//! rules:
//!   - method: get
//!     route: /home
//!   - method: "*"
//!     route: { pattern: "^/a/p" }
//!     body: { id: true, name: "Alice" }
//!   - route: true
//!     body: true
//! ```

use dejavu::{BodyMatcher, BodyShape, MethodMatcher, RouteMatcher, Rule, RuleError};
use dejavu_core::Dimension;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single rule. Omitted fields do not constrain the request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Method matcher: a method name or `*`.
    #[serde(default, alias = "methods", skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodOperation>,
    /// Route matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteOperation>,
    /// Body matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyOperation>,
}

/// Method matcher declaration.
///
/// Lists deserialize so they can be reported precisely, but are rejected:
/// a rule matches a single method or all of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MethodOperation {
    /// `method: get` or `method: "*"`
    Single(String),
    /// `method: [get, post]`
    List(Vec<String>),
}

/// Route matcher declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RouteOperation {
    /// `route: true` matches any path. `false` is rejected.
    Any(bool),
    /// `route: /home?tab=1` matches that raw path exactly.
    Exact(String),
    /// `route: { pattern: "^/users/" }` matches a regular expression.
    Pattern {
        /// Regular expression tested against the raw path.
        pattern: String,
    },
}

/// Body matcher declaration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BodyOperation {
    /// `body: true` matches any body, including an absent one. `false` is rejected.
    Any(bool),
    /// Field shape: `true` means "present", anything else is a literal.
    Shape(IndexMap<String, Value>),
}

impl RuleConfig {
    /// Converts the declaration into a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] for method lists, invalid method tokens, regular
    /// expressions that do not compile and `false` matchers.
    pub fn into_rule(self) -> Result<Rule, RuleError> {
        let mut rule = Rule::new();
        if let Some(method) = self.method {
            rule = rule.method(method.into_matcher()?);
        }
        if let Some(route) = self.route {
            rule = rule.route(route.into_matcher()?);
        }
        if let Some(body) = self.body {
            rule = rule.body(body.into_matcher()?);
        }
        Ok(rule)
    }
}

impl MethodOperation {
    fn into_matcher(self) -> Result<MethodMatcher, RuleError> {
        match self {
            MethodOperation::Single(method) => method.parse(),
            MethodOperation::List(methods) => Err(RuleError::UnsupportedMatcher {
                dimension: Dimension::Method,
                reason: format!(
                    "method lists are not supported, got {methods:?}; declare one rule per method"
                ),
            }),
        }
    }
}

impl RouteOperation {
    fn into_matcher(self) -> Result<RouteMatcher, RuleError> {
        match self {
            RouteOperation::Any(true) => Ok(RouteMatcher::Any),
            RouteOperation::Any(false) => Err(rejected_false(Dimension::Route)),
            RouteOperation::Exact(path) => Ok(RouteMatcher::exact(path)),
            RouteOperation::Pattern { pattern } => RouteMatcher::pattern(&pattern),
        }
    }
}

impl BodyOperation {
    fn into_matcher(self) -> Result<BodyMatcher, RuleError> {
        match self {
            BodyOperation::Any(true) => Ok(BodyMatcher::Any),
            BodyOperation::Any(false) => Err(rejected_false(Dimension::Body)),
            BodyOperation::Shape(fields) => Ok(fields.into_iter().collect::<BodyShape>().into()),
        }
    }
}

fn rejected_false(dimension: Dimension) -> RuleError {
    RuleError::UnsupportedMatcher {
        dimension,
        reason: "`false` is not a matcher; omit the field instead".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dejavu::FieldCheck;
    use pretty_assertions::assert_eq;

    fn parse(yaml: &str) -> RuleConfig {
        serde_saphyr::from_str(yaml).expect("failed to deserialize")
    }

    #[test]
    fn test_full_rule_deserialize() {
        let rule = parse(
            r#"
method: get
route:
  pattern: "^/a/p"
body:
  id: true
  name: "Alice"
"#,
        );
        let mut shape = IndexMap::new();
        shape.insert("id".to_owned(), Value::Bool(true));
        shape.insert("name".to_owned(), Value::String("Alice".to_owned()));
        assert_eq!(
            rule,
            RuleConfig {
                method: Some(MethodOperation::Single("get".to_owned())),
                route: Some(RouteOperation::Pattern {
                    pattern: "^/a/p".to_owned()
                }),
                body: Some(BodyOperation::Shape(shape)),
            }
        );
    }

    #[test]
    fn test_methods_alias() {
        let rule = parse("methods: put\n");
        assert_eq!(rule.method, Some(MethodOperation::Single("put".to_owned())));
    }

    #[test]
    fn test_route_variants() {
        assert_eq!(parse("route: true\n").route, Some(RouteOperation::Any(true)));
        assert_eq!(
            parse("route: /home\n").route,
            Some(RouteOperation::Exact("/home".to_owned()))
        );
    }

    #[test]
    fn test_method_list_rejected() {
        let error = parse("method: [get, post]\n").into_rule().unwrap_err();
        assert!(matches!(
            error,
            RuleError::UnsupportedMatcher {
                dimension: Dimension::Method,
                ..
            }
        ));
    }

    #[test]
    fn test_false_rejected() {
        for yaml in ["route: false\n", "body: false\n"] {
            assert!(matches!(
                parse(yaml).into_rule(),
                Err(RuleError::UnsupportedMatcher { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let error = parse("route: { pattern: \"(\" }\n").into_rule().unwrap_err();
        assert!(matches!(error, RuleError::InvalidPattern(_)));
    }

    #[test]
    fn test_shape_keeps_declaration_order() {
        let rule = parse("body: { name: Alice, id: true }\n").into_rule().unwrap();
        let Some(BodyMatcher::Shape(shape)) = rule.body_matcher() else {
            panic!("expected a shape matcher");
        };
        let fields: Vec<_> = shape.fields().collect();
        assert_eq!(
            fields,
            vec![
                ("name", &FieldCheck::Equals(Value::String("Alice".to_owned()))),
                ("id", &FieldCheck::Present),
            ]
        );
    }
}
