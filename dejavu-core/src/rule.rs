//! Rules and first-match-wins rule set evaluation.

use crate::error::MatchError;
use crate::fingerprint::Fingerprint;
use crate::matcher::{BodyMatcher, MethodMatcher, RouteMatcher};
use http::Method;

use crate::request::RequestDescriptor;

/// A deduplication rule.
///
/// Each matcher is optional. An unset matcher does not constrain its
/// dimension, so `Rule::new()` matches every request.
///
/// ```
/// use dejavu_core::{BodyShape, MethodMatcher, RequestDescriptor, RouteMatcher, Rule};
/// use serde_json::json;
///
/// let rule = Rule::new()
///     .method(MethodMatcher::Any)
///     .route(RouteMatcher::exact("/update/user"))
///     .body(BodyShape::new().present("id"));
///
/// let request = RequestDescriptor::new(
///     http::Method::POST,
///     "/update/user",
///     Some(json!({"id": 9})),
/// );
/// assert!(rule.matches(&request).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rule {
    method: Option<MethodMatcher>,
    route: Option<RouteMatcher>,
    body: Option<BodyMatcher>,
}

impl Rule {
    /// Creates a rule with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains the request method.
    pub fn method(mut self, matcher: impl Into<MethodMatcher>) -> Self {
        self.method = Some(matcher.into());
        self
    }

    /// Constrains the raw request path.
    pub fn route(mut self, matcher: impl Into<RouteMatcher>) -> Self {
        self.route = Some(matcher.into());
        self
    }

    /// Constrains the parsed request body.
    pub fn body(mut self, matcher: impl Into<BodyMatcher>) -> Self {
        self.body = Some(matcher.into());
        self
    }

    /// Configured method matcher.
    pub fn method_matcher(&self) -> Option<&MethodMatcher> {
        self.method.as_ref()
    }

    /// Configured route matcher.
    pub fn route_matcher(&self) -> Option<&RouteMatcher> {
        self.route.as_ref()
    }

    /// Configured body matcher.
    pub fn body_matcher(&self) -> Option<&BodyMatcher> {
        self.body.as_ref()
    }

    /// Returns whether this rule has a body matcher and could match a request
    /// with `method` and `raw_path`. Route predicates are not run.
    pub fn may_inspect_body(&self, method: &Method, raw_path: &str) -> bool {
        self.body.is_some()
            && self
                .method
                .as_ref()
                .is_none_or(|matcher| matcher.is_match(method))
            && self
                .route
                .as_ref()
                .is_none_or(|matcher| matcher.may_match(raw_path))
    }

    /// Returns whether `request` satisfies method, route and body matchers.
    ///
    /// Checks run in that order and stop at the first dimension that does not
    /// match, so predicates are not invoked for requests already rejected by a
    /// cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] if a route or body predicate fails.
    pub fn matches(&self, request: &RequestDescriptor) -> Result<bool, MatchError> {
        if let Some(method) = &self.method
            && !method.is_match(request.method())
        {
            return Ok(false);
        }
        if let Some(route) = &self.route
            && !route.check(request.raw_path())?
        {
            return Ok(false);
        }
        match &self.body {
            Some(body) => body.check(request.body()),
            None => Ok(true),
        }
    }
}

/// Ordered list of rules. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set preserving the order of `rules`.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Appends a rule after the existing ones.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Returns `true` if any rule could look at the body of a request with
    /// `method` and `raw_path`. When it returns `false` the body can be left
    /// unread without changing the outcome of [`evaluate`](Self::evaluate).
    pub fn may_inspect_body(&self, method: &Method, raw_path: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.may_inspect_body(method, raw_path))
    }

    /// Finds the first rule matching `request`.
    ///
    /// Rules after the first match are not evaluated. Predicate failures on
    /// earlier rules are treated as non-matches and collected in the returned
    /// [`Evaluation`].
    pub fn evaluate(&self, request: &RequestDescriptor) -> Evaluation<'_> {
        let mut failures = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            match rule.matches(request) {
                Ok(true) => {
                    return Evaluation {
                        matched: Some(Matched { index, rule }),
                        failures,
                    };
                }
                Ok(false) => {}
                Err(error) => failures.push(RuleFailure { rule: index, error }),
            }
        }
        Evaluation {
            matched: None,
            failures,
        }
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Outcome of [`RuleSet::evaluate`].
#[derive(Debug)]
pub struct Evaluation<'a> {
    matched: Option<Matched<'a>>,
    failures: Vec<RuleFailure>,
}

impl<'a> Evaluation<'a> {
    /// The winning rule, if any.
    pub fn matched(&self) -> Option<&Matched<'a>> {
        self.matched.as_ref()
    }

    /// Predicate failures encountered before the winning rule (or across all
    /// rules when nothing matched).
    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }

    /// Splits the evaluation into its parts.
    pub fn into_parts(self) -> (Option<Matched<'a>>, Vec<RuleFailure>) {
        (self.matched, self.failures)
    }
}

/// A rule that matched, with its position in the rule set.
#[derive(Debug, Clone, Copy)]
pub struct Matched<'a> {
    index: usize,
    rule: &'a Rule,
}

impl<'a> Matched<'a> {
    /// Position of the rule in the rule set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The matched rule.
    pub fn rule(&self) -> &'a Rule {
        self.rule
    }

    /// Computes the fingerprint of `request` under this rule.
    pub fn fingerprint(&self, request: &RequestDescriptor) -> Fingerprint {
        Fingerprint::compute(self.index, self.rule, request)
    }
}

/// Predicate failure attributed to a rule.
#[derive(Debug)]
pub struct RuleFailure {
    /// Index of the rule whose predicate failed.
    pub rule: usize,
    /// The failure.
    pub error: MatchError,
}
