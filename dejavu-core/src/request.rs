//! Request descriptor handed to the matcher by the host integration.

use http::Method;
use serde_json::Value;

/// Per-request view of the fields rules can match on.
///
/// The descriptor is built by the host from the live request and dropped
/// once the deduplication decision is made.
///
/// `raw_path` is the path as received, **including** the query string, so a
/// rule declared as `/search?q=1` only matches that exact request target.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    raw_path: String,
    body: Option<Value>,
}

impl RequestDescriptor {
    /// Creates a descriptor from its parts.
    pub fn new(method: Method, raw_path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            raw_path: raw_path.into(),
            body,
        }
    }

    /// Builds a descriptor from HTTP request parts and an already parsed body.
    ///
    /// The raw path is taken from the request target's path and query, falling
    /// back to `/` for authority-form or asterisk-form targets.
    pub fn from_parts(parts: &http::request::Parts, body: Option<Value>) -> Self {
        let raw_path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Self::new(parts.method.clone(), raw_path, body)
    }

    /// Replaces the parsed body.
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request path including any query string.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Parsed request body, if the request carried one.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_keeps_query_string() {
        let (parts, _) = http::Request::post("http://localhost/a/path?q=1")
            .body(())
            .unwrap()
            .into_parts();
        let descriptor = RequestDescriptor::from_parts(&parts, Some(json!({"id": 1})));

        assert_eq!(descriptor.method(), &Method::POST);
        assert_eq!(descriptor.raw_path(), "/a/path?q=1");
        assert_eq!(descriptor.body(), Some(&json!({"id": 1})));
    }
}
