//! Incoming HTTP request type.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// An incoming HTTP request with its body fully buffered.
///
/// The method is kept as sent on the wire, so stages also see requests whose
/// method the router does not know.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self { method: method.into(), path: path.into(), headers, body, params: HashMap::new() }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/api/products/{id}`, `req.param("id")` on
    /// `/api/products/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The body as a JSON object.
    ///
    /// An empty body reads as `{}`, and so does any JSON value that is not an
    /// object: such a body simply carries no fields. Bytes that are not JSON at
    /// all are [`ApiError::MalformedBody`].
    pub fn json_object(&self) -> Result<Map<String, Value>, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_slice(&self.body)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Decodes the body object into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let object = self.json_object()?;
        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    fn with_body(body: &str) -> Request {
        Request::new(Method::Post, "/", Vec::new(), body.as_bytes().to_vec())
    }

    #[test]
    fn empty_and_non_object_bodies_carry_no_fields() {
        assert!(with_body("").json_object().unwrap().is_empty());
        assert!(with_body("  \n").json_object().unwrap().is_empty());
        assert!(with_body("[1, 2]").json_object().unwrap().is_empty());
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = with_body("{not json").json_object().unwrap_err();
        assert!(matches!(err, ApiError::MalformedBody(_)));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(
            Method::Get,
            "/",
            vec![("X-API-Key".to_owned(), "s3cret".to_owned())],
            Vec::new(),
        );
        assert_eq!(req.header("x-api-key"), Some("s3cret"));
        assert_eq!(req.header("authorization"), None);
    }
}
