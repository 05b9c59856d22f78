use std::collections::BTreeMap;

use reqwest::Method;
use serde::Serialize;

use crate::{LroHttpError, Result};

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// One HTTP request: method, target URI, headers and an optional body.
///
/// A `WebRequest` is immutable once handed to the executor — every
/// retry and poll attempt builds a fresh transport request from it
/// rather than mutating and resending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebRequest {
    pub method: Method,
    pub uri: String,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl WebRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Sets a header, replacing any previous value under the same
    /// (case-insensitive) name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Serializes `body` as JSON and sets
    /// `Content-Type: application/json; charset=utf-8`.
    pub fn json_body<T: Serialize>(self, body: &T) -> Result<Self> {
        let serialized = serde_json::to_string(body)
            .map_err(|err| LroHttpError::Decode(format!("invalid request body: {err}")))?;
        Ok(self
            .header("content-type", CONTENT_TYPE_JSON)
            .raw_body(serialized))
    }

    /// Sets a pre-serialized body without touching headers.
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::WebRequest;

    #[test]
    fn header_names_are_stored_lowercase() {
        let request = WebRequest::get("https://host/api").header("Authorization", "Bearer t");
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer t")
        );
    }

    #[test]
    fn header_replaces_previous_value_case_insensitively() {
        let request = WebRequest::get("https://host/api")
            .header("X-Custom", "one")
            .header("x-custom", "two");
        assert_eq!(
            request.headers.get("x-custom").map(String::as_str),
            Some("two")
        );
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = WebRequest::put("https://host/api")
            .json_body(&json!({"id": 7}))
            .expect("body must serialize");
        assert!(request.has_header("Content-Type"));
        assert_eq!(request.body.as_deref(), Some(r#"{"id":7}"#));
    }
}
