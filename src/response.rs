use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{LroHttpError, Result};

/// One completed HTTP exchange: status code, headers and raw body.
///
/// The executor captures the full body before returning, so a
/// `WebResponse` is a plain value with no live connection behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl WebResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            LroHttpError::Decode(format!("invalid response JSON: {err}; body: {}", self.body))
        })
    }

    /// URL for polling the status of an asynchronous operation.
    ///
    /// `Azure-AsyncOperation` takes precedence over `Location` when
    /// both are present.
    pub fn operation_location(&self) -> Option<&str> {
        self.header("azure-asyncoperation")
            .or_else(|| self.header("location"))
    }

    /// Parses an integer-seconds `Retry-After` header.
    ///
    /// The HTTP-date form is not produced by the services this crate
    /// targets and is ignored.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
