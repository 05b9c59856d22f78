use std::time::Duration;

/// Classification of a `reqwest` transport error for retry matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect or read deadline exceeded.
    Timeout,
    /// TCP/TLS connection could not be established.
    Connect,
    /// Request could not be constructed or sent.
    Request,
    /// Failure while streaming the response body.
    Body,
    /// Anything else; never retried by the default policy.
    Other,
}

impl TransportErrorKind {
    pub(crate) fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_body() {
            Self::Body
        } else if err.is_request() {
            Self::Request
        } else {
            Self::Other
        }
    }
}

/// Conditions under which a failed attempt is repeated.
///
/// The executor retries when a transport error matches
/// `retriable_error_kinds` or a completed response's status code is in
/// `retriable_status_codes`, up to `retry_count` extra attempts with a
/// fixed `retry_interval` wait between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub retry_count: usize,
    /// Fixed wait between attempts.
    pub retry_interval: Duration,
    /// Transport error kinds treated as transient.
    pub retriable_error_kinds: Vec<TransportErrorKind>,
    /// HTTP status codes treated as transient.
    pub retriable_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 6,
            retry_interval: Duration::from_secs(10),
            retriable_error_kinds: vec![TransportErrorKind::Timeout],
            retriable_status_codes: vec![409, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retries() -> Self {
        Self {
            retry_count: 0,
            retry_interval: Duration::ZERO,
            retriable_error_kinds: Vec::new(),
            retriable_status_codes: Vec::new(),
        }
    }

    pub(crate) fn is_retriable_status(&self, status: u16) -> bool {
        self.retriable_status_codes.contains(&status)
    }

    pub(crate) fn is_retriable_error(&self, kind: TransportErrorKind) -> bool {
        self.retriable_error_kinds.contains(&kind)
    }
}
