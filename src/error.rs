use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum LroHttpError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    ///
    /// The executor never produces this variant — it hands every
    /// completed response back to the caller. Higher layers raise it
    /// when a status code rules out further interpretation.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Async operation reached a terminal failure state.
    #[error("operation failed with status {status}: {body}")]
    OperationFailed {
        /// HTTP status of the last poll response.
        status: u16,
        /// Raw body of the last poll response, for diagnostics.
        body: String,
    },
    /// Async operation exceeded its wait budget.
    #[error("operation did not complete after waiting {waited:?}")]
    OperationTimedOut { waited: Duration },
    /// Accepted response carries no discoverable operation-status URL.
    #[error("accepted response carries no operation-status URL")]
    MalformedOperationResponse,
    /// Response decoding or protocol-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
}
