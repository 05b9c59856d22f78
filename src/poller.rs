use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::{LroHttpError, RequestExecutor, Result, RetryPolicy, WebRequest, WebResponse};

/// Configures the long-running-operation poll loop.
#[derive(Clone, Debug)]
pub struct PollOptions {
    /// Wait between status checks when the service sends no
    /// `Retry-After` header.
    pub default_interval: Duration,
    /// Wall-clock ceiling on the whole poll sequence. `None` leaves
    /// termination to the executor's own retry exhaustion.
    pub timeout: Option<Duration>,
    /// Headers applied to every status GET (typically `Authorization`).
    pub headers: BTreeMap<String, String>,
    /// Retry policy for each individual status GET.
    pub policy: RetryPolicy,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_secs(15),
            timeout: None,
            headers: BTreeMap::new(),
            policy: RetryPolicy::default(),
        }
    }
}

impl PollOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }
}

/// Terminal-state classification of one status-check response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OperationState {
    InProgress,
    Succeeded,
    Failed,
}

/// Drives an accepted asynchronous operation to a terminal state.
///
/// Given a response that signals "accepted, operation in progress"
/// (status 202 or a caller-designated equivalent carrying an
/// operation-status header), the poller re-issues GETs against the
/// status URL until the payload reports success or failure, or the
/// configured ceiling elapses. The poller owns nothing but the current
/// response; each call to [`OperationPoller::wait`] is an independent
/// sequence.
#[derive(Debug)]
pub struct OperationPoller<'a> {
    executor: &'a RequestExecutor,
    options: PollOptions,
}

impl<'a> OperationPoller<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self::with_options(executor, PollOptions::default())
    }

    pub fn with_options(executor: &'a RequestExecutor, options: PollOptions) -> Self {
        Self { executor, options }
    }

    /// Polls the operation behind `initial` until it terminates.
    ///
    /// Fails fast with [`LroHttpError::MalformedOperationResponse`]
    /// when `initial` carries no status URL — "creation accepted but
    /// untrackable" must not loop.
    pub async fn wait(&self, initial: &WebResponse) -> Result<WebResponse> {
        let status_uri = initial
            .operation_location()
            .ok_or(LroHttpError::MalformedOperationResponse)?;

        let mut request = WebRequest::get(status_uri);
        for (name, value) in &self.options.headers {
            request = request.header(name, value.clone());
        }

        let started = Instant::now();
        loop {
            let response = self.executor.send(&request, &self.options.policy).await?;
            match classify(&response) {
                OperationState::Succeeded => return Ok(response),
                OperationState::Failed => {
                    return Err(LroHttpError::OperationFailed {
                        status: response.status,
                        body: response.body,
                    })
                }
                OperationState::InProgress => {
                    if let Some(ceiling) = self.options.timeout {
                        let waited = started.elapsed();
                        if waited >= ceiling {
                            return Err(LroHttpError::OperationTimedOut { waited });
                        }
                    }

                    let interval = response
                        .retry_after()
                        .unwrap_or(self.options.default_interval);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(status = response.status, "operation in progress, polling again after {:?}", interval);

                    sleep(interval).await;
                }
            }
        }
    }
}

/// Maps one status-check response onto the operation state machine.
///
/// - 202, or a 2xx whose body `status` is any non-terminal marker
///   (`Accepted`, `Running`, ...) → still in progress
/// - 2xx reporting `Succeeded`, or a 2xx with no readable `status`
///   field (the endpoint stopped reporting progress) → succeeded
/// - 2xx reporting `Failed`/`Canceled`, or any non-2xx → failed
fn classify(response: &WebResponse) -> OperationState {
    if response.status == 202 {
        return OperationState::InProgress;
    }
    if !response.is_success() {
        return OperationState::Failed;
    }

    let status_field = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| body.get("status").and_then(|s| s.as_str()).map(str::to_owned));

    match status_field.as_deref() {
        Some("Succeeded") | None => OperationState::Succeeded,
        Some("Failed") | Some("Canceled") => OperationState::Failed,
        Some(_) => OperationState::InProgress,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{classify, OperationState};
    use crate::WebResponse;

    fn poll_response(status: u16, body: &str) -> WebResponse {
        WebResponse {
            status,
            headers: BTreeMap::new(),
            body: body.to_owned(),
        }
    }

    #[test]
    fn accepted_status_is_in_progress() {
        let response = poll_response(202, "");
        assert_eq!(classify(&response), OperationState::InProgress);
    }

    #[test]
    fn succeeded_marker_terminates() {
        let response = poll_response(200, r#"{"status": "Succeeded"}"#);
        assert_eq!(classify(&response), OperationState::Succeeded);
    }

    #[test]
    fn failed_and_canceled_markers_terminate_as_failure() {
        assert_eq!(
            classify(&poll_response(200, r#"{"status": "Failed"}"#)),
            OperationState::Failed
        );
        assert_eq!(
            classify(&poll_response(200, r#"{"status": "Canceled"}"#)),
            OperationState::Failed
        );
    }

    #[test]
    fn in_progress_markers_keep_polling() {
        for marker in ["Accepted", "Running", "InProgress"] {
            let response = poll_response(200, &format!(r#"{{"status": "{marker}"}}"#));
            assert_eq!(classify(&response), OperationState::InProgress, "{marker}");
        }
    }

    #[test]
    fn success_range_without_status_field_is_success() {
        // Some operations stop reporting progress and simply return the
        // resource; treat that as completion rather than looping.
        let response = poll_response(200, r#"{"name": "vm-1"}"#);
        assert_eq!(classify(&response), OperationState::Succeeded);
    }

    #[test]
    fn non_success_status_is_failure() {
        let response = poll_response(500, r#"{"error": "boom"}"#);
        assert_eq!(classify(&response), OperationState::Failed);
    }
}
