use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::sleep;

use crate::{LroHttpError, Result, RetryPolicy, TransportErrorKind, WebRequest, WebResponse};

/// Sends single HTTP requests with a per-call [`RetryPolicy`].
///
/// The executor holds no state across calls beyond the underlying
/// connection pool: identical requests sent twice produce two
/// independent responses, with no caching or deduplication.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    http: reqwest::Client,
    timeout: Duration,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestExecutor {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `request`, retrying per `policy`.
    ///
    /// Every completed HTTP exchange is returned as `Ok`, including
    /// 4xx/5xx — status interpretation belongs to the caller. A status
    /// in the policy's retriable set is re-attempted first; once the
    /// retry budget is spent the last response is returned as-is.
    /// `Err(Transport)` is produced only for connection-level failures
    /// whose kind is not retriable or no longer has budget.
    pub async fn send(&self, request: &WebRequest, policy: &RetryPolicy) -> Result<WebResponse> {
        let mut attempt = 0usize;
        loop {
            match self.attempt(request).await {
                Ok(response) => {
                    if policy.is_retriable_status(response.status) && attempt < policy.retry_count {
                        self.wait_before_retry(policy, attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    let kind = TransportErrorKind::classify(&err);
                    if policy.is_retriable_error(kind) && attempt < policy.retry_count {
                        self.wait_before_retry(policy, attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(LroHttpError::Transport(err));
                }
            }
        }
    }

    /// One transport attempt: a fresh `reqwest` request is built from
    /// the immutable `WebRequest` every time.
    async fn attempt(&self, request: &WebRequest) -> std::result::Result<WebResponse, reqwest::Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.uri)
            .timeout(self.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text().await?;

        Ok(WebResponse {
            status,
            headers,
            body,
        })
    }

    async fn wait_before_retry(&self, policy: &RetryPolicy, attempt: usize) {
        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, "retrying request after {:?}", policy.retry_interval);
        #[cfg(not(feature = "tracing"))]
        let _ = attempt;

        sleep(policy.retry_interval).await;
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_ascii_lowercase(), value.to_owned()))
        })
        .collect()
}
