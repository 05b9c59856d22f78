use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{
    pages::Page,
    poller::{OperationPoller, PollOptions},
    request::CONTENT_TYPE_JSON,
    LroHttpError, RequestExecutor, Result, RetryPolicy, WebRequest, WebResponse,
};

/// Client for one REST service: an immutable base URI, optional
/// `api-version` and authorization value, plus the executor and
/// default retry policy shared by every operation.
///
/// Resource-specific callers build a [`WebRequest`], pass it to
/// [`ServiceClient::begin_request`], and hand accepted responses to
/// [`ServiceClient::wait_for_operation`]. The configuration never
/// changes after construction; per-operation overrides go through
/// [`ServiceClient::begin_request_with`].
#[derive(Clone)]
pub struct ServiceClient {
    executor: RequestExecutor,
    base_uri: String,
    api_version: Option<String>,
    authorization: String,
    policy: RetryPolicy,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_uri", &self.base_uri)
            .field("api_version", &self.api_version)
            .field("authorization", &"<redacted>")
            .field("policy", &self.policy)
            .finish()
    }
}

impl ServiceClient {
    /// Creates a client with a full raw authorization value.
    ///
    /// Example: `"Bearer <token>"`, `"Basic <credential>"` or any
    /// custom scheme — the value is opaque to this crate.
    pub fn new_raw_auth(base_uri: impl Into<String>, authorization: impl Into<String>) -> Self {
        Self {
            executor: RequestExecutor::new(),
            base_uri: base_uri.into(),
            api_version: None,
            authorization: authorization.into(),
            policy: RetryPolicy::default(),
            poll_interval: PollOptions::default().default_interval,
            poll_timeout: None,
        }
    }

    /// Creates a client from a bearer token.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added
    /// automatically.
    pub fn new_bearer(base_uri: impl Into<String>, token: impl AsRef<str>) -> Self {
        let authorization = normalize_bearer_authorization(token.as_ref());
        Self::new_raw_auth(base_uri, authorization)
    }

    /// Sets the `api-version` query value appended to templated URIs.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Replaces the default retry policy used by
    /// [`ServiceClient::begin_request`].
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the executor, e.g. to change the per-attempt timeout.
    pub fn with_executor(mut self, executor: RequestExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Sets the wait between operation status checks when the service
    /// sends no `Retry-After` header.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets a wall-clock ceiling on operation polling.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    /// Expands a `{name}` URI template against this client's base URI.
    ///
    /// Parameter values are substituted verbatim; the configured
    /// `api-version` is appended as a query parameter when present.
    ///
    /// # Example
    ///
    /// ```
    /// use lro_http::ServiceClient;
    ///
    /// let client = ServiceClient::new_bearer("https://management.example.com", "token")
    ///     .with_api_version("2016-03-30");
    /// let uri = client.request_uri(
    ///     "/groups/{group}/machines/{name}/restart",
    ///     &[("group", "rg-1"), ("name", "vm-1")],
    /// );
    /// assert_eq!(
    ///     uri,
    ///     "https://management.example.com/groups/rg-1/machines/vm-1/restart?api-version=2016-03-30"
    /// );
    /// ```
    pub fn request_uri(&self, template: &str, params: &[(&str, &str)]) -> String {
        let mut path = template.to_owned();
        for (name, value) in params {
            path = path.replace(&format!("{{{name}}}"), value);
        }
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        let base = self.base_uri.trim_end_matches('/');
        let mut uri = format!("{base}{path}");
        if let Some(api_version) = &self.api_version {
            let separator = if uri.contains('?') { '&' } else { '?' };
            uri.push_str(&format!("{separator}api-version={api_version}"));
        }
        uri
    }

    /// Sends `request` with this client's default retry policy.
    ///
    /// The `Authorization` header is injected, and
    /// `Content-Type: application/json; charset=utf-8` when a body is
    /// present without an explicit content type. The response is
    /// returned whatever its status code; callers interpret it.
    pub async fn begin_request(&self, request: WebRequest) -> Result<WebResponse> {
        self.begin_request_with(request, &self.policy).await
    }

    /// Sends `request` with a per-operation retry policy override.
    pub async fn begin_request_with(
        &self,
        request: WebRequest,
        policy: &RetryPolicy,
    ) -> Result<WebResponse> {
        let request = self.apply_default_headers(request);
        self.executor.send(&request, policy).await
    }

    /// Polls the asynchronous operation behind `initial` to a terminal
    /// state, carrying this client's authorization on every status GET.
    pub async fn wait_for_operation(&self, initial: &WebResponse) -> Result<WebResponse> {
        let mut options = PollOptions {
            default_interval: self.poll_interval,
            timeout: self.poll_timeout,
            ..PollOptions::default()
        };
        options = options.header("authorization", self.authorization.clone());
        options.policy = self.policy.clone();

        OperationPoller::with_options(&self.executor, options)
            .wait(initial)
            .await
    }

    /// Accumulates a `value` / `nextLink` paginated listing starting
    /// at `uri`, preserving page order.
    ///
    /// Any page answering with a non-200 status fails the whole
    /// listing with [`LroHttpError::Http`].
    pub async fn collect_paged<T: DeserializeOwned>(&self, uri: impl Into<String>) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(uri.into());

        while let Some(page_uri) = next {
            let response = self.begin_request(WebRequest::get(page_uri)).await?;
            if response.status != 200 {
                return Err(LroHttpError::Http {
                    status: response.status,
                    body: response.body,
                });
            }
            let page: Page<T> = response.json()?;
            items.extend(page.value);
            next = page.next_link;
        }

        Ok(items)
    }

    fn apply_default_headers(&self, mut request: WebRequest) -> WebRequest {
        if !request.has_header("authorization") {
            request = request.header("authorization", self.authorization.clone());
        }
        if request.body.is_some() && !request.has_header("content-type") {
            request = request.header("content-type", CONTENT_TYPE_JSON);
        }
        request
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_bearer_authorization, ServiceClient};
    use crate::WebRequest;

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("abc123"),
            "Bearer abc123".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let client = ServiceClient::new_raw_auth("https://management.example.com", "secret-token");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn request_uri_substitutes_every_placeholder() {
        let client = ServiceClient::new_bearer("https://management.example.com/", "token");
        let uri = client.request_uri(
            "/groups/{group}/machines/{name}",
            &[("group", "rg-1"), ("name", "vm-1")],
        );
        assert_eq!(uri, "https://management.example.com/groups/rg-1/machines/vm-1");
    }

    #[test]
    fn request_uri_appends_api_version_with_correct_separator() {
        let client = ServiceClient::new_bearer("https://management.example.com", "token")
            .with_api_version("2016-03-30");

        let plain = client.request_uri("/machines", &[]);
        assert_eq!(
            plain,
            "https://management.example.com/machines?api-version=2016-03-30"
        );

        let with_query = client.request_uri("/machines?$expand=instanceView", &[]);
        assert_eq!(
            with_query,
            "https://management.example.com/machines?$expand=instanceView&api-version=2016-03-30"
        );
    }

    #[test]
    fn default_headers_do_not_override_explicit_ones() {
        let client = ServiceClient::new_raw_auth("https://host", "Bearer default");
        let request = WebRequest::get("https://host/api").header("Authorization", "Basic custom");
        let request = client.apply_default_headers(request);
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Basic custom")
        );
    }

    #[test]
    fn json_content_type_is_set_only_when_body_present() {
        let client = ServiceClient::new_raw_auth("https://host", "Bearer t");

        let without_body = client.apply_default_headers(WebRequest::get("https://host/api"));
        assert!(!without_body.has_header("content-type"));

        let with_body =
            client.apply_default_headers(WebRequest::put("https://host/api").raw_body("{}"));
        assert_eq!(
            with_body.headers.get("content-type").map(String::as_str),
            Some("application/json; charset=utf-8")
        );
    }
}
