//! `lro-http` is an async HTTP client for ARM-style REST APIs.
//!
//! The crate wraps two thin but load-bearing patterns behind ergonomic
//! types:
//! - [`RequestExecutor::send`] — a single request with a configurable
//!   [`RetryPolicy`] (status codes, transport error kinds, count,
//!   interval)
//! - [`OperationPoller::wait`] — drives an accepted (`202`-style)
//!   response to a terminal state by polling its operation-status URL
//!
//! [`ServiceClient`] ties both together with an immutable base URI,
//! api-version and authorization configuration, plus `nextLink`-style
//! paged accumulation.

mod error;
mod executor;
mod pages;
mod policy;
mod poller;
mod request;
mod response;
mod service;

pub use error::LroHttpError;
pub use executor::RequestExecutor;
pub use pages::Page;
pub use policy::{RetryPolicy, TransportErrorKind};
pub use poller::{OperationPoller, PollOptions};
pub use request::WebRequest;
pub use response::WebResponse;
pub use service::ServiceClient;

pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, LroHttpError>;
