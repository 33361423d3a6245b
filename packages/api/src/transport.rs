//! # HTTP transport
//!
//! [`Transport`] is the seam between [`crate::ApiClient`] and the network: the
//! client builds an [`ApiRequest`] (method, path with query, headers, body) and
//! gets back the status and raw body. It never sees a socket.
//!
//! [`ReqwestTransport`] is the production implementation. It resolves each path
//! against the configured base URL and sends it with a shared `reqwest::Client`.
//! On native targets the configured timeout applies to each request; in the
//! browser the `fetch` API has no per-request timeout and the transport relies on
//! the browser's own limits.

use std::future::Future;

pub use reqwest::header::HeaderMap;
pub use reqwest::Method;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::config::ApiConfig;

/// A request ready to be sent, relative to the API origin.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path plus optional query, e.g. `/api/users?search=al`.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// What came back: the status code and the unparsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// The request failed before a response arrived.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Async interface for sending API requests.
pub trait Transport {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>>;
}

/// `reqwest`-backed transport bound to one API origin.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport for `config.base_url`.
    ///
    /// Fails when the base URL does not parse or the HTTP client cannot be built.
    /// A path prefix on the base URL (`http://host/admin`) is kept.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::new(format!("invalid base URL `{}`: {e}", config.base_url)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        #[cfg(not(target_arch = "wasm32"))]
        let client = Client::builder().timeout(config.timeout).build()?;
        #[cfg(target_arch = "wasm32")]
        let client = Client::builder().build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/api/users?search=al`.
    pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::new(format!("invalid request path `{path}`: {e}")))
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.path)?;

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
