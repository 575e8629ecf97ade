//! HTTP transport for the Cloud Controller API.
//!
//! This module provides the [`Client`] struct: a thin wrapper around a pooled
//! `reqwest::Client` that builds endpoint URLs against a parsed API base,
//! executes requests, extracts non-fatal `X-Cf-Warnings` strings from every
//! response, and decodes JSON bodies. Resource operations live with their
//! resource modules (see [`crate::buildpack`]).

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::upload::{BoundarySource, RandomBoundary};

/// Default connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout in seconds. Generous because buildpack bundles can
/// take minutes to transfer.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Response header the Cloud Controller uses for non-fatal advisory strings.
const CF_WARNINGS_HEADER: &str = "X-Cf-Warnings";

/// Non-fatal warning strings attached to a response, in arrival order.
pub type Warnings = Vec<String>;

/// Cloud Controller API client.
///
/// Designed to be created once and reused across calls, taking advantage of
/// connection pooling. Cloning is cheap; clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use ccv2_client::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("https://api.example.com")?;
/// let (buildpacks, warnings) = client.get_buildpacks(&[]).await?;
/// println!("{} buildpacks, {} warnings", buildpacks.len(), warnings.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: Url,
    boundaries: Arc<dyn BoundarySource>,
}

impl Client {
    /// Creates a client for the given API base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `api_url` does not parse.
    pub fn new(api_url: &str) -> Result<Self, ClientError> {
        Self::builder(api_url).build()
    }

    /// Returns a builder for customizing timeouts and the boundary source.
    #[must_use]
    pub fn builder(api_url: &str) -> ClientBuilder {
        ClientBuilder {
            api_url: api_url.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            boundaries: Arc::new(RandomBoundary),
        }
    }

    /// Returns the boundary source used for multipart envelopes.
    pub(crate) fn boundaries(&self) -> &dyn BoundarySource {
        self.boundaries.as_ref()
    }

    /// Resolves an API path (absolute, e.g. `/v2/buildpacks`) against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.api_url
            .join(path)
            .map_err(|_| ClientError::invalid_url(format!("{}{path}", self.api_url)))
    }

    /// Starts a GET request for the given endpoint.
    pub(crate) fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http.get(url)
    }

    /// Starts a PUT request with a streaming body for the given endpoint.
    pub(crate) fn put_stream(&self, url: Url, body: reqwest::Body) -> reqwest::RequestBuilder {
        self.http.put(url).body(body)
    }

    /// Starts a POST or PUT request carrying a JSON-encoded body.
    ///
    /// The body is serialized eagerly so encode failures surface before any
    /// request is sent.
    pub(crate) fn request_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &B,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let encoded = serde_json::to_vec(body).map_err(ClientError::encode)?;
        Ok(self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .body(encoded))
    }

    /// Executes a request: sends it, collects warnings, enforces a 2xx
    /// status, and decodes the JSON body.
    ///
    /// Warnings are attached to the success payload, or carried inside the
    /// `Http` error for non-2xx responses, so callers see them either way.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: Url,
    ) -> Result<(T, Warnings), ClientError> {
        debug!(url = %url, "sending request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::timeout(url.as_str())
            } else {
                ClientError::network(url.as_str(), e)
            }
        })?;

        let warnings = parse_warnings(response.headers());
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http(url.as_str(), status.as_u16(), warnings));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::network(url.as_str(), e))?;
        let decoded =
            serde_json::from_slice(&body).map_err(|e| ClientError::decode(url.as_str(), e))?;

        Ok((decoded, warnings))
    }
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    api_url: String,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    boundaries: Arc<dyn BoundarySource>,
}

impl ClientBuilder {
    /// Sets the connect timeout in seconds.
    #[must_use]
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Sets the read timeout in seconds.
    #[must_use]
    pub fn read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    /// Overrides the multipart boundary source. Intended for tests that need
    /// reproducible upload framing.
    #[must_use]
    pub fn boundary_source(mut self, boundaries: Arc<dyn BoundarySource>) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the API base URL does not parse.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied timeout
    /// configuration. This should never happen in practice.
    #[allow(clippy::expect_used)]
    pub fn build(self) -> Result<Client, ClientError> {
        let api_url =
            Url::parse(&self.api_url).map_err(|_| ClientError::invalid_url(&self.api_url))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.read_timeout_secs))
            .build()
            .expect("failed to build HTTP client with static configuration");

        Ok(Client {
            http,
            api_url,
            boundaries: self.boundaries,
        })
    }
}

/// Extracts warnings from the `X-Cf-Warnings` header.
///
/// The header value is comma-separated; individual warnings are
/// percent-encoded with `+` standing for space.
fn parse_warnings(headers: &HeaderMap) -> Warnings {
    headers
        .get_all(CF_WARNINGS_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|warning| !warning.is_empty())
        .map(|warning| {
            let spaced = warning.replace('+', " ");
            match urlencoding::decode(&spaced) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => spaced,
            }
        })
        .collect()
}
