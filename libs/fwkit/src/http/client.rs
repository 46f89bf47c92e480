//! Traced HTTP client.
//!
//! Wraps `reqwest::Client` so every outgoing request runs inside an
//! `outgoing_http` span carrying method, url and response status.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{field::Empty, Instrument, Level};

use crate::error::{FwError, FwResult};

pub const USER_ID_HEADER: &str = "X-User-ID";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Build a client with connect/request timeouts and headers sent on every request.
    pub fn with_defaults(timeout: Duration, headers: &[(&str, &str)]) -> FwResult<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FwError::invalid_argument(format!("Invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FwError::invalid_argument(format!("Invalid header value: {e}")))?;
            map.insert(name, value);
        }
        let inner = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .default_headers(map)
            .build()
            .map_err(|e| FwError::invalid_argument(format!("Invalid HTTP client settings: {e}")))?;
        Ok(Self { inner })
    }

    /// Client identifying the device through the `X-User-ID` header.
    pub fn for_user(user_id: &str, timeout: Duration) -> FwResult<Self> {
        Self::with_defaults(timeout, &[(USER_ID_HEADER, user_id)])
    }

    /// Execute a built request inside an `outgoing_http` span.
    ///
    /// Non-2xx responses are returned as-is; only transport failures become errors.
    pub async fn execute(&self, req: reqwest::Request) -> FwResult<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = Empty,
            error = Empty,
        );

        async {
            match self.inner.execute(req).await {
                Ok(response) => {
                    let status = response.status();
                    tracing::Span::current().record("http.status_code", status.as_u16());
                    if status.is_client_error() || status.is_server_error() {
                        tracing::Span::current().record("error", true);
                    }
                    tracing::debug!(status = status.as_u16(), "response received");
                    Ok(response)
                }
                Err(e) => {
                    tracing::Span::current().record("error", true);
                    tracing::debug!(error = %e, "request failed before a response arrived");
                    Err(FwError::from(e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Build and execute a request prepared with [`TracedClient::request`].
    pub async fn send(&self, builder: reqwest::RequestBuilder) -> FwResult<reqwest::Response> {
        let req = builder.build().map_err(FwError::from)?;
        self.execute(req).await
    }

    pub async fn get(&self, url: &str) -> FwResult<reqwest::Response> {
        self.send(self.inner.get(url)).await
    }

    pub async fn post(&self, url: &str) -> FwResult<reqwest::Response> {
        self.send(self.inner.post(url)).await
    }

    pub async fn put(&self, url: &str) -> FwResult<reqwest::Response> {
        self.send(self.inner.put(url)).await
    }

    pub async fn delete(&self, url: &str) -> FwResult<reqwest::Response> {
        self.send(self.inner.delete(url)).await
    }

    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_TIMEOUT, &[]).unwrap_or_else(|_| Self::new(reqwest::Client::new()))
    }
}
