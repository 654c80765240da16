//! Client side of the remote conversion endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::error::TransportError;
use crate::request::ConversionRequest;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of whatever the service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns the raw answer.
///
/// Any HTTP status counts as a completed exchange; only failures to get an
/// answer at all are errors.
pub trait ConversionTransport {
    fn dispatch(
        &self,
        request: &ConversionRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>>;
}

impl<T: ConversionTransport + ?Sized> ConversionTransport for &T {
    fn dispatch(
        &self,
        request: &ConversionRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> {
        (**self).dispatch(request)
    }
}

/// POSTs JSON to a single conversion URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(url: Url) -> Result<Self, TransportError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("htmlgo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| TransportError::Client { source })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl ConversionTransport for HttpTransport {
    async fn dispatch(&self, request: &ConversionRequest) -> Result<RawResponse, TransportError> {
        let body = request
            .to_body()
            .map_err(|source| TransportError::Encode { source })?;

        tracing::info!(url = %self.url, direction = %request.direction(), "dispatching conversion");
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: self.url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Body { source })?;
        tracing::debug!(status, len = body.len(), "conversion response received");

        Ok(RawResponse { status, body })
    }
}
