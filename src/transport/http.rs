//! HTTP transport implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http::{HeaderMap, Method};
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::instrument;

use crate::errors::TransportError;

/// Response body as a stream of chunks. Dropping it releases the connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HTTP request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including any query string.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Deadline the dispatcher enforces around this request. Transports that
    /// cannot be cancelled by drop should enforce it themselves.
    pub timeout: Option<Duration>,
}

/// Response head plus an unread body.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body stream.
    pub body: ByteStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// HTTP transport trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the response head with its body stream.
    ///
    /// Implementations must return promptly when the returned future is
    /// dropped; that is how the dispatcher cancels on deadline expiry.
    async fn send(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default reqwest client.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Connection {
                message: format!("Failed to create client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let timeout = request.timeout;
        let mut req_builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        // The dispatcher cancels by dropping this future at the deadline, so
        // no reqwest timeout is armed here.
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| TransportError::from_reqwest(e, timeout)));

        Ok(StreamingResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
