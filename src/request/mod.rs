//! Request builder and dispatcher.
//!
//! A [`RequestBuilder`] accumulates configuration through chained setters and
//! is consumed by [`RequestBuilder::send`], which picks exactly one body
//! encoding, applies headers and a deadline, calls the transport and drains
//! the response into a [`Response`].

mod spec;

pub use spec::{BodyEncoding, RequestSpec};

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::EzApiConfig;
use crate::errors::{EzApiError, EzApiResult, TransportError};
use crate::fs::FileSystem;
use crate::multipart::MultipartEncoder;
use crate::observability::{duration_ms, redact_headers, RequestTimer};
use crate::transport::{HttpRequest, HttpTransport, StreamingResponse};
use crate::types::{Response, Values};

/// Fluent builder for a single outbound request.
///
/// Every setter replaces the previous value for its field, except
/// [`upload`](Self::upload) which appends. Collections passed by reference
/// are cloned, so the caller's copies stay independent of the builder.
///
/// ```rust,no_run
/// use ezapi_client::{EzApiClient, Values};
///
/// # async fn run() -> Result<(), ezapi_client::EzApiError> {
/// let client = EzApiClient::new()?;
/// let response = client
///     .request()
///     .url("https://httpbin.org/post")
///     .headers(&Values::from([("Accept", "application/json")]))
///     .json(r#"{"x":1}"#)
///     .timeout(5)
///     .send("POST")
///     .await?;
/// println!("{} {}", response.status, response.text());
/// # Ok(())
/// # }
/// ```
pub struct RequestBuilder {
    transport: Arc<dyn HttpTransport>,
    fs: Arc<dyn FileSystem>,
    config: Arc<EzApiConfig>,
    spec: RequestSpec,
}

impl RequestBuilder {
    /// Creates a builder over the given collaborators.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        fs: Arc<dyn FileSystem>,
        config: Arc<EzApiConfig>,
    ) -> Self {
        Self {
            transport,
            fs,
            config,
            spec: RequestSpec::default(),
        }
    }

    /// Returns the configuration accumulated so far.
    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// Sets the URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.spec.url = url.into();
        self
    }

    /// Sets the request headers.
    pub fn headers(mut self, headers: &Values) -> Self {
        self.spec.headers = headers.clone();
        self
    }

    /// Sets a raw body.
    pub fn raw(mut self, body: impl Into<Bytes>) -> Self {
        self.spec.raw = Some(body.into());
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: impl Into<Bytes>) -> Self {
        self.spec.json = Some(body.into());
        self
    }

    /// Sets form fields and sends them URL-encoded.
    pub fn form(mut self, fields: &Values) -> Self {
        self.spec.url_encoded = true;
        self.form_data(fields)
    }

    /// Sets form fields without changing the URL-encoded flag.
    pub fn form_data(mut self, fields: &Values) -> Self {
        self.spec.form = fields.clone();
        self
    }

    /// Sets the query parameters.
    pub fn query(mut self, query: &Values) -> Self {
        self.spec.query = query.clone();
        self
    }

    /// Adds a file to upload as a multipart part.
    pub fn upload(mut self, path: impl Into<String>) -> Self {
        self.spec.uploads.push(path.into());
        self
    }

    /// Sets the timeout in whole seconds; zero selects the default.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.spec.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Builds and sends the request.
    ///
    /// Fails with [`EzApiError::MissingMethod`] or [`EzApiError::MissingUrl`]
    /// before any I/O. Non-2xx statuses are returned as a normal
    /// [`Response`].
    #[instrument(skip(self), fields(url = %self.spec.url))]
    pub async fn send(self, method: &str) -> EzApiResult<Response> {
        let RequestBuilder {
            transport,
            fs,
            config,
            spec,
        } = self;

        if method.is_empty() {
            return Err(EzApiError::MissingMethod);
        }
        if spec.url.is_empty() {
            return Err(EzApiError::MissingUrl);
        }

        let method = Method::from_bytes(method.as_bytes()).map_err(|_| EzApiError::InvalidMethod {
            method: method.to_string(),
        })?;
        let default_headers = to_header_map(&config.default_headers)?;
        let user_headers = to_header_map(&spec.headers)?;

        let url = spec.full_url(config.query_style);
        let timeout = spec.effective_timeout(config.default_timeout);

        let encoding = BodyEncoding::select(&method, &spec);
        debug!(?encoding, "Selected body encoding");
        let (body, content_type) = encode_body(encoding, spec, fs.as_ref()).await?;

        let mut headers = default_headers;
        if let Some(content_type) = content_type {
            let value = HeaderValue::from_str(&content_type)
                .map_err(|e| EzApiError::invalid_header(CONTENT_TYPE.as_str(), e))?;
            headers.insert(CONTENT_TYPE, value);
        }
        for (name, value) in &user_headers {
            headers.insert(name.clone(), value.clone());
        }

        debug!(
            method = %method,
            url = %url,
            headers = ?redact_headers(&headers),
            body_len = body.as_ref().map_or(0, Bytes::len),
            "Outgoing request"
        );

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
            timeout: Some(timeout),
        };

        let timer = RequestTimer::start();
        match tokio::time::timeout(timeout, exchange(transport.as_ref(), request)).await {
            Ok(Ok(response)) => {
                debug!(
                    status = response.status,
                    body_len = response.body.len(),
                    elapsed_ms = timer.elapsed_ms(),
                    "Incoming response"
                );
                Ok(response)
            }
            Ok(Err(error)) => {
                debug!(error = %error, elapsed_ms = timer.elapsed_ms(), "Transport failed");
                Err(EzApiError::Transport(error))
            }
            Err(_) => {
                warn!(timeout_ms = duration_ms(timeout), "Deadline exceeded");
                Err(EzApiError::Timeout { timeout })
            }
        }
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Converts configured headers, letting the last value of a name win.
fn to_header_map(values: &Values) -> EzApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in values.pairs() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| EzApiError::invalid_header(name, e))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| EzApiError::invalid_header(name, e))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Produces the body and the content type to force, if any.
async fn encode_body(
    encoding: BodyEncoding,
    spec: RequestSpec,
    fs: &dyn FileSystem,
) -> EzApiResult<(Option<Bytes>, Option<String>)> {
    match encoding {
        BodyEncoding::None => Ok((None, None)),
        BodyEncoding::Raw => Ok((spec.raw, None)),
        BodyEncoding::Json => Ok((spec.json, Some(mime::APPLICATION_JSON.to_string()))),
        BodyEncoding::UrlEncoded => Ok((
            Some(Bytes::from(spec.form.encode())),
            Some(mime::APPLICATION_WWW_FORM_URLENCODED.to_string()),
        )),
        BodyEncoding::Multipart => {
            let multipart = MultipartEncoder::new()
                .encode(&spec.form, &spec.uploads, fs)
                .await?;
            Ok((Some(multipart.body), Some(multipart.content_type)))
        }
    }
}

/// Sends the request and reads the whole body. The body stream is dropped
/// on every path out of this function.
async fn exchange(
    transport: &dyn HttpTransport,
    request: HttpRequest,
) -> Result<Response, TransportError> {
    let StreamingResponse {
        status,
        headers,
        mut body,
    } = transport.send(request).await?;

    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }

    Ok(Response {
        status,
        headers,
        body: buf.freeze(),
    })
}
