//! ezapi client.
//!
//! Holds the transport, filesystem and configuration shared by every request
//! and hands out fresh [`RequestBuilder`]s.

use std::sync::Arc;

use crate::config::EzApiConfig;
use crate::errors::EzApiResult;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::request::RequestBuilder;
use crate::transport::{HttpTransport, ReqwestTransport};

/// The main ezapi client.
///
/// Cloning is cheap. Builders obtained from one client share no mutable
/// state and may be dispatched concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use ezapi_client::{EzApiClient, Values};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EzApiClient::new()?;
///
///     let response = client
///         .request()
///         .url("https://httpbin.org/post")
///         .form_data(&Values::from([("title", "report")]))
///         .upload("./report.pdf")
///         .send("POST")
///         .await?;
///
///     println!("{}", response.status);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EzApiClient {
    transport: Arc<dyn HttpTransport>,
    fs: Arc<dyn FileSystem>,
    config: Arc<EzApiConfig>,
}

impl EzApiClient {
    /// Creates a client with the reqwest transport and default configuration.
    pub fn new() -> EzApiResult<Self> {
        EzApiClientBuilder::new().build()
    }

    /// Creates a new client builder.
    pub fn builder() -> EzApiClientBuilder {
        EzApiClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `EZAPI_TIMEOUT` and `EZAPI_QUERY_STYLE`.
    pub fn from_env() -> EzApiResult<Self> {
        EzApiClientBuilder::new()
            .config(EzApiConfig::from_env()?)
            .build()
    }

    /// Starts a new request.
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.fs),
            Arc::clone(&self.config),
        )
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EzApiConfig {
        &self.config
    }
}

impl std::fmt::Debug for EzApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EzApiClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the ezapi client.
#[derive(Default)]
pub struct EzApiClientBuilder {
    config: Option<EzApiConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    fs: Option<Arc<dyn FileSystem>>,
}

impl EzApiClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: EzApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom upload filesystem.
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Builds the client.
    pub fn build(self) -> EzApiResult<EzApiClient> {
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(EzApiClient {
            transport,
            fs: self.fs.unwrap_or_else(|| Arc::new(TokioFileSystem)),
            config: Arc::new(self.config.unwrap_or_default()),
        })
    }
}
