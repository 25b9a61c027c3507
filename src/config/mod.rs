//! Configuration module for the ezapi client.
//!
//! Holds the defaults every request builder starts from: the dispatch
//! timeout, how query parameters are joined onto the URL, and headers sent
//! with every request.

use std::time::Duration;

use crate::errors::{EzApiError, EzApiResult};
use crate::types::Values;

/// Default dispatch timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How query parameters are attached to the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStyle {
    /// `base?k=v&k2=v2`, or `base&k=v` when the base already has a query.
    #[default]
    Standard,
    /// Unescaped `k=v&k2=v2` appended to the base verbatim. The caller
    /// includes the `?` separator in the base URL.
    Literal,
}

impl std::str::FromStr for QueryStyle {
    type Err = EzApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(QueryStyle::Standard),
            "literal" => Ok(QueryStyle::Literal),
            other => Err(EzApiError::configuration(format!(
                "Unknown query style '{}' (expected 'standard' or 'literal')",
                other
            ))),
        }
    }
}

/// Configuration for the ezapi client.
#[derive(Debug, Clone)]
pub struct EzApiConfig {
    /// Timeout used when a request does not set one.
    pub default_timeout: Duration,
    /// Query string join style.
    pub query_style: QueryStyle,
    /// Headers sent with every request, overridable per request.
    pub default_headers: Values,
}

impl Default for EzApiConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            query_style: QueryStyle::default(),
            default_headers: Values::new(),
        }
    }
}

impl EzApiConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> EzApiConfigBuilder {
        EzApiConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EZAPI_TIMEOUT` (optional): Default timeout in seconds
    /// - `EZAPI_QUERY_STYLE` (optional): `standard` or `literal`
    pub fn from_env() -> EzApiResult<Self> {
        let mut builder = EzApiConfigBuilder::new();

        if let Ok(timeout_str) = std::env::var("EZAPI_TIMEOUT") {
            let secs = timeout_str.trim().parse::<u64>().map_err(|_| {
                EzApiError::configuration(format!("EZAPI_TIMEOUT is not a number: {}", timeout_str))
            })?;
            builder = builder.default_timeout_secs(secs);
        }

        if let Ok(style) = std::env::var("EZAPI_QUERY_STYLE") {
            builder = builder.query_style(style.parse()?);
        }

        builder.build()
    }
}

/// Builder for `EzApiConfig`.
#[derive(Debug, Default)]
pub struct EzApiConfigBuilder {
    default_timeout: Option<Duration>,
    query_style: Option<QueryStyle>,
    default_headers: Values,
}

impl EzApiConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default timeout.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets the default timeout in seconds.
    pub fn default_timeout_secs(mut self, secs: u64) -> Self {
        self.default_timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Sets the query join style.
    pub fn query_style(mut self, style: QueryStyle) -> Self {
        self.query_style = Some(style);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.add(name, value);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> EzApiResult<EzApiConfig> {
        let default_timeout = self.default_timeout.unwrap_or(DEFAULT_TIMEOUT);
        if default_timeout.is_zero() {
            return Err(EzApiError::configuration("Default timeout must be non-zero"));
        }

        for (name, _) in &self.default_headers {
            if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(EzApiError::configuration(format!(
                    "Invalid default header name '{}'",
                    name
                )));
            }
        }

        Ok(EzApiConfig {
            default_timeout,
            query_style: self.query_style.unwrap_or_default(),
            default_headers: self.default_headers,
        })
    }
}
