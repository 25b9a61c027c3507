//! Error types for the ezapi client.
//!
//! Covers the four failure classes of a dispatch: usage errors raised before
//! any I/O, upload/encoding errors raised while the body is assembled,
//! transport errors passed through from the HTTP layer, and deadline expiry.
//! Non-2xx status codes are never errors; they are returned as data.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ezapi operations.
pub type EzApiResult<T> = Result<T, EzApiError>;

/// Error type for request assembly and dispatch.
#[derive(Debug, Error)]
pub enum EzApiError {
    /// Dispatch was called with an empty method.
    #[error("No method")]
    MissingMethod,

    /// Dispatch was called before a URL was set.
    #[error("No URL")]
    MissingUrl,

    /// The method is not a valid HTTP token.
    #[error("Invalid method: {method:?}")]
    InvalidMethod {
        /// The rejected method string.
        method: String,
    },

    /// A configured header name or value cannot be sent.
    #[error("Invalid header {name:?}: {message}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// An upload file could not be opened or read.
    #[error("Upload of {path:?} failed: {source}")]
    Upload {
        /// The path as passed to `upload`.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The request body could not be encoded.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Error message.
        message: String,
    },

    /// The transport failed; the error is passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The deadline elapsed before the transport completed.
    #[error("Deadline exceeded after {timeout:?}")]
    Timeout {
        /// The effective timeout of the dispatch.
        timeout: Duration,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl EzApiError {
    /// Returns true for errors detected before any I/O took place.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            EzApiError::MissingMethod
                | EzApiError::MissingUrl
                | EzApiError::InvalidMethod { .. }
                | EzApiError::InvalidHeader { .. }
        )
    }

    /// Returns true if the dispatch deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EzApiError::Timeout { .. })
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        EzApiError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_header(name: &str, message: impl ToString) -> Self {
        EzApiError::InvalidHeader {
            name: name.to_string(),
            message: message.to_string(),
        }
    }
}

/// Transport error types.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout enforced by the transport itself.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// The request could not be built by the transport.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// Reading the response body failed.
    #[error("Body error: {message}")]
    Body {
        /// Error message.
        message: String,
    },
}

impl TransportError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout: timeout.unwrap_or_default(),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::InvalidRequest {
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body {
                message: err.to_string(),
            }
        } else {
            TransportError::InvalidResponse {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors() {
        assert!(EzApiError::MissingMethod.is_usage_error());
        assert!(EzApiError::MissingUrl.is_usage_error());
        assert!(EzApiError::invalid_header("x y", "bad name").is_usage_error());

        assert!(!EzApiError::Timeout {
            timeout: Duration::from_secs(1)
        }
        .is_usage_error());
        assert!(!EzApiError::Transport(TransportError::Connection {
            message: "refused".to_string()
        })
        .is_usage_error());
    }

    #[test]
    fn test_is_timeout() {
        assert!(EzApiError::Timeout {
            timeout: Duration::from_secs(10)
        }
        .is_timeout());

        // A transport-side timeout is passed through, not re-labelled.
        assert!(!EzApiError::Transport(TransportError::Timeout {
            timeout: Duration::from_secs(10)
        })
        .is_timeout());
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err = EzApiError::from(TransportError::Connection {
            message: "connection refused".to_string(),
        });
        assert_eq!(err.to_string(), "Connection error: connection refused");
    }

    #[test]
    fn test_reqwest_builder_error_maps_to_invalid_request() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        assert!(err.is_builder());

        let mapped = TransportError::from_reqwest(err, None);
        assert!(matches!(mapped, TransportError::InvalidRequest { .. }));
    }

    #[test]
    fn test_upload_error_keeps_source() {
        let err = EzApiError::Upload {
            path: "/tmp/missing".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/missing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
