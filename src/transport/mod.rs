//! HTTP transport layer.
//!
//! The dispatcher hands a fully assembled [`HttpRequest`] to an
//! [`HttpTransport`] and receives the status, headers and a body stream.
//! Retries, pooling, TLS and redirects are the transport's own business.

mod http;

pub use self::http::{
    ByteStream, HttpRequest, HttpTransport, ReqwestTransport, StreamingResponse,
};
pub use crate::errors::TransportError;
