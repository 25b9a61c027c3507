//! ezapi Client Library
//!
//! A fluent builder for one outbound HTTP request. Raw bytes, JSON,
//! URL-encoded forms and multipart uploads all go through the same call
//! sequence: configure the builder, then `send` it with a method.
//!
//! # Features
//!
//! - **One body per request**: raw > JSON > URL-encoded form > multipart,
//!   and `GET` never carries a body
//! - **Multipart uploads**: text fields and files streamed into a
//!   `multipart/form-data` body with a fresh boundary
//! - **Deadlines**: every dispatch is bounded by its timeout (10s default)
//! - **Status as data**: non-2xx responses are returned, not raised
//! - **Pluggable collaborators**: swap the HTTP transport or the upload
//!   filesystem, with mocks for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ezapi_client::{EzApiClient, Values};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EzApiClient::new()?;
//!
//!     let response = client
//!         .request()
//!         .url("https://httpbin.org/get")
//!         .query(&Values::from([("q", "rust")]))
//!         .send("GET")
//!         .await?;
//!
//!     println!("{}: {}", response.status, response.text());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;
pub mod fs;
pub mod multipart;
pub mod observability;
pub mod request;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{EzApiClient, EzApiClientBuilder};
pub use config::{EzApiConfig, QueryStyle, DEFAULT_TIMEOUT};
pub use errors::{EzApiError, EzApiResult, TransportError};
pub use request::{BodyEncoding, RequestBuilder};
pub use types::{Response, Values};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
