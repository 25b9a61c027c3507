//! `multipart/form-data` body encoder.
//!
//! Serializes text fields and upload files into one buffered body. The wire
//! layout matches the common form-data writer byte for byte: CRLF line
//! endings, a `Content-Disposition` header per part, and a `--` suffixed
//! closing delimiter.

use bytes::Bytes;
use rand::Rng;
use tracing::debug;

use crate::errors::{EzApiError, EzApiResult};
use crate::fs::FileSystem;
use crate::types::Values;

const MAX_BOUNDARY_LEN: usize = 70;

/// An encoded multipart body and its `Content-Type` header value.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    /// `multipart/form-data; boundary=...`
    pub content_type: String,
    /// Encoded body.
    pub body: Bytes,
}

/// Encoder for `multipart/form-data` bodies.
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    boundary: String,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartEncoder {
    /// Creates an encoder with a fresh random boundary.
    pub fn new() -> Self {
        Self {
            boundary: generate_boundary(),
        }
    }

    /// Creates an encoder with a fixed boundary.
    ///
    /// The boundary must be 1 to 70 characters from the RFC 2046 boundary
    /// alphabet and must not end in a space.
    pub fn with_boundary(boundary: impl Into<String>) -> EzApiResult<Self> {
        let boundary = boundary.into();
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
            return Err(EzApiError::Encoding {
                message: format!("Boundary length must be 1..={}", MAX_BOUNDARY_LEN),
            });
        }
        if boundary.ends_with(' ') || !boundary.chars().all(is_boundary_char) {
            return Err(EzApiError::Encoding {
                message: format!("Invalid boundary {:?}", boundary),
            });
        }
        Ok(Self { boundary })
    }

    /// Returns the boundary.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the `Content-Type` header value for this boundary.
    pub fn content_type(&self) -> String {
        let needs_quotes = self
            .boundary
            .chars()
            .any(|c| "()<>@,;:\\\"/[]?= ".contains(c));
        if needs_quotes {
            format!("multipart/form-data; boundary=\"{}\"", self.boundary)
        } else {
            format!("multipart/form-data; boundary={}", self.boundary)
        }
    }

    /// Encodes text fields and upload files.
    ///
    /// Each value of a field becomes its own part, in list order. Each file
    /// becomes one part whose field name and filename are both the path
    /// string. The first file that cannot be opened or read aborts encoding.
    pub async fn encode(
        &self,
        fields: &Values,
        paths: &[String],
        fs: &dyn FileSystem,
    ) -> EzApiResult<MultipartBody> {
        let mut writer = PartWriter::new(&self.boundary);

        for (name, value) in fields.pairs() {
            writer.begin_part(&[format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quotes(name)
            )]);
            writer.buf.extend_from_slice(value.as_bytes());
        }

        for path in paths {
            let escaped = escape_quotes(path);
            writer.begin_part(&[
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                    escaped, escaped
                ),
                format!("Content-Type: {}", mime::APPLICATION_OCTET_STREAM),
            ]);

            let upload_error = |source| EzApiError::Upload {
                path: path.clone(),
                source,
            };
            let mut file = fs.open(path).await.map_err(upload_error)?;
            let copied = tokio::io::copy(&mut file, &mut writer.buf)
                .await
                .map_err(upload_error)?;

            debug!(path = %path, bytes = copied, "Encoded upload part");
        }

        Ok(MultipartBody {
            content_type: self.content_type(),
            body: writer.finish(),
        })
    }
}

struct PartWriter<'a> {
    boundary: &'a str,
    buf: Vec<u8>,
    parts: usize,
}

impl<'a> PartWriter<'a> {
    fn new(boundary: &'a str) -> Self {
        Self {
            boundary,
            buf: Vec::new(),
            parts: 0,
        }
    }

    fn begin_part(&mut self, headers: &[String]) {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        for header in headers {
            self.buf.extend_from_slice(header.as_bytes());
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"\r\n");
        self.parts += 1;
    }

    fn finish(mut self) -> Bytes {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"--\r\n");
        Bytes::from(self.buf)
    }
}

fn generate_boundary() -> String {
    let bytes: [u8; 30] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c)
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
