//! Mock implementations for testing.
//!
//! Provides a scriptable transport and an in-memory filesystem so the
//! dispatcher can be exercised without network or disk access.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};

use crate::errors::TransportError;
use crate::fs::{FileReader, FileSystem};
use crate::transport::{HttpRequest, HttpTransport, StreamingResponse};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
    /// If set, the body stream fails with this message after the body.
    pub body_error: Option<String>,
}

impl MockResponse {
    /// Creates an empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
            body_error: None,
        }
    }

    /// Creates a response with a text body.
    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status).with_body(body.as_bytes().to_vec())
    }

    /// Sets the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Appends a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Makes the body stream fail after yielding the body.
    pub fn with_body_error(mut self, message: &str) -> Self {
        self.body_error = Some(message.to_string());
        self
    }
}

enum Scripted {
    Response(MockResponse),
    Error(TransportError),
}

/// Decrements the live-body counter when the body stream is dropped.
struct BodyGuard(Arc<AtomicUsize>);

impl Drop for BodyGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock HTTP transport for testing.
#[derive(Default)]
pub struct MockTransport {
    scripted: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
    live_bodies: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.scripted).push_back(Scripted::Response(response));
    }

    /// Queues a transport failure.
    pub fn queue_error(&self, error: TransportError) {
        lock(&self.scripted).push_back(Scripted::Error(error));
    }

    /// Delays every call by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of response body streams handed out and not yet dropped.
    pub fn live_bodies(&self) -> usize {
        self.live_bodies.load(Ordering::SeqCst)
    }

    fn next_scripted(&self) -> Scripted {
        lock(&self.scripted).pop_front().unwrap_or_else(|| {
            Scripted::Response(MockResponse::text(500, "No mock response configured"))
        })
    }

    fn streaming_response(&self, response: MockResponse) -> StreamingResponse {
        self.live_bodies.fetch_add(1, Ordering::SeqCst);
        let guard = BodyGuard(Arc::clone(&self.live_bodies));

        let mut chunks: Vec<Result<Bytes, TransportError>> = Vec::new();
        if !response.body.is_empty() {
            chunks.push(Ok(Bytes::from(response.body)));
        }
        if let Some(message) = response.body_error {
            chunks.push(Err(TransportError::Body { message }));
        }

        let stream = futures::stream::iter(chunks).map(move |chunk| {
            let _held = &guard;
            chunk
        });

        StreamingResponse {
            status: response.status,
            headers: response.headers,
            body: Box::pin(stream),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        lock(&self.requests).push(request);

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_scripted() {
            Scripted::Response(response) => Ok(self.streaming_response(response)),
            Scripted::Error(error) => Err(error),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum MockFile {
    Contents(Vec<u8>),
    Unreadable,
}

/// In-memory filesystem for upload tests.
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: HashMap<String, MockFile>,
    opened: Mutex<Vec<String>>,
}

impl MockFileSystem {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(path.to_string(), MockFile::Contents(contents.into()));
        self
    }

    /// Adds a file that opens but fails on the first read.
    pub fn with_unreadable_file(mut self, path: &str) -> Self {
        self.files.insert(path.to_string(), MockFile::Unreadable);
        self
    }

    /// Paths opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }
}

#[async_trait]
impl FileSystem for MockFileSystem {
    async fn open(&self, path: &str) -> io::Result<FileReader> {
        lock(&self.opened).push(path.to_string());
        match self.files.get(path) {
            Some(MockFile::Contents(bytes)) => Ok(Box::new(io::Cursor::new(bytes.clone()))),
            Some(MockFile::Unreadable) => Ok(Box::new(FailingReader)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file", path),
            )),
        }
    }
}

struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "read denied",
        )))
    }
}
