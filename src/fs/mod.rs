//! Filesystem access for upload files.

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncRead;

/// Readable handle to an opened upload file. Dropping it closes the file.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Opens upload files by path.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Opens `path` for reading.
    async fn open(&self, path: &str) -> io::Result<FileReader>;
}

/// Local filesystem backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn open(&self, path: &str) -> io::Result<FileReader> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::new(file))
    }
}
