use std::future::Future;
use std::io::{self, Cursor, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};

/// The capabilities a [`TorrentFileStream`](super::TorrentFileStream) needs
/// from the object it wraps.
///
/// Implemented by [`DiskFile`](super::DiskFile) for real files and by
/// [`MemoryFile`] for in-memory streams.
pub trait StreamResource: AsyncRead + AsyncWrite + AsyncSeek + Unpin + Send {
    /// Whether writes to this resource can succeed.
    fn can_write(&self) -> bool;

    /// The current length of the resource in bytes, as the resource itself
    /// reports it right now.
    fn length(&self) -> io::Result<u64>;

    /// Truncates or extends the resource. The cursor is left where it is.
    fn set_length(&mut self, len: u64) -> impl Future<Output = io::Result<()>> + Send;
}

fn read_only_error() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "stream is read-only")
}

/// An in-memory resource backed by a growable byte vector.
#[derive(Debug)]
pub struct MemoryFile {
    cursor: Cursor<Vec<u8>>,
    writable: bool,
}

impl MemoryFile {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
            writable: true,
        }
    }

    /// Creates a resource that rejects writes and resizes.
    pub fn read_only(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
            writable: false,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Default for MemoryFile {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamResource for MemoryFile {
    fn can_write(&self) -> bool {
        self.writable
    }

    fn length(&self) -> io::Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }

    async fn set_length(&mut self, len: u64) -> io::Result<()> {
        if !self.writable {
            return Err(read_only_error());
        }
        let len = usize::try_from(len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "length exceeds addressable memory",
            )
        })?;
        self.cursor.get_mut().resize(len, 0);
        Ok(())
    }
}

impl AsyncRead for MemoryFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.cursor).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryFile {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if !self.writable {
            return Poll::Ready(Err(read_only_error()));
        }
        Pin::new(&mut self.cursor).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.cursor).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.cursor).poll_shutdown(cx)
    }
}

impl AsyncSeek for MemoryFile {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.cursor).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.cursor).poll_complete(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_memory_file_write_past_end_zero_fills() {
        let mut file = MemoryFile::new();
        file.seek(SeekFrom::Start(4)).await.unwrap();
        file.write_all(&[9, 9]).await.unwrap();

        assert_eq!(file.as_slice(), &[0, 0, 0, 0, 9, 9]);
        assert_eq!(file.length().unwrap(), 6);
    }

    #[tokio::test]
    async fn test_memory_file_set_length_keeps_cursor() {
        let mut file = MemoryFile::from_vec(vec![1, 2, 3, 4]);
        file.seek(SeekFrom::Start(3)).await.unwrap();

        file.set_length(2).await.unwrap();
        assert_eq!(file.as_slice(), &[1, 2]);
        assert_eq!(file.stream_position().await.unwrap(), 3);

        let mut buf = [0u8; 4];
        assert_eq!(file.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_only_memory_file() {
        let mut file = MemoryFile::read_only(vec![1, 2, 3]);
        assert!(!file.can_write());

        let err = file.write_all(&[4]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let err = file.set_length(0).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        assert_eq!(file.into_inner(), vec![1, 2, 3]);
    }
}
