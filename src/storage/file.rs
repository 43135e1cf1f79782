use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};

use super::options::StreamOptions;
use super::resource::StreamResource;

/// A file on disk, opened in shared mode for random access.
#[derive(Debug)]
pub struct DiskFile {
    file: File,
    /// Duplicate descriptor for synchronous metadata queries.
    meta: std::fs::File,
    writable: bool,
}

impl DiskFile {
    /// Opens (or, when writable, creates) the file at `path`.
    ///
    /// An existing file is never truncated.
    pub async fn open(path: impl AsRef<Path>, options: &StreamOptions) -> io::Result<Self> {
        let path = path.as_ref();
        let writable = options.access.is_writable();

        if options.create_parent_dirs {
            ensure_parent_dirs(path).await?;
        }

        let mut opts = OpenOptions::new();
        opts.read(true)
            .write(writable)
            .create(writable)
            .truncate(false);

        #[cfg(windows)]
        {
            use windows_sys::Win32::Storage::FileSystem::{
                FILE_FLAG_RANDOM_ACCESS, FILE_SHARE_READ, FILE_SHARE_WRITE,
            };
            opts.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE);
            if options.random_access {
                opts.custom_flags(FILE_FLAG_RANDOM_ACCESS);
            }
        }

        let file = opts.open(path).await?;

        #[cfg(any(target_os = "linux", target_os = "android"))]
        if options.random_access {
            advise_random(&file, path);
        }

        tracing::trace!(path = %path.display(), writable, "opened torrent file");

        Self::from_file(file, writable).await
    }

    /// Wraps a file that was opened elsewhere.
    ///
    /// `writable` must match how `file` was opened.
    pub async fn from_file(file: File, writable: bool) -> io::Result<Self> {
        let meta = file.try_clone().await?.into_std().await;
        Ok(Self {
            file,
            meta,
            writable,
        })
    }
}

async fn ensure_parent_dirs(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Tells the kernel not to read ahead. Failure only costs performance.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn advise_random(file: &File, path: &Path) {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file`, which outlives the call.
    let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_RANDOM) };
    if ret != 0 {
        tracing::trace!(
            path = %path.display(),
            error = %io::Error::from_raw_os_error(ret),
            "random access hint rejected"
        );
    }
}

impl StreamResource for DiskFile {
    fn can_write(&self) -> bool {
        self.writable
    }

    fn length(&self) -> io::Result<u64> {
        Ok(self.meta.metadata()?.len())
    }

    async fn set_length(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len).await
    }
}

impl AsyncRead for DiskFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl AsyncWrite for DiskFile {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.file).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_shutdown(cx)
    }
}

impl AsyncSeek for DiskFile {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.file).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.file).poll_complete(cx)
    }
}
