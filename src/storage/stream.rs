use std::fmt;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::error::{Operation, StorageError};
use super::file::DiskFile;
use super::options::StreamOptions;
use super::rental::{RentalGuard, RentalState};
use super::resource::StreamResource;

/// A single open file resource guarded by a rent/release protocol.
///
/// [`read`](Self::read), [`write`](Self::write) and
/// [`set_length`](Self::set_length) move or resize data and fail with
/// [`InvalidState`](super::InvalidState) unless the stream is rented.
/// [`seek`](Self::seek) and [`flush`](Self::flush) work whether or not the
/// stream is rented.
///
/// All methods take `&self` so the stream can be shared between the tasks of
/// a handle cache. Renting never waits: a second [`rent`](Self::rent) fails
/// immediately instead of queuing.
///
/// [`length`](Self::length) asks the resource for its current size, so it
/// sees writes made through other handles on the same file. While an
/// operation on this stream is in flight it returns the size recorded after
/// the last completed operation instead. `position` and `can_write` are
/// always such snapshots. None of these queries are synchronized with a
/// concurrent renter.
pub struct TorrentFileStream<R = DiskFile> {
    guard: RentalGuard,
    resource: Mutex<Option<R>>,
    can_write: AtomicBool,
    length: AtomicU64,
    position: AtomicU64,
}

impl TorrentFileStream<DiskFile> {
    /// Opens or creates the file at `path` for shared, random-access
    /// reading and writing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with(path, &StreamOptions::default()).await
    }

    pub async fn open_with(
        path: impl AsRef<Path>,
        options: &StreamOptions,
    ) -> Result<Self, StorageError> {
        let file = DiskFile::open(path, options).await?;
        Self::wrap(file).await
    }
}

impl<R: StreamResource> TorrentFileStream<R> {
    /// Wraps an already-open resource. The stream starts out free.
    pub async fn wrap(mut resource: R) -> Result<Self, StorageError> {
        let length = resource.length()?;
        let position = resource.stream_position().await?;

        Ok(Self {
            guard: RentalGuard::new(),
            can_write: AtomicBool::new(resource.can_write()),
            length: AtomicU64::new(length),
            position: AtomicU64::new(position),
            resource: Mutex::new(Some(resource)),
        })
    }

    pub fn rent(&self) -> Result<(), StorageError> {
        self.guard.rent()
    }

    pub fn release(&self) -> Result<(), StorageError> {
        self.guard.release()
    }

    pub fn state(&self) -> RentalState {
        self.guard.state()
    }

    pub fn is_rented(&self) -> bool {
        self.guard.is_rented()
    }

    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }

    /// Always false once disposed.
    pub fn can_write(&self) -> bool {
        self.can_write.load(Ordering::Acquire)
    }

    /// The current length of the resource.
    ///
    /// Falls back to the last recorded length when another operation holds
    /// the resource or the stream has been disposed.
    pub fn length(&self) -> Result<u64, StorageError> {
        let Ok(slot) = self.resource.try_lock() else {
            return Ok(self.length.load(Ordering::Acquire));
        };
        match slot.as_ref() {
            Some(resource) => {
                let length = resource.length()?;
                self.length.store(length, Ordering::Release);
                Ok(length)
            }
            None => Ok(self.length.load(Ordering::Acquire)),
        }
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Acquire)
    }

    /// Reads into `buf` from the current position.
    ///
    /// Returns the number of bytes read, which may be less than `buf.len()`
    /// and is zero at end of file.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.guard.require_rented(Operation::Read)?;

        let mut slot = self.resource.lock().await;
        let resource = slot.as_mut().ok_or(StorageError::Disposed)?;

        match resource.read(buf).await {
            Ok(n) => {
                self.position.fetch_add(n as u64, Ordering::AcqRel);
                Ok(n)
            }
            Err(e) => {
                self.resync(resource).await;
                Err(e.into())
            }
        }
    }

    /// Writes all of `buf` at the current position.
    ///
    /// Returns once the resource has accepted the data. That does not
    /// mean it has reached the disk.
    pub async fn write(&self, buf: &[u8]) -> Result<(), StorageError> {
        self.guard.require_rented(Operation::Write)?;

        let mut slot = self.resource.lock().await;
        let resource = slot.as_mut().ok_or(StorageError::Disposed)?;

        if let Err(e) = write_acknowledged(resource, buf).await {
            self.resync(resource).await;
            return Err(e.into());
        }

        let written = buf.len() as u64;
        let end = self.position.fetch_add(written, Ordering::AcqRel) + written;
        self.length.fetch_max(end, Ordering::AcqRel);
        Ok(())
    }

    /// Truncates or extends the resource to `len` bytes.
    ///
    /// Whether an extension is zero-filled or sparse is up to the resource.
    pub async fn set_length(&self, len: u64) -> Result<(), StorageError> {
        self.guard.require_rented(Operation::SetLength)?;

        let mut slot = self.resource.lock().await;
        let resource = slot.as_mut().ok_or(StorageError::Disposed)?;

        resource.set_length(len).await?;
        self.length.store(len, Ordering::Release);
        Ok(())
    }

    /// Moves the cursor to `position` bytes from the start.
    ///
    /// Does not require a rental.
    pub async fn seek(&self, position: u64) -> Result<u64, StorageError> {
        self.guard.ensure_not_disposed()?;

        let mut slot = self.resource.lock().await;
        let resource = slot.as_mut().ok_or(StorageError::Disposed)?;

        let position = resource.seek(SeekFrom::Start(position)).await?;
        self.position.store(position, Ordering::Release);
        Ok(position)
    }

    /// Pushes buffered writes down to the resource.
    ///
    /// Does not require a rental.
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.guard.ensure_not_disposed()?;

        let mut slot = self.resource.lock().await;
        let resource = slot.as_mut().ok_or(StorageError::Disposed)?;

        resource.flush().await?;
        Ok(())
    }

    /// Closes the underlying resource.
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    /// Every other operation on a disposed stream fails with
    /// [`StorageError::Disposed`]. An operation already holding the
    /// resource is allowed to finish before it is closed.
    ///
    /// The stream counts as disposed even if the final flush fails.
    pub async fn dispose(&self) -> Result<(), StorageError> {
        let previous = self.guard.dispose();
        if previous == RentalState::Disposed {
            return Ok(());
        }
        self.can_write.store(false, Ordering::Release);

        let Some(mut resource) = self.resource.lock().await.take() else {
            return Ok(());
        };

        tracing::trace!(
            rented = previous == RentalState::Rented,
            length = self.length.load(Ordering::Relaxed),
            "disposing torrent file stream"
        );

        resource.shutdown().await?;
        Ok(())
    }

    /// Re-reads the cursor and length after a failed operation left them
    /// unknown.
    async fn resync(&self, resource: &mut R) {
        if let Ok(position) = resource.stream_position().await {
            self.position.store(position, Ordering::Release);
        }
        if let Ok(length) = resource.length() {
            self.length.store(length, Ordering::Release);
        }
    }
}

async fn write_acknowledged<R: StreamResource>(
    resource: &mut R,
    buf: &[u8],
) -> std::io::Result<()> {
    resource.write_all(buf).await?;
    resource.flush().await
}

impl<R> fmt::Debug for TorrentFileStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TorrentFileStream")
            .field("state", &self.guard.state())
            .field("can_write", &self.can_write.load(Ordering::Relaxed))
            .field("length", &self.length.load(Ordering::Relaxed))
            .field("position", &self.position.load(Ordering::Relaxed))
            .finish()
    }
}
