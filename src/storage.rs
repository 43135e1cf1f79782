//! Guarded file streams for torrent disk I/O.
//!
//! A handle cache keeps a [`TorrentFileStream`] per open file. Before moving
//! data through a stream, a caller rents it; when done, it releases it. The
//! rental is a single non-blocking token, so two parts of the engine can
//! never interleave reads and writes on the same cursor without one of them
//! getting an [`InvalidState`] error.
//!
//! # Components
//!
//! - [`TorrentFileStream`] - The guarded stream and its async I/O surface
//! - [`RentalGuard`] - The rent/release state machine
//! - [`StreamResource`] - What a stream needs from its backing object
//! - [`DiskFile`] - A shared, random-access file on disk
//! - [`MemoryFile`] - An in-memory resource for tests and non-file streams
//! - [`StreamOptions`] - How a [`DiskFile`] is opened
//!
//! # Examples
//!
//! ```no_run
//! use rbit_filestream::storage::TorrentFileStream;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TorrentFileStream::open("./downloads/file.bin").await?;
//!
//! stream.rent()?;
//! stream.seek(16384).await?;
//! stream.write(&[0u8; 16384]).await?;
//! stream.release()?;
//!
//! // Evicted from the cache
//! stream.dispose().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Unguarded operations
//!
//! [`TorrentFileStream::seek`] and [`TorrentFileStream::flush`] do not check
//! the rental. A caller that seeks without renting can move the cursor out
//! from under the current renter.
//!
//! # Disposal
//!
//! [`TorrentFileStream::dispose`] is idempotent. After it, every other
//! operation fails with [`StorageError::Disposed`]. Never dispose a stream
//! another task is still using.

mod error;
mod file;
mod options;
mod rental;
mod resource;
mod stream;

pub use error::{InvalidState, Operation, StorageError};
pub use file::DiskFile;
pub use options::{FileAccess, StreamOptions};
pub use rental::{RentalGuard, RentalState};
pub use resource::{MemoryFile, StreamResource};
pub use stream::TorrentFileStream;
