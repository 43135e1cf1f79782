//! rbit-filestream - Guarded file streams for BitTorrent disk I/O
//!
//! Each [`TorrentFileStream`] wraps one open file and enforces a
//! rent/release protocol around it, so the piece writer, the piece reader
//! and the hash checker can share a handle cache without ever moving data
//! through the same file cursor at the same time.
//!
//! # Modules
//!
//! - [`storage`] - Guarded streams, their backing resources and errors

pub mod storage;

pub use storage::{
    DiskFile, FileAccess, InvalidState, MemoryFile, Operation, RentalGuard, RentalState,
    StorageError, StreamOptions, StreamResource, TorrentFileStream,
};
