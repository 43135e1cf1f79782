use std::fmt;

use thiserror::Error;

/// Errors returned by [`TorrentFileStream`](super::TorrentFileStream).
///
/// `Io` comes from the underlying resource and is never a protocol
/// violation; whether to retry it is up to the caller. The other variants
/// are caller bugs.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The rent/release protocol was broken.
    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidState),

    /// The stream was used after [`dispose`](super::TorrentFileStream::dispose).
    #[error("stream has been disposed")]
    Disposed,
}

impl StorageError {
    /// Returns true for errors caused by the caller breaking the rental
    /// protocol rather than by the underlying resource.
    ///
    /// These must never be retried.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::InvalidState(_) | Self::Disposed)
    }
}

/// A rent/release protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidState {
    /// `rent` was called while the stream was already rented.
    #[error("this stream is already in use")]
    AlreadyRented,

    /// `release` was called on a stream that was not rented.
    #[error("this stream has not been rented")]
    NotRented,

    /// A data-moving operation was attempted without a rental.
    #[error("cannot {0} without renting the stream")]
    RentalRequired(Operation),
}

/// The data-moving operations that require an active rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    SetLength,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read from the stream",
            Self::Write => "write to the stream",
            Self::SetLength => "set the stream length",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violation_classification() {
        let io = StorageError::from(std::io::Error::other("disk full"));
        assert!(!io.is_protocol_violation());
        assert!(StorageError::Disposed.is_protocol_violation());
        assert!(StorageError::from(InvalidState::NotRented).is_protocol_violation());
    }

    #[test]
    fn test_rental_required_message() {
        let err = StorageError::from(InvalidState::RentalRequired(Operation::SetLength));
        assert_eq!(
            err.to_string(),
            "invalid state: cannot set the stream length without renting the stream"
        );
    }
}
