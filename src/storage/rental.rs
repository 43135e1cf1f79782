//! The rent/release gate guarding a single stream.
//!
//! A [`RentalGuard`] is a binary token: whoever rents it may move data
//! through the stream until they release it. The guard records no owner
//! identity and never waits. A failed [`rent`](RentalGuard::rent) returns
//! immediately and it is up to the caller to retry or give up.

use std::sync::atomic::{AtomicU8, Ordering};

use super::error::{InvalidState, Operation, StorageError};

const FREE: u8 = 0;
const RENTED: u8 = 1;
const DISPOSED: u8 = 2;

/// Observable state of a [`RentalGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RentalState {
    #[default]
    Free,
    Rented,
    /// Terminal. Reached by disposing the stream.
    Disposed,
}

impl RentalState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            FREE => Self::Free,
            RENTED => Self::Rented,
            _ => Self::Disposed,
        }
    }
}

#[derive(Debug, Default)]
pub struct RentalGuard {
    state: AtomicU8,
}

impl RentalGuard {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(FREE),
        }
    }

    pub fn state(&self) -> RentalState {
        RentalState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_rented(&self) -> bool {
        self.state() == RentalState::Rented
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == RentalState::Disposed
    }

    /// Moves the guard from free to rented.
    ///
    /// Exactly one of any number of concurrent callers succeeds.
    pub fn rent(&self) -> Result<(), StorageError> {
        match self
            .state
            .compare_exchange(FREE, RENTED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(RENTED) => Err(InvalidState::AlreadyRented.into()),
            Err(_) => Err(StorageError::Disposed),
        }
    }

    /// Moves the guard from rented back to free.
    pub fn release(&self) -> Result<(), StorageError> {
        match self
            .state
            .compare_exchange(RENTED, FREE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(FREE) => Err(InvalidState::NotRented.into()),
            Err(_) => Err(StorageError::Disposed),
        }
    }

    /// Fails unless the guard is currently rented.
    pub(super) fn require_rented(&self, op: Operation) -> Result<(), StorageError> {
        match self.state() {
            RentalState::Rented => Ok(()),
            RentalState::Free => Err(InvalidState::RentalRequired(op).into()),
            RentalState::Disposed => Err(StorageError::Disposed),
        }
    }

    pub(super) fn ensure_not_disposed(&self) -> Result<(), StorageError> {
        if self.is_disposed() {
            return Err(StorageError::Disposed);
        }
        Ok(())
    }

    /// Marks the guard disposed and returns the state it was in before.
    ///
    /// Disposal is terminal and overrides an outstanding rental.
    pub(super) fn dispose(&self) -> RentalState {
        RentalState::from_raw(self.state.swap(DISPOSED, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rent_and_release() {
        let guard = RentalGuard::new();
        assert_eq!(guard.state(), RentalState::Free);

        guard.rent().unwrap();
        assert!(guard.is_rented());

        guard.release().unwrap();
        assert_eq!(guard.state(), RentalState::Free);
    }

    #[test]
    fn test_double_rent_fails() {
        let guard = RentalGuard::new();
        guard.rent().unwrap();

        let err = guard.rent().unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidState(InvalidState::AlreadyRented)
        ));
        assert!(guard.is_rented());
    }

    #[test]
    fn test_release_when_free_fails() {
        let guard = RentalGuard::new();

        let err = guard.release().unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidState(InvalidState::NotRented)
        ));
        assert_eq!(guard.state(), RentalState::Free);
    }

    #[test]
    fn test_require_rented() {
        let guard = RentalGuard::new();
        let err = guard.require_rented(Operation::Write).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidState(InvalidState::RentalRequired(Operation::Write))
        ));

        guard.rent().unwrap();
        assert!(guard.require_rented(Operation::Write).is_ok());
    }

    #[test]
    fn test_dispose_is_terminal() {
        let guard = RentalGuard::new();
        guard.rent().unwrap();

        assert_eq!(guard.dispose(), RentalState::Rented);
        assert_eq!(guard.dispose(), RentalState::Disposed);

        assert!(matches!(guard.rent(), Err(StorageError::Disposed)));
        assert!(matches!(guard.release(), Err(StorageError::Disposed)));
        assert!(matches!(
            guard.require_rented(Operation::Read),
            Err(StorageError::Disposed)
        ));
        assert!(guard.ensure_not_disposed().is_err());
    }

    #[test]
    fn test_concurrent_rent_has_one_winner() {
        let guard = Arc::new(RentalGuard::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    guard.rent().is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
