//! Per-cell lock tokens
//!
//! Each board cell carries one exclusive token. A token is either free or
//! owned by exactly one player, and the owner is recorded so that a release by
//! anyone else is caught as misuse instead of silently freeing the cell.
//!
//! Claims go through a compare-and-swap on the owner slot, so `try_acquire`
//! never blocks: two players racing for the same free cell get exactly one
//! `Held` and one `Busy`, in no particular order.

use crate::error::LockError;
use shared::PlayerId;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

const FREE: usize = usize::MAX;

/// Result of a non-blocking claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The token was free and now belongs to the caller.
    Held,
    /// Someone else owns the token.
    Busy,
}

struct CellLock {
    owner: AtomicUsize,
    freed: Notify,
}

pub struct CellLocks {
    cells: Vec<CellLock>,
}

impl CellLocks {
    /// One free token per cell.
    pub fn new(size: usize) -> Self {
        let cells = (0..size)
            .map(|_| CellLock {
                owner: AtomicUsize::new(FREE),
                freed: Notify::new(),
            })
            .collect();
        Self { cells }
    }

    fn cell(&self, cell: usize) -> Result<&CellLock, LockError> {
        self.cells.get(cell).ok_or(LockError::OutOfRange {
            cell,
            size: self.cells.len(),
        })
    }

    /// Waits until the token is free, then takes it.
    pub async fn acquire(&self, cell: usize, player: PlayerId) -> Result<(), LockError> {
        let lock = self.cell(cell)?;
        loop {
            if self.try_acquire(cell, player)? == Claim::Held {
                return Ok(());
            }
            lock.freed.notified().await;
        }
    }

    pub fn try_acquire(&self, cell: usize, player: PlayerId) -> Result<Claim, LockError> {
        let lock = self.cell(cell)?;
        match lock
            .owner
            .compare_exchange(FREE, player, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(Claim::Held),
            Err(_) => Ok(Claim::Busy),
        }
    }

    /// Returns the token to the free state. Only its owner may do so.
    pub fn release(&self, cell: usize, player: PlayerId) -> Result<(), LockError> {
        let lock = self.cell(cell)?;
        lock.owner
            .compare_exchange(player, FREE, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LockError::NotHeld { cell, player })?;
        lock.freed.notify_one();
        Ok(())
    }

    /// Current owner of the token, `None` when free or out of range.
    pub fn owner(&self, cell: usize) -> Option<PlayerId> {
        let owner = self.cells.get(cell)?.owner.load(Ordering::Acquire);
        (owner != FREE).then_some(owner)
    }

    pub fn is_held_by(&self, cell: usize, player: PlayerId) -> bool {
        self.owner(cell) == Some(player)
    }

    /// Number of tokens currently owned by someone.
    pub fn held_count(&self) -> usize {
        (0..self.cells.len())
            .filter(|&cell| self.owner(cell).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_new_tokens_are_free() {
        let locks = CellLocks::new(4);
        assert_eq!(locks.held_count(), 0);
        assert!(matches!(
            locks.try_acquire(4, 0),
            Err(LockError::OutOfRange { cell: 4, size: 4 })
        ));
        assert!((0..4).all(|cell| locks.owner(cell).is_none()));
    }

    #[test]
    fn test_try_acquire_and_release() {
        let locks = CellLocks::new(3);

        assert_eq!(locks.try_acquire(1, 0), Ok(Claim::Held));
        assert_eq!(locks.owner(1), Some(0));
        assert_eq!(locks.try_acquire(1, 2), Ok(Claim::Busy));
        // Owning a token does not make it reentrant.
        assert_eq!(locks.try_acquire(1, 0), Ok(Claim::Busy));

        assert_ok!(locks.release(1, 0));
        assert_eq!(locks.owner(1), None);
        assert_eq!(locks.try_acquire(1, 2), Ok(Claim::Held));
    }

    #[test]
    fn test_release_misuse_is_reported() {
        let locks = CellLocks::new(2);

        assert_eq!(
            locks.release(0, 1),
            Err(LockError::NotHeld { cell: 0, player: 1 })
        );

        assert_ok!(locks.try_acquire(0, 1));
        assert_err!(locks.release(0, 0));
        assert_ok!(locks.release(0, 1));
        // Double release.
        assert_err!(locks.release(0, 1));
    }

    #[test]
    fn test_out_of_range_cells() {
        let locks = CellLocks::new(2);
        assert_eq!(
            locks.try_acquire(2, 0),
            Err(LockError::OutOfRange { cell: 2, size: 2 })
        );
        assert_err!(locks.release(5, 0));
        assert_eq!(locks.owner(9), None);
    }

    #[tokio::test]
    async fn test_acquire_free_token() {
        let locks = CellLocks::new(3);
        assert_ok!(locks.acquire(2, 4).await);
        assert!(locks.is_held_by(2, 4));
        assert_err!(locks.acquire(3, 4).await);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let locks = Arc::new(CellLocks::new(1));
        assert_ok!(locks.try_acquire(0, 0));

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire(0, 1).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        assert_ok!(locks.release(0, 0));
        let result = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("acquire never woke up")
            .unwrap();
        assert_ok!(result);
        assert_eq!(locks.owner(0), Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_have_one_winner() {
        for _ in 0..50 {
            let locks = Arc::new(CellLocks::new(1));
            let mut handles = Vec::new();

            for player in 0..5 {
                let locks = Arc::clone(&locks);
                handles.push(tokio::spawn(async move {
                    locks.try_acquire(0, player).unwrap()
                }));
            }

            let mut held = 0;
            for handle in handles {
                if handle.await.unwrap() == Claim::Held {
                    held += 1;
                }
            }
            assert_eq!(held, 1);
            assert_eq!(locks.held_count(), 1);
        }
    }
}
