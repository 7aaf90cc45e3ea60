//! Error types for the game server
//!
//! Errors fall into two groups. Misuse of the cell lock manager or the
//! position allocator breaks an internal invariant and is fatal for the whole
//! server. I/O failures on a single client connection never surface here:
//! they end that player's worker and nothing else.

use std::fmt;
use std::io;

/// Misuse of the per-cell lock tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The caller tried to release a token it does not hold.
    NotHeld { cell: usize, player: usize },
    /// The cell index lies outside the board.
    OutOfRange { cell: usize, size: usize },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::NotHeld { cell, player } => {
                write!(f, "player {} released cell {} it does not hold", player, cell)
            }
            LockError::OutOfRange { cell, size } => {
                write!(f, "cell {} outside board of {} cells", cell, size)
            }
        }
    }
}

impl std::error::Error for LockError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocatorError {
    /// A draw was requested after every position had been handed out.
    PoolExhausted,
}

impl fmt::Display for AllocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocatorError::PoolExhausted => write!(f, "position pool exhausted"),
        }
    }
}

impl std::error::Error for AllocatorError {}

/// Unrecoverable server failure.
#[derive(Debug)]
pub enum ServerError {
    Io(io::Error),
    Lock(LockError),
    Allocator(AllocatorError),
    /// A player worker panicked or was torn down unexpectedly.
    Worker(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
            ServerError::Lock(e) => write!(f, "cell lock failure: {}", e),
            ServerError::Allocator(e) => write!(f, "position allocator failure: {}", e),
            ServerError::Worker(reason) => write!(f, "player worker failed: {}", reason),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Io(e) => Some(e),
            ServerError::Lock(e) => Some(e),
            ServerError::Allocator(e) => Some(e),
            ServerError::Worker(_) => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        ServerError::Io(e)
    }
}

impl From<LockError> for ServerError {
    fn from(e: LockError) -> Self {
        ServerError::Lock(e)
    }
}

impl From<AllocatorError> for ServerError {
    fn from(e: AllocatorError) -> Self {
        ServerError::Allocator(e)
    }
}
