//! State shared by the workers of one game session
//!
//! A `Game` owns the board, one lock token per cell and a seat per player. The
//! seat holds the write half of the player's connection so that any worker can
//! deliver a final message to any player and close its stream. It is created
//! by the orchestrator when a session fills up and dropped once every worker
//! has exited.
//!
//! Moves are applied under the board's write guard, which makes every move a
//! single step against a consistent board. Claims on the destination cell are
//! still decided by its lock token.

use crate::board::Board;
use crate::error::{LockError, ServerError};
use crate::locks::{CellLocks, Claim};
use log::{debug, info};
use shared::{Command, PlayerId, ServerMessage};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, Notify, RwLock};

/// Write half of a client connection.
pub type ClientWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// What a single command did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reply with this snapshot.
    Board(String),
    Ignored,
    Moved {
        from: usize,
        to: usize,
        /// Player that sat on `to` and lost the cell.
        stepped_on: Option<PlayerId>,
        /// The mover is the last player on the board.
        won: bool,
    },
    SteppedOut {
        from: usize,
        target: i64,
    },
    /// The player was removed by someone else before its command ran.
    Gone,
}

pub struct Seat {
    writer: Mutex<Option<ClientWriter>>,
    removed: Notify,
}

impl Seat {
    fn new(writer: ClientWriter) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
            removed: Notify::new(),
        }
    }

    /// Writes one protocol message. Failures mean the client is gone and are
    /// left for its reader to notice.
    pub async fn send(&self, message: &ServerMessage) {
        let mut writer = self.writer.lock().await;
        if let Some(stream) = writer.as_mut() {
            let line = message.to_string();
            let result = match stream.write_all(line.as_bytes()).await {
                Ok(()) => stream.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                debug!("Dropping write to departed client: {}", e);
            }
        }
    }

    /// Shuts the write half down. Later sends are no-ops.
    pub async fn close(&self) {
        if let Some(mut stream) = self.writer.lock().await.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Error closing client stream: {}", e);
            }
        }
    }

    /// Resolves once another worker has removed this player from the game.
    pub async fn removed(&self) {
        self.removed.notified().await;
    }
}

pub struct Game {
    board: RwLock<Board>,
    locks: CellLocks,
    seats: Vec<Seat>,
}

impl Game {
    /// Places player `i` on `positions[i]`, taking that cell's token on its
    /// behalf. Positions must be distinct.
    pub async fn setup(
        board_size: usize,
        positions: &[usize],
        writers: Vec<ClientWriter>,
    ) -> Result<Self, ServerError> {
        debug_assert_eq!(positions.len(), writers.len());

        let locks = CellLocks::new(board_size);
        let mut board = Board::new(board_size, positions.len());
        for (player, &cell) in positions.iter().enumerate() {
            locks.acquire(cell, player).await?;
            board.occupy(player, cell);
        }

        Ok(Self {
            board: RwLock::new(board),
            locks,
            seats: writers.into_iter().map(Seat::new).collect(),
        })
    }

    pub fn board(&self) -> &RwLock<Board> {
        &self.board
    }

    pub fn locks(&self) -> &CellLocks {
        &self.locks
    }

    pub fn seat(&self, player: PlayerId) -> &Seat {
        &self.seats[player]
    }

    pub async fn snapshot(&self) -> String {
        self.board.read().await.snapshot()
    }

    pub async fn active_players(&self) -> Vec<PlayerId> {
        self.board.read().await.active_players()
    }

    /// Whether `player` still has a cell.
    pub async fn is_active(&self, player: PlayerId) -> bool {
        self.board.read().await.position(player).is_some()
    }

    pub async fn send(&self, player: PlayerId, message: &ServerMessage) {
        self.seat(player).send(message).await;
    }

    /// Applies `command` for `player` against the board.
    ///
    /// A step first gives up the mover's cell and its token. Leaving the board
    /// takes the mover out of the game. Otherwise the mover claims the target's
    /// token; if it is busy, the current occupant loses the cell and the mover
    /// takes it without holding the token. That token stays with the loser for
    /// the rest of the session.
    pub async fn apply(&self, player: PlayerId, command: Command) -> Result<Outcome, LockError> {
        let mut board = self.board.write().await;
        let Some(from) = board.position(player) else {
            return Ok(Outcome::Gone);
        };

        let step = match command {
            Command::ShowBoard => return Ok(Outcome::Board(board.snapshot())),
            Command::Ignored => return Ok(Outcome::Ignored),
            Command::Step(step) => step,
        };

        board.vacate(player);
        if self.locks.is_held_by(from, player) {
            self.locks.release(from, player)?;
        }

        let target = from as i64 + step;
        if !board.contains(target) {
            return Ok(Outcome::SteppedOut { from, target });
        }
        let to = target as usize;

        // Racing movers are ordered by the write guard held above, not by
        // this claim.
        let stepped_on = match self.locks.try_acquire(to, player)? {
            Claim::Held => None,
            // A busy token over an empty cell was leaked by an earlier
            // step-on, so there is nobody to remove.
            Claim::Busy => board.occupant(to),
        };
        if let Some(victim) = stepped_on {
            board.evict(victim);
        }
        board.occupy(player, to);

        Ok(Outcome::Moved {
            from,
            to,
            stepped_on,
            won: board.occupied_count() == 1,
        })
    }

    /// Takes a disconnected player off the board.
    pub async fn leave(&self, player: PlayerId) -> Result<(), LockError> {
        let mut board = self.board.write().await;
        if let Some(cell) = board.vacate(player) {
            if self.locks.is_held_by(cell, player) {
                self.locks.release(cell, player)?;
            }
            info!("Player {} left cell {}", player, cell);
        }
        Ok(())
    }

    /// Tells `victim` who stepped on it, closes its stream and wakes its
    /// worker so it stops reading.
    pub async fn eliminate(&self, victim: PlayerId, by: PlayerId) {
        let seat = self.seat(victim);
        seat.send(&ServerMessage::SteppedOn { by }).await;
        seat.close().await;
        seat.removed.notify_one();
        info!("Player {} was stepped on by player {}", victim, by);
    }
}
