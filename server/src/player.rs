//! One worker per connected player
//!
//! A `PlayerSession` reads step commands from its client, applies them to the
//! shared `Game` and reports the result. It ends when the player wins, loses,
//! disconnects, or is stepped on by another worker. In the last case the other
//! worker has already written the final message and closed the stream; this
//! worker only has to stop reading.

use crate::error::ServerError;
use crate::game::{Game, Outcome};
use log::{debug, info};
use shared::{Command, PlayerId, ServerMessage};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Longest command line kept, newline included. Longer lines are skipped
/// whole.
pub const MAX_LINE_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Connected, session not started yet.
    Waiting,
    Active,
    Eliminated,
    Won,
    Disconnected,
}

impl PlayerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerState::Eliminated | PlayerState::Won | PlayerState::Disconnected
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    TooLong,
    Closed,
}

/// Splits client input into lines of at most `MAX_LINE_LEN` bytes.
///
/// Bytes are decoded lossily, so junk input still reaches the command parser
/// instead of failing the read. Partial lines live in `buf`, which keeps
/// `next` safe to cancel inside `select!`.
struct CommandReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    overflowed: bool,
}

impl<R> CommandReader<R>
where
    R: AsyncRead + Unpin,
{
    fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::with_capacity(MAX_LINE_LEN),
            overflowed: false,
        }
    }

    async fn next(&mut self) -> io::Result<Input> {
        loop {
            let room = (MAX_LINE_LEN - self.buf.len()) as u64;
            let read = AsyncReadExt::take(&mut self.reader, room)
                .read_until(b'\n', &mut self.buf)
                .await?;

            if self.buf.last() == Some(&b'\n') {
                let line = std::mem::take(&mut self.buf);
                if std::mem::take(&mut self.overflowed) {
                    return Ok(Input::TooLong);
                }
                return Ok(Input::Line(String::from_utf8_lossy(&line).into_owned()));
            }
            if read == 0 {
                return Ok(Input::Closed);
            }
            if self.buf.len() >= MAX_LINE_LEN {
                self.buf.clear();
                self.overflowed = true;
            }
        }
    }
}

enum Event {
    Removed,
    Input(io::Result<Input>),
}

pub struct PlayerSession<R> {
    id: PlayerId,
    game: Arc<Game>,
    input: CommandReader<R>,
    state: PlayerState,
}

impl<R> PlayerSession<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(id: PlayerId, game: Arc<Game>, reader: R) -> Self {
        Self {
            id,
            game,
            input: CommandReader::new(reader),
            state: PlayerState::Waiting,
        }
    }

    /// Plays until a terminal state. Only lock misuse is returned as an error.
    pub async fn run(mut self) -> Result<PlayerState, ServerError> {
        self.state = PlayerState::Active;
        self.game.send(self.id, &ServerMessage::GameStarted).await;
        let snapshot = self.game.snapshot().await;
        self.game.send(self.id, &ServerMessage::Board(snapshot)).await;

        while !self.state.is_terminal() {
            let game = Arc::clone(&self.game);
            // A removal wins over whatever the victim's client did after it.
            let event = tokio::select! {
                biased;
                _ = game.seat(self.id).removed() => Event::Removed,
                input = self.input.next() => Event::Input(input),
            };

            match event {
                Event::Removed => self.state = PlayerState::Eliminated,
                Event::Input(Ok(Input::Line(line))) => self.handle_line(&line).await?,
                Event::Input(Ok(Input::TooLong)) => {
                    debug!("Player {} sent an overlong line", self.id);
                }
                Event::Input(Ok(Input::Closed)) => self.disconnect().await?,
                Event::Input(Err(e)) => {
                    debug!("Read from player {} failed: {}", self.id, e);
                    self.disconnect().await?;
                }
            }
        }

        debug!("Player {} worker finished as {:?}", self.id, self.state);
        Ok(self.state)
    }

    async fn handle_line(&mut self, line: &str) -> Result<(), ServerError> {
        let command = Command::parse(line);
        match self.game.apply(self.id, command).await? {
            Outcome::Board(snapshot) => {
                self.game.send(self.id, &ServerMessage::Board(snapshot)).await;
            }
            Outcome::Ignored => {
                debug!("Player {} sent unusable command {:?}", self.id, line.trim());
            }
            Outcome::Gone => {
                self.state = PlayerState::Eliminated;
            }
            Outcome::SteppedOut { from, target } => {
                info!(
                    "Player {} stepped out of the board ({} -> {})",
                    self.id, from, target
                );
                self.finish(ServerMessage::SteppedOut, PlayerState::Eliminated)
                    .await;
            }
            Outcome::Moved {
                from,
                to,
                stepped_on,
                won,
            } => {
                info!("Player {} moved {} -> {}", self.id, from, to);
                if let Some(victim) = stepped_on {
                    self.game.eliminate(victim, self.id).await;
                }
                if won {
                    info!("Player {} has won", self.id);
                    self.finish(ServerMessage::Won, PlayerState::Won).await;
                }
            }
        }
        Ok(())
    }

    async fn finish(&mut self, message: ServerMessage, state: PlayerState) {
        let seat = self.game.seat(self.id);
        seat.send(&message).await;
        seat.close().await;
        self.state = state;
    }

    async fn disconnect(&mut self) -> Result<(), ServerError> {
        if !self.game.is_active(self.id).await {
            // Stepped on, and the client hung up before the signal arrived.
            self.state = PlayerState::Eliminated;
            return Ok(());
        }
        info!("Player {} disconnected", self.id);
        self.game.leave(self.id).await?;
        self.game.seat(self.id).close().await;
        self.state = PlayerState::Disconnected;
        Ok(())
    }
}
