//! Session orchestration: accepting players and running games back to back

use crate::allocator::PositionAllocator;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::{ClientWriter, Game};
use crate::player::{PlayerSession, PlayerState};
use crate::shutdown::Shutdown;
use log::{debug, error, info, warn};
use shared::ServerMessage;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinSet;

/// Accepts `num_players` connections at a time and plays one game per batch
/// until shutdown is requested.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    allocator: PositionAllocator,
    shutdown: Shutdown,
    sessions_played: u64,
    /// Players left waiting when shutdown arrived, held open until `run`
    /// returns.
    waiting: Vec<TcpStream>,
}

impl Server {
    pub async fn bind(config: ServerConfig, shutdown: Shutdown) -> Result<Self, ServerError> {
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(config.address())?;
        let listener = socket.listen(config.backlog())?;
        info!(
            "Server listening on {} ({} players, {} cells)",
            listener.local_addr()?,
            config.num_players,
            config.board_size
        );

        let allocator = match config.seed {
            Some(seed) => PositionAllocator::seeded(seed),
            None => PositionAllocator::new(),
        };

        Ok(Server {
            listener,
            config,
            allocator,
            shutdown,
            sessions_played: 0,
            waiting: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main server loop. Returns once shutdown is requested between sessions,
    /// or with the first fatal error.
    pub async fn run(mut self) -> Result<(), ServerError> {
        loop {
            if self.shutdown.is_requested() {
                break;
            }

            let Some(streams) = self.accept_players().await? else {
                break;
            };
            self.run_session(streams).await?;
        }

        info!("Server shutting down after {} sessions", self.sessions_played);
        if !self.waiting.is_empty() {
            info!("Closing {} waiting connections", self.waiting.len());
        }
        Ok(())
    }

    /// Waits for a full table. `None` means shutdown arrived first; the
    /// players accepted so far move to `waiting` without a game.
    async fn accept_players(&mut self) -> Result<Option<Vec<TcpStream>>, ServerError> {
        let mut streams = Vec::with_capacity(self.config.num_players);

        while streams.len() < self.config.num_players {
            if self.shutdown.is_requested() {
                if !streams.is_empty() {
                    info!("Abandoning session with {} waiting players", streams.len());
                }
                self.waiting.append(&mut streams);
                return Ok(None);
            }

            let accepted = tokio::select! {
                result = self.listener.accept() => Some(result),
                _ = self.shutdown.requested() => None,
            };

            match accepted {
                None => continue,
                Some(Ok((mut stream, addr))) => {
                    let player = streams.len();
                    info!("Player {} connected from {}", player, addr);
                    send_line(&mut stream, &ServerMessage::Joined { player }).await;
                    streams.push(stream);
                }
                Some(Err(e)) if is_transient(&e) => {
                    warn!("Retrying accept after transient error: {}", e);
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }

        Ok(Some(streams))
    }

    async fn run_session(&mut self, streams: Vec<TcpStream>) -> Result<(), ServerError> {
        self.sessions_played += 1;
        let session = self.sessions_played;

        let positions = self
            .allocator
            .starting_positions(self.config.board_size, self.config.num_players)?;
        info!("Session {} starting, positions {:?}", session, positions);

        let (readers, writers): (Vec<_>, Vec<ClientWriter>) = streams
            .into_iter()
            .map(|stream| {
                let (reader, writer) = stream.into_split();
                (reader, Box::new(writer) as ClientWriter)
            })
            .unzip();

        let game = Arc::new(Game::setup(self.config.board_size, &positions, writers).await?);
        let states = play_session(game, readers).await?;

        info!("Session {} finished: {:?}", session, states);
        Ok(())
    }
}

/// Runs one worker per reader against `game` and waits for all of them.
///
/// Worker `i` plays as player `i`. A fatal error in any worker aborts the
/// others and is returned.
pub async fn play_session<R>(
    game: Arc<Game>,
    readers: Vec<R>,
) -> Result<Vec<PlayerState>, ServerError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut states = vec![PlayerState::Waiting; readers.len()];
    let mut workers = JoinSet::new();

    for (player, reader) in readers.into_iter().enumerate() {
        let session = PlayerSession::new(player, Arc::clone(&game), reader);
        workers.spawn(async move { (player, session.run().await) });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((player, Ok(state))) => {
                debug!("Player {} finished as {:?}", player, state);
                states[player] = state;
            }
            Ok((player, Err(e))) => {
                error!("Player {} worker failed: {}", player, e);
                workers.shutdown().await;
                return Err(e);
            }
            Err(e) => {
                error!("Player worker panicked: {}", e);
                workers.shutdown().await;
                return Err(ServerError::Worker(e.to_string()));
            }
        }
    }

    debug!("All workers joined, releasing session state");
    Ok(states)
}

async fn send_line(stream: &mut TcpStream, message: &ServerMessage) {
    if let Err(e) = stream.write_all(message.to_string().as_bytes()).await {
        debug!("Dropping write to departed client: {}", e);
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
