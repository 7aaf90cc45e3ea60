//! # Linear Board Game Server Library
//!
//! This library implements a small multiplayer game played on a line of cells.
//! Between two and five players connect over TCP, each is placed on a distinct
//! random cell, and they move by up to two cells per command. Walking off the
//! board loses. Moving onto an occupied cell knocks the occupant out. The last
//! player on the board wins, after which the server starts the next game.
//!
//! ## Architecture Design
//!
//! ### One Worker Per Player
//! Every connected player is served by its own tokio task that blocks on the
//! player's socket. Workers of one session share a single [`game::Game`],
//! which owns the board, the per-cell lock tokens and the write half of every
//! player's connection.
//!
//! ### Cell Lock Tokens
//! Each cell has one exclusive token ([`locks::CellLocks`]). Placing a player
//! takes the token, moving releases the old one and tries to claim the new one
//! without blocking. Losing that claim to a player already sitting there means
//! stepping on them.
//!
//! ### Cancelling Other Workers
//! A stepped-on player's worker is blocked reading its socket. The winner of
//! the claim writes the final message to the victim, shuts the victim's stream
//! down and signals the victim's worker, which stops reading and exits.
//!
//! ### Sessions Back To Back
//! The [`network::Server`] accepts exactly `num_players` connections, runs the
//! game until every worker has exited, drops the session state and starts
//! accepting again. A shutdown request stops this loop between sessions but
//! never interrupts a game in progress.
//!
//! ## Module Organization
//!
//! - `allocator`: random distinct starting cells
//! - `board`: cell occupants and player positions
//! - `config`: command line parsing and validation
//! - `error`: fatal error types
//! - `game`: state shared by the workers of one session
//! - `locks`: per-cell lock tokens
//! - `network`: connection acceptance and the session loop
//! - `player`: the per-player worker
//! - `shutdown`: shutdown requests
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use server::shutdown;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Three players on a board of seven cells
//!     let config = ServerConfig::new(8080, 3, 7)?;
//!     let (trigger, shutdown) = shutdown::channel();
//!
//!     let server = Server::bind(config, shutdown).await?;
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         trigger.trigger();
//!     });
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod allocator;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod locks;
pub mod network;
pub mod player;
pub mod shutdown;
