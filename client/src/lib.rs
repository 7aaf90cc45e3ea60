//! # Linear Board Client Library
//!
//! A terminal client for the linear board game server. It prints every line
//! the server sends (status messages and board snapshots) and forwards each
//! line typed by the player as a step command.
//!
//! ## Controls
//! - `1` / `2`: move one or two cells right
//! - `-1` / `-2`: move one or two cells left
//! - `0`: ask for the current board
//!
//! Anything else is sent as typed and ignored by the server.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:8080").await?;
//!     let verdict = client.run().await?;
//!     println!("Game over: {:?}", verdict);
//!     Ok(())
//! }
//! ```

pub mod network;
