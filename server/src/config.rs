//! Command line arguments and validated server settings

use clap::Parser;
use shared::{valid_dimensions, MAX_CELLS_PER_PLAYER, MAX_PLAYERS, MIN_PLAYERS};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

#[derive(Parser, Debug)]
#[command(name = "server", author, version, about = "Linear board game server")]
pub struct Args {
    /// TCP port to listen on (loopback only)
    pub port: u16,

    /// Players per game session (2-5)
    pub num_players: usize,

    /// Number of board cells (num_players up to 5 * num_players)
    pub board_size: usize,

    /// Seed for reproducible starting positions
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    PlayerCount(usize),
    BoardSize { board_size: usize, num_players: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PlayerCount(n) => write!(
                f,
                "num_players must be between {} and {}, got {}",
                MIN_PLAYERS, MAX_PLAYERS, n
            ),
            ConfigError::BoardSize {
                board_size,
                num_players,
            } => write!(
                f,
                "board_size must be between {} and {} for {} players, got {}",
                num_players,
                MAX_CELLS_PER_PLAYER * num_players,
                num_players,
                board_size
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub num_players: usize,
    pub board_size: usize,
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn new(port: u16, num_players: usize, board_size: usize) -> Result<Self, ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(ConfigError::PlayerCount(num_players));
        }
        if !valid_dimensions(num_players, board_size) {
            return Err(ConfigError::BoardSize {
                board_size,
                num_players,
            });
        }

        Ok(Self {
            port,
            num_players,
            board_size,
            seed: None,
        })
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Loopback address the listener binds to.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, self.port))
    }

    /// Listen backlog, large enough for a full session.
    pub fn backlog(&self) -> u32 {
        self.num_players.max(MAX_PLAYERS) as u32
    }
}

impl TryFrom<Args> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        Ok(ServerConfig::new(args.port, args.num_players, args.board_size)?.with_seed(args.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_valid_configs() {
        let config = assert_ok!(ServerConfig::new(8080, 2, 2));
        assert_eq!(config.address().to_string(), "127.0.0.1:8080");
        assert_eq!(config.backlog(), 5);

        assert_ok!(ServerConfig::new(0, 5, 25));
        assert_ok!(ServerConfig::new(9000, 3, 15));
    }

    #[test]
    fn test_player_count_bounds() {
        assert_eq!(ServerConfig::new(1, 1, 3), Err(ConfigError::PlayerCount(1)));
        assert_eq!(ServerConfig::new(1, 6, 10), Err(ConfigError::PlayerCount(6)));
    }

    #[test]
    fn test_board_size_bounds() {
        assert_eq!(
            ServerConfig::new(1, 3, 2),
            Err(ConfigError::BoardSize {
                board_size: 2,
                num_players: 3
            })
        );
        assert_err!(ServerConfig::new(1, 2, 11));
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["server", "7000", "3", "9", "--seed", "11"]).unwrap();
        let config = assert_ok!(ServerConfig::try_from(args));
        assert_eq!(config.port, 7000);
        assert_eq!(config.num_players, 3);
        assert_eq!(config.board_size, 9);
        assert_eq!(config.seed, Some(11));
    }

    #[test]
    fn test_parse_rejects_missing_and_garbage_args() {
        assert!(Args::try_parse_from(["server", "7000", "3"]).is_err());
        assert!(Args::try_parse_from(["server", "port", "3", "9"]).is_err());
        assert!(Args::try_parse_from(["server", "7000", "-2", "9"]).is_err());

        let args = Args::try_parse_from(["server", "7000", "2", "20"]).unwrap();
        assert_err!(ServerConfig::try_from(args));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::PlayerCount(7).to_string(),
            "num_players must be between 2 and 5, got 7"
        );
        assert_eq!(
            ConfigError::BoardSize {
                board_size: 1,
                num_players: 2
            }
            .to_string(),
            "board_size must be between 2 and 10 for 2 players, got 1"
        );
    }
}
