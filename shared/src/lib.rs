//! Wire protocol shared by the linear board server and its terminal client.
//!
//! The protocol is line oriented and textual. The server sends fixed status
//! lines and board snapshots; the client sends one signed decimal step per line.

use std::fmt;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 5;
/// Largest board is this many cells per player.
pub const MAX_CELLS_PER_PLAYER: usize = 5;
/// Largest distance a player may move in a single command.
pub const MAX_STEP: i64 = 2;

/// Index of a player within one session, assigned in connection order.
pub type PlayerId = usize;

/// Every line the server ever writes to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Joined { player: PlayerId },
    GameStarted,
    Board(String),
    SteppedOut,
    SteppedOn { by: PlayerId },
    Won,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Joined { player } => {
                writeln!(f, "You are player#{}. Please wait...", player)
            }
            ServerMessage::GameStarted => writeln!(f, "The game has started."),
            // Snapshots already carry their trailing newline.
            ServerMessage::Board(snapshot) => f.write_str(snapshot),
            ServerMessage::SteppedOut => writeln!(f, "You lost: you stepped out of the board!"),
            ServerMessage::SteppedOn { by } => {
                writeln!(f, "You lost: player#{} stepped on you!", by)
            }
            ServerMessage::Won => writeln!(f, "You have won!"),
        }
    }
}

impl ServerMessage {
    /// Recognises a line received from the server, without its newline.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.starts_with('|') {
            return Some(ServerMessage::Board(format!("{}\n", line)));
        }

        match line {
            "The game has started." => return Some(ServerMessage::GameStarted),
            "You lost: you stepped out of the board!" => return Some(ServerMessage::SteppedOut),
            "You have won!" => return Some(ServerMessage::Won),
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("You are player#") {
            let player = rest.strip_suffix(". Please wait...")?.parse().ok()?;
            return Some(ServerMessage::Joined { player });
        }
        if let Some(rest) = line.strip_prefix("You lost: player#") {
            let by = rest.strip_suffix(" stepped on you!")?.parse().ok()?;
            return Some(ServerMessage::SteppedOn { by });
        }
        None
    }

    /// Whether the server closes the connection right after this message.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ServerMessage::SteppedOut | ServerMessage::SteppedOn { .. } | ServerMessage::Won
        )
    }
}

/// A client line interpreted as a game command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `0`: reply with the current board.
    ShowBoard,
    /// A non-zero step within `[-MAX_STEP, MAX_STEP]`.
    Step(i64),
    /// Out-of-range or unparseable input, silently dropped.
    Ignored,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().parse::<i64>() {
            Ok(0) => Command::ShowBoard,
            Ok(step) if (-MAX_STEP..=MAX_STEP).contains(&step) => Command::Step(step),
            _ => Command::Ignored,
        }
    }
}

/// Renders cells as `|a|b|...|\n`, a space standing for an empty cell.
pub fn render_board(cells: &[Option<PlayerId>]) -> String {
    let mut out = String::with_capacity(cells.len() * 2 + 2);
    out.push('|');
    for cell in cells {
        match cell {
            Some(player) => out.push_str(&player.to_string()),
            None => out.push(' '),
        }
        out.push('|');
    }
    out.push('\n');
    out
}

/// Checks the player count and board size bounds the server accepts.
pub fn valid_dimensions(num_players: usize, board_size: usize) -> bool {
    (MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players)
        && board_size >= num_players
        && board_size <= MAX_CELLS_PER_PLAYER * num_players
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_board() {
        assert_eq!(render_board(&[Some(0), None, Some(2)]), "|0| |2|\n");
        assert_eq!(render_board(&[None, None]), "| | |\n");
        assert_eq!(render_board(&[]), "|\n");
    }

    #[test]
    fn test_message_lines() {
        assert_eq!(
            ServerMessage::Joined { player: 3 }.to_string(),
            "You are player#3. Please wait...\n"
        );
        assert_eq!(
            ServerMessage::GameStarted.to_string(),
            "The game has started.\n"
        );
        assert_eq!(
            ServerMessage::SteppedOut.to_string(),
            "You lost: you stepped out of the board!\n"
        );
        assert_eq!(
            ServerMessage::SteppedOn { by: 1 }.to_string(),
            "You lost: player#1 stepped on you!\n"
        );
        assert_eq!(ServerMessage::Won.to_string(), "You have won!\n");
        assert_eq!(
            ServerMessage::Board("| |0|\n".to_string()).to_string(),
            "| |0|\n"
        );
    }

    #[test]
    fn test_parse_server_lines() {
        assert_eq!(
            ServerMessage::parse("You are player#2. Please wait..."),
            Some(ServerMessage::Joined { player: 2 })
        );
        assert_eq!(
            ServerMessage::parse("You lost: player#4 stepped on you!\n"),
            Some(ServerMessage::SteppedOn { by: 4 })
        );
        assert_eq!(
            ServerMessage::parse("| |0|1|"),
            Some(ServerMessage::Board("| |0|1|\n".to_string()))
        );
        assert_eq!(ServerMessage::parse("You have won!"), Some(ServerMessage::Won));
        assert_eq!(ServerMessage::parse("You are player#x. Please wait..."), None);
        assert_eq!(ServerMessage::parse("hello"), None);
    }

    #[test]
    fn test_parse_accepts_own_output() {
        let messages = [
            ServerMessage::Joined { player: 0 },
            ServerMessage::GameStarted,
            ServerMessage::SteppedOut,
            ServerMessage::SteppedOn { by: 3 },
            ServerMessage::Won,
        ];
        for message in messages {
            assert_eq!(ServerMessage::parse(&message.to_string()), Some(message));
        }
    }

    #[test]
    fn test_final_messages() {
        assert!(ServerMessage::Won.is_final());
        assert!(ServerMessage::SteppedOn { by: 0 }.is_final());
        assert!(ServerMessage::SteppedOut.is_final());
        assert!(!ServerMessage::GameStarted.is_final());
        assert!(!ServerMessage::Joined { player: 0 }.is_final());
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("0"), Command::ShowBoard);
        assert_eq!(Command::parse("1\n"), Command::Step(1));
        assert_eq!(Command::parse("  -2 \r\n"), Command::Step(-2));
        assert_eq!(Command::parse("+2"), Command::Step(2));
        assert_eq!(Command::parse("5"), Command::Ignored);
        assert_eq!(Command::parse("-3"), Command::Ignored);
        assert_eq!(Command::parse("left"), Command::Ignored);
        assert_eq!(Command::parse(""), Command::Ignored);
    }

    #[test]
    fn test_dimension_bounds() {
        assert!(valid_dimensions(2, 2));
        assert!(valid_dimensions(2, 10));
        assert!(valid_dimensions(5, 25));
        assert!(!valid_dimensions(1, 3));
        assert!(!valid_dimensions(6, 10));
        assert!(!valid_dimensions(3, 2));
        assert!(!valid_dimensions(3, 16));
    }
}
