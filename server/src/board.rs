//! The shared linear board
//!
//! Tracks which player sits on which cell and, in the other direction, where
//! each player currently is. A player with no position has left the game.

use shared::{render_board, PlayerId};

#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<Option<PlayerId>>,
    positions: Vec<Option<usize>>,
}

impl Board {
    pub fn new(size: usize, num_players: usize) -> Self {
        Self {
            cells: vec![None; size],
            positions: vec![None; num_players],
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn num_players(&self) -> usize {
        self.positions.len()
    }

    pub fn occupant(&self, cell: usize) -> Option<PlayerId> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn position(&self, player: PlayerId) -> Option<usize> {
        self.positions.get(player).copied().flatten()
    }

    /// Puts `player` on `cell`, overwriting whatever the cell held.
    pub fn occupy(&mut self, player: PlayerId, cell: usize) {
        self.cells[cell] = Some(player);
        self.positions[player] = Some(cell);
    }

    /// Takes `player` off its cell and returns the cell it left.
    pub fn vacate(&mut self, player: PlayerId) -> Option<usize> {
        let cell = self.positions.get_mut(player)?.take()?;
        if self.cells[cell] == Some(player) {
            self.cells[cell] = None;
        }
        Some(cell)
    }

    /// Drops `player` from the game without touching its cell, which the
    /// caller is about to take over.
    pub fn evict(&mut self, player: PlayerId) {
        if let Some(position) = self.positions.get_mut(player) {
            *position = None;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Players that still have a position.
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.positions
            .iter()
            .enumerate()
            .filter_map(|(player, position)| position.map(|_| player))
            .collect()
    }

    pub fn contains(&self, cell: i64) -> bool {
        cell >= 0 && (cell as usize) < self.cells.len()
    }

    pub fn snapshot(&self) -> String {
        render_board(&self.cells)
    }
}
