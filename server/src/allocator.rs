//! Random starting positions
//!
//! Draws board indices uniformly without replacement. A fresh draw refills the
//! pool with every index of the board; continuing draws take from whatever is
//! left. Removal swaps the drawn slot with the last one, so pool order carries
//! no meaning.

use crate::error::AllocatorError;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How a single draw treats the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    /// Refill the pool with `0..total`, then draw.
    Fresh(usize),
    /// Draw from what remains of the current pool.
    Continue,
}

pub struct PositionAllocator {
    pool: Vec<usize>,
    rng: StdRng,
}

impl PositionAllocator {
    pub fn new() -> Self {
        Self {
            pool: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Allocator with a reproducible draw sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            pool: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn reserve(&mut self, draw: Draw) -> Result<usize, AllocatorError> {
        if let Draw::Fresh(total) = draw {
            self.pool.clear();
            self.pool.extend(0..total);
        }

        if self.pool.is_empty() {
            return Err(AllocatorError::PoolExhausted);
        }

        let slot = self.rng.gen_range(0..self.pool.len());
        Ok(self.pool.swap_remove(slot))
    }

    /// Number of indices still available to `Draw::Continue`.
    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    /// Draws `num_players` distinct cells of a `board_size` board: the first
    /// player reseeds the pool, the rest continue from it.
    pub fn starting_positions(
        &mut self,
        board_size: usize,
        num_players: usize,
    ) -> Result<Vec<usize>, AllocatorError> {
        let mut positions = Vec::with_capacity(num_players);
        for player in 0..num_players {
            let draw = if player == 0 {
                Draw::Fresh(board_size)
            } else {
                Draw::Continue
            };
            positions.push(self.reserve(draw)?);
        }
        debug!("Drew starting positions {:?}", positions);
        Ok(positions)
    }
}

impl Default for PositionAllocator {
    fn default() -> Self {
        Self::new()
    }
}
