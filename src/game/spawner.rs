//! Next-row buffer: seeded random rows with no three equal colours in a run.

use super::block::{Block, BlockColor, Cell};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// True if any three consecutive entries share a colour.
pub fn has_three_in_a_row(row: &[BlockColor]) -> bool {
    row.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Holds exactly one buffered row; taking it regenerates the buffer at once.
#[derive(Debug, Clone)]
pub struct RowSpawner {
    rng: Pcg32,
    width: usize,
    next: Vec<BlockColor>,
}

impl RowSpawner {
    pub fn new(width: usize, seed: u64) -> Self {
        let mut spawner = Self {
            rng: Pcg32::seed_from_u64(seed),
            width,
            next: Vec::with_capacity(width),
        };
        spawner.generate();
        spawner
    }

    /// Sample each cell independently; reject and resample while any colour repeats three times in a run.
    fn generate(&mut self) {
        loop {
            self.next.clear();
            for _ in 0..self.width {
                let i = self.rng.random_range(0..BlockColor::ALL.len());
                self.next.push(BlockColor::ALL[i]);
            }
            if !has_three_in_a_row(&self.next) {
                return;
            }
        }
    }

    /// Colours of the buffered row, left to right.
    pub fn preview(&self) -> &[BlockColor] {
        &self.next
    }

    /// Hand out the buffered row as fresh blocks and regenerate.
    pub fn take(&mut self) -> Vec<Cell> {
        let row = self
            .next
            .iter()
            .map(|&c| Cell::Block(Block::new(c)))
            .collect();
        self.generate();
        row
    }
}
