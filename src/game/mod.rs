//! Game state: playfield, blocks, gravity, matches, chains and rising rows.
//!
//! One call to [`Board::advance_tick`] runs a full simulation step:
//!
//! 1. recompute the falling flag of every block (whole field first),
//! 2. step each block's timer column by column, bottom row to top, removing
//!    expired clears and moving blocks that reached a fall threshold,
//! 3. detect matches, update the chain and mark new clears,
//! 4. raise a new row when the spawn timer elapses (or lose),
//! 5. advance the tick counter.
//!
//! Phase 1 must finish before phase 2 starts; interleaving them lets a block
//! fall several cells in one tick.

pub mod block;
pub mod cursor;
pub mod gravity;
pub mod matcher;
pub mod spawner;

use crate::ChainPolicy;
use block::{Block, BlockColor, Cell, Motion};
use spawner::RowSpawner;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

pub use cursor::Cursor;

/// Default well size.
pub const BOARD_WIDTH: usize = 7;
pub const BOARD_HEIGHT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} board")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// Board rules. Tick counts assume the 30 Hz fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// Ticks between raised rows.
    pub spawn_period: u32,
    /// Ticks a matched block spends clearing before removal.
    pub clear_ticks: u32,
    /// Ticks a block hangs after losing support before its first step down.
    pub fall_delay_ticks: u32,
    /// Ticks per cell once a block is already falling.
    pub gravity_ticks: u32,
    pub score_per_block: u64,
    /// Rows raised before the first tick.
    pub initial_rows: usize,
    pub chain_policy: ChainPolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            spawn_period: 150,
            clear_ticks: 45,
            fall_delay_ticks: 40,
            gravity_ticks: 2,
            score_per_block: 10,
            initial_rows: 5,
            chain_policy: ChainPolicy::Cascade,
        }
    }
}

/// What happened during one tick. Drives UI effects and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Cells newly marked clearing this tick.
    pub matched: usize,
    /// Blocks removed after finishing their clear.
    pub removed: usize,
    pub score_gained: u64,
    pub row_added: bool,
    pub lost: bool,
}

/// Playfield: grid of cells. y=0 is top; rows are stored [0..height].
#[derive(Debug, Clone)]
pub struct Playfield {
    pub width: usize,
    pub height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Playfield {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![Cell::Empty; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        self.rows.get_mut(y).and_then(|row| row.get_mut(x))
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.get_mut(x, y) {
            *slot = cell;
        }
    }

    #[inline]
    pub fn block(&self, x: usize, y: usize) -> Option<&Block> {
        self.rows.get(y).and_then(|row| row.get(x)).and_then(Cell::block)
    }

    #[inline]
    pub fn block_mut(&mut self, x: usize, y: usize) -> Option<&mut Block> {
        self.get_mut(x, y).and_then(Cell::block_mut)
    }

    /// Any block in the top row.
    pub fn top_row_occupied(&self) -> bool {
        self.rows
            .front()
            .is_some_and(|row| row.iter().any(|c| !c.is_empty()))
    }

    /// Shift every row up one and insert `row` at the bottom. The old top row is dropped.
    pub fn push_bottom(&mut self, mut row: Vec<Cell>) {
        row.resize(self.width, Cell::Empty);
        self.rows.pop_front();
        self.rows.push_back(row);
    }

    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        if let (Some(ca), Some(cb)) = (self.get(a.0, a.1), self.get(b.0, b.1)) {
            self.set(a.0, a.1, cb);
            self.set(b.0, b.1, ca);
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.rows.iter().flatten().filter_map(Cell::block)
    }
}

/// One line per row, top first: colour letter, `*` suffix while clearing.
impl fmt::Display for Playfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for cell in row {
                match cell.block() {
                    Some(b) if b.is_clearing() => write!(f, "{}*", b.color.short())?,
                    Some(b) => write!(f, "{} ", b.color.short())?,
                    None => f.write_str(". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Board: owns every block, the row spawner and the scoring counters.
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    playfield: Playfield,
    spawner: RowSpawner,
    seed: u64,
    tick_count: u64,
    spawn_timer: u32,
    score: u64,
    chain: u32,
    lost: bool,
}

impl Board {
    /// Empty board; the row buffer is drawn from `seed`.
    pub fn new(config: BoardConfig, seed: u64) -> Self {
        let playfield = Playfield::new(config.width, config.height);
        let spawner = RowSpawner::new(config.width, seed);
        Self {
            config,
            playfield,
            spawner,
            seed,
            tick_count: 0,
            spawn_timer: 0,
            score: 0,
            chain: 0,
            lost: false,
        }
    }

    /// Raise the configured number of starting rows.
    pub fn fill_initial_rows(&mut self) {
        for _ in 0..self.config.initial_rows.min(self.config.height.saturating_sub(1)) {
            self.request_add_row();
        }
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<(), BoardError> {
        if self.playfield.in_bounds(x, y) {
            Ok(())
        } else {
            Err(BoardError::OutOfRange {
                x,
                y,
                width: self.config.width,
                height: self.config.height,
            })
        }
    }

    /// Colour at (x, y), or None for an empty cell.
    pub fn get_cell(&self, x: usize, y: usize) -> Result<Option<BlockColor>, BoardError> {
        self.check_bounds(x, y)?;
        Ok(self.playfield.get(x, y).and_then(|c| c.color()))
    }

    pub fn cell_is_clearing(&self, x: usize, y: usize) -> Result<bool, BoardError> {
        self.check_bounds(x, y)?;
        Ok(self.playfield.block(x, y).is_some_and(Block::is_clearing))
    }

    /// Exchange two cells unless either holds a falling or clearing block.
    /// Refused swaps are silent no-ops.
    pub fn swap_cells(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) -> Result<(), BoardError> {
        self.check_bounds(x1, y1)?;
        self.check_bounds(x2, y2)?;
        let movable = |c: Option<&Block>| c.is_none_or(Block::is_settled);
        if movable(self.playfield.block(x1, y1)) && movable(self.playfield.block(x2, y2)) {
            self.playfield.swap((x1, y1), (x2, y2));
        }
        Ok(())
    }

    /// Player swap command; ignored once the board is lost.
    pub fn request_swap(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) -> Result<(), BoardError> {
        if self.lost {
            self.check_bounds(x1, y1)?;
            return self.check_bounds(x2, y2);
        }
        self.swap_cells(x1, y1, x2, y2)
    }

    /// True iff the top row holds any block: the next raise loses.
    pub fn is_about_to_lose(&self) -> bool {
        self.playfield.top_row_occupied()
    }

    /// Raise the buffered row at the bottom, or lose if the top row is occupied.
    /// Returns true if a row was raised.
    pub fn request_add_row(&mut self) -> bool {
        if self.lost {
            return false;
        }
        if self.is_about_to_lose() {
            self.lost = true;
            log::info!(
                "Stack overflow at tick {}: game lost with score {}",
                self.tick_count,
                self.score
            );
            log::debug!("Final field:\n{}", self.playfield);
            return false;
        }
        let row = self.spawner.take();
        self.playfield.push_bottom(row);
        log::debug!("Row raised at tick {}", self.tick_count);
        true
    }

    /// Player-requested raise: adds a row now and restarts the spawn timer.
    pub fn raise_stack(&mut self) -> bool {
        let raised = self.request_add_row();
        if raised {
            self.spawn_timer = 0;
        }
        raised
    }

    /// One full simulation step. No-op once lost.
    pub fn advance_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.lost {
            return report;
        }

        // Phase 1: falling flags for the whole field before any block moves.
        gravity::mark_falling(&mut self.playfield);

        // Phase 2: timers, removals and fall steps; each column bottom to top.
        for x in 0..self.playfield.width {
            for y in (0..self.playfield.height).rev() {
                let Some(block) = self.playfield.block_mut(x, y) else {
                    continue;
                };
                block.step();
                let (motion, timer) = (block.motion, block.timer);
                match motion {
                    Motion::Clearing { chain } if timer >= self.config.clear_ticks => {
                        self.playfield.set(x, y, Cell::Empty);
                        let gained = self.config.score_per_block * u64::from(chain).pow(2);
                        self.score += gained;
                        report.score_gained += gained;
                        report.removed += 1;
                        // The whole stack resting on this cell is displaced by the clear.
                        for above in (0..y).rev() {
                            match self.playfield.block_mut(x, above) {
                                Some(b) => b.fell_from_match = true,
                                None => break,
                            }
                        }
                    }
                    Motion::Falling(phase)
                        if timer
                            >= gravity::fall_threshold(
                                phase,
                                self.config.fall_delay_ticks,
                                self.config.gravity_ticks,
                            ) =>
                    {
                        gravity::fall_step(&mut self.playfield, x, y);
                    }
                    _ => {}
                }
            }
        }

        let matches = matcher::find_matches(&self.playfield);
        if !matches.is_empty() {
            let captured = self.update_chain(&matches);
            for &(x, y) in &matches {
                if let Some(b) = self.playfield.block_mut(x, y) {
                    b.start_clearing(captured);
                }
            }
            report.matched = matches.len();
            log::debug!(
                "Matched {} blocks at tick {} (chain {})",
                matches.len(),
                self.tick_count,
                self.chain
            );
        }
        if self.chain > 0 && self.chain_settled() {
            log::debug!("Chain of {} ended at tick {}", self.chain, self.tick_count);
            self.chain = 0;
        }

        self.spawn_timer += 1;
        if self.spawn_timer >= self.config.spawn_period {
            self.spawn_timer = 0;
            report.row_added = self.request_add_row();
            report.lost = self.lost;
        }

        self.tick_count += 1;
        report
    }

    /// Chain update for a non-empty match set. Returns the chain the new
    /// clears capture: under `Cascade` a match with no displaced block is
    /// worth 1 even while a chain is in flight.
    fn update_chain(&mut self, matches: &matcher::MatchSet) -> u32 {
        match self.config.chain_policy {
            ChainPolicy::Cascade => {
                let cascade = matches.iter().any(|&(x, y)| {
                    self.playfield
                        .block(x, y)
                        .is_some_and(|b| b.fell_from_match)
                });
                if cascade {
                    self.chain += 1;
                    self.chain
                } else {
                    self.chain = self.chain.max(1);
                    1
                }
            }
            ChainPolicy::PerMatch => {
                self.chain += 1;
                self.chain
            }
        }
    }

    /// No block is clearing and nothing a finished clear set in motion is still pending.
    fn chain_settled(&self) -> bool {
        let mut blocks = self.playfield.blocks();
        match self.config.chain_policy {
            ChainPolicy::Cascade => !blocks.any(|b| b.is_clearing() || b.fell_from_match),
            ChainPolicy::PerMatch => !blocks.any(|b| b.is_clearing() || b.is_falling()),
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Fraction of the spawn period elapsed, 0.0..1.0. Used for the partial-row reveal.
    pub fn spawn_progress(&self) -> f64 {
        if self.config.spawn_period == 0 {
            return 0.0;
        }
        f64::from(self.spawn_timer) / f64::from(self.config.spawn_period)
    }

    /// Colours of the row that will be raised next.
    pub fn next_row_preview(&self) -> Vec<BlockColor> {
        self.spawner.preview().to_vec()
    }

    #[cfg(test)]
    pub fn place_block(&mut self, x: usize, y: usize, color: BlockColor) -> Result<(), BoardError> {
        self.check_bounds(x, y)?;
        self.playfield.set(x, y, Cell::Block(Block::new(color)));
        Ok(())
    }

    #[cfg(test)]
    pub fn clear_board(&mut self) {
        self.playfield = Playfield::new(self.config.width, self.config.height);
    }

    #[cfg(test)]
    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }
}
