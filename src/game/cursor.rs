//! Swap cursor: covers two horizontally adjacent cells.

use super::{Board, BoardError};

/// `x`, `y` is the left cell of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
    width: usize,
    height: usize,
}

impl Cursor {
    /// Cursor for a board of the given size, starting near the middle.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(2);
        let height = height.max(1);
        Self {
            x: (width - 2) / 2,
            y: height / 2,
            width,
            height,
        }
    }

    pub fn move_left(&mut self) {
        self.x = self.x.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.x = (self.x + 1).min(self.width - 2);
    }

    pub fn move_up(&mut self) {
        self.y = self.y.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.y = (self.y + 1).min(self.height - 1);
    }

    /// Follow the stack when a new row pushes everything up one cell.
    pub fn shift_up(&mut self) {
        self.move_up();
    }

    /// Ask the board to swap the two covered cells.
    pub fn swap(&self, board: &mut Board) -> Result<(), BoardError> {
        board.request_swap(self.x, self.y, self.x + 1, self.y)
    }
}
