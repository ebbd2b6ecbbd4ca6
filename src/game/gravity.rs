//! Gravity: support scan (phase 1) and single-cell fall steps (phase 2).

use super::Playfield;
use super::block::{Cell, DropPhase, Motion};

/// True if scanning down from (x, y) meets an empty cell before a clearing block.
/// Clearing blocks act as a temporary floor.
pub fn is_unsupported(field: &Playfield, x: usize, y: usize) -> bool {
    for below in (y + 1)..field.height {
        match field.get(x, below) {
            Some(Cell::Empty) => return true,
            Some(Cell::Block(b)) if b.is_clearing() => return false,
            _ => {}
        }
    }
    false
}

/// Phase 1: recompute the falling flag of every block on the field.
///
/// Walks each column bottom-up carrying "is there a gap below that no clearing
/// block interrupts". Only empty/clearing status feeds the scan and this pass
/// never changes either, so updating in place matches a separate read pass.
/// A block that ends up idle and supported drops its fell-from-match mark.
pub fn mark_falling(field: &mut Playfield) {
    for x in 0..field.width {
        let mut gap_below = false;
        for y in (0..field.height).rev() {
            match field.get_mut(x, y) {
                Some(Cell::Empty) => gap_below = true,
                Some(Cell::Block(b)) if b.is_clearing() => gap_below = false,
                Some(Cell::Block(b)) => {
                    b.set_unsupported(gap_below);
                    if b.is_settled() {
                        b.fell_from_match = false;
                    }
                }
                None => {}
            }
        }
    }
}

/// Timer value a falling block must reach before its next one-cell step.
pub fn fall_threshold(phase: DropPhase, fall_delay_ticks: u32, gravity_ticks: u32) -> u32 {
    match phase {
        DropPhase::First => fall_delay_ticks,
        DropPhase::Continuous => gravity_ticks,
    }
}

/// Move the block at (x, y) down one cell if the cell below is free.
///
/// Returns true if the block moved. After the step the block re-checks the
/// column below: still unsupported keeps it in continuous drop, otherwise it
/// lands and goes idle. The timer restarts either way.
pub fn fall_step(field: &mut Playfield, x: usize, y: usize) -> bool {
    if field.get(x, y + 1) != Some(Cell::Empty) {
        return false;
    }
    let cell = match field.get(x, y) {
        Some(c @ Cell::Block(_)) => c,
        _ => return false,
    };
    field.set(x, y, Cell::Empty);
    field.set(x, y + 1, cell);

    let still_falling = is_unsupported(field, x, y + 1);
    if let Some(b) = field.block_mut(x, y + 1) {
        b.timer = 0;
        b.motion = if still_falling {
            Motion::Falling(DropPhase::Continuous)
        } else {
            Motion::Idle
        };
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::block::{Block, BlockColor};

    fn field_with(blocks: &[(usize, usize)]) -> Playfield {
        let mut f = Playfield::new(3, 5);
        for &(x, y) in blocks {
            f.set(x, y, Cell::Block(Block::new(BlockColor::Red)));
        }
        f
    }

    #[test]
    fn test_block_over_gap_is_unsupported() {
        let f = field_with(&[(0, 1), (0, 3), (0, 4)]);
        assert!(is_unsupported(&f, 0, 1));
        assert!(!is_unsupported(&f, 0, 3));
        assert!(!is_unsupported(&f, 0, 4));
    }

    #[test]
    fn test_clearing_block_acts_as_floor() {
        let mut f = field_with(&[(1, 1), (1, 2)]);
        f.block_mut(1, 2).unwrap().start_clearing(1);
        // Empty cells under the clearing block do not reach the block above it.
        assert!(!is_unsupported(&f, 1, 1));
        mark_falling(&mut f);
        assert!(!f.block(1, 1).unwrap().is_falling());
        assert!(f.block(1, 2).unwrap().is_clearing());
    }

    #[test]
    fn test_mark_falling_whole_stack_over_gap() {
        let mut f = field_with(&[(2, 0), (2, 1), (2, 2), (2, 4)]);
        mark_falling(&mut f);
        for y in 0..3 {
            assert!(f.block(2, y).unwrap().is_falling(), "row {y}");
        }
        assert!(!f.block(2, 4).unwrap().is_falling());
    }

    #[test]
    fn test_mark_falling_clears_mark_on_settled_block() {
        let mut f = field_with(&[(0, 4)]);
        f.block_mut(0, 4).unwrap().fell_from_match = true;
        mark_falling(&mut f);
        assert!(!f.block(0, 4).unwrap().fell_from_match);
    }

    #[test]
    fn test_fall_step_lands_on_floor() {
        let mut f = field_with(&[(0, 3)]);
        mark_falling(&mut f);
        assert!(fall_step(&mut f, 0, 3));
        let b = f.block(0, 4).unwrap();
        assert_eq!(b.motion, Motion::Idle);
        assert!(f.get(0, 3) == Some(Cell::Empty));
    }

    #[test]
    fn test_fall_step_continues_over_deeper_gap() {
        let mut f = field_with(&[(0, 1)]);
        mark_falling(&mut f);
        assert!(fall_step(&mut f, 0, 1));
        assert_eq!(
            f.block(0, 2).unwrap().motion,
            Motion::Falling(DropPhase::Continuous)
        );
    }

    #[test]
    fn test_fall_step_waits_when_below_is_occupied() {
        let mut f = field_with(&[(0, 2), (0, 3)]);
        assert!(!fall_step(&mut f, 0, 2));
        assert!(f.block(0, 2).is_some());
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(fall_threshold(DropPhase::First, 40, 2), 40);
        assert_eq!(fall_threshold(DropPhase::Continuous, 40, 2), 2);
    }
}
