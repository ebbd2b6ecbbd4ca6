//! Blocks: colour, per-block timer and the idle / falling / clearing state machine.

/// Block colours. The renderer owns the mapping from colour to terminal style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl BlockColor {
    pub const ALL: [Self; 5] = [Self::Red, Self::Blue, Self::Green, Self::Yellow, Self::Purple];

    /// Colour index 0..5 for theme.block_color().
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Blue => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Purple => 4,
        }
    }

    /// One-letter tag used in logs and test fixtures.
    pub fn short(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Blue => 'B',
            Self::Green => 'G',
            Self::Yellow => 'Y',
            Self::Purple => 'P',
        }
    }
}

/// Which fall step a falling block is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPhase {
    /// Just lost support; hangs for the long fall delay before the first step.
    First,
    /// Already completed a step this fall; moves at gravity speed.
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Falling(DropPhase),
    /// Matched; removed when the timer reaches the clear duration.
    /// `chain` is the chain value captured when the match was detected.
    Clearing { chain: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub color: BlockColor,
    pub timer: u32,
    pub motion: Motion,
    /// Sat directly above a block that was just removed; used for chain credit.
    pub fell_from_match: bool,
}

impl Block {
    pub fn new(color: BlockColor) -> Self {
        Self {
            color,
            timer: 0,
            motion: Motion::Idle,
            fell_from_match: false,
        }
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        matches!(self.motion, Motion::Falling(_))
    }

    #[inline]
    pub fn is_clearing(&self) -> bool {
        matches!(self.motion, Motion::Clearing { .. })
    }

    /// Neither falling nor clearing: can be swapped and can take part in a match.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.motion == Motion::Idle
    }

    /// Advance the timer one tick. Idle blocks hold their timer at zero.
    pub fn step(&mut self) {
        if self.is_falling() || self.is_clearing() {
            self.timer += 1;
        } else {
            self.timer = 0;
        }
    }

    /// Phase-1 update: set falling from the support scan. Clearing blocks ignore it.
    pub fn set_unsupported(&mut self, unsupported: bool) {
        self.motion = match (self.motion, unsupported) {
            (Motion::Clearing { chain }, _) => Motion::Clearing { chain },
            (Motion::Falling(phase), true) => Motion::Falling(phase),
            (Motion::Idle, true) => Motion::Falling(DropPhase::First),
            (_, false) => Motion::Idle,
        };
    }

    /// Enter the clearing state. Halts any fall in progress; a block already
    /// clearing keeps its first chain and timer.
    pub fn start_clearing(&mut self, chain: u32) {
        if !self.is_clearing() {
            self.motion = Motion::Clearing { chain };
            self.timer = 0;
        }
    }
}

/// Single grid slot: either empty or holding a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(Block),
}

impl Cell {
    #[inline]
    pub fn block(&self) -> Option<&Block> {
        match self {
            Self::Block(b) => Some(b),
            Self::Empty => None,
        }
    }

    #[inline]
    pub fn block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Self::Block(b) => Some(b),
            Self::Empty => None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub fn color(&self) -> Option<BlockColor> {
        self.block().map(|b| b.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_resets_idle_timer() {
        let mut b = Block::new(BlockColor::Red);
        b.timer = 7;
        b.step();
        assert_eq!(b.timer, 0);
    }

    #[test]
    fn test_step_counts_while_falling_or_clearing() {
        let mut b = Block::new(BlockColor::Blue);
        b.set_unsupported(true);
        b.step();
        b.step();
        assert_eq!(b.timer, 2);

        b.start_clearing(1);
        assert_eq!(b.timer, 0);
        b.step();
        assert_eq!(b.timer, 1);
    }

    #[test]
    fn test_unsupported_idle_block_starts_first_drop() {
        let mut b = Block::new(BlockColor::Green);
        b.set_unsupported(true);
        assert_eq!(b.motion, Motion::Falling(DropPhase::First));
        b.motion = Motion::Falling(DropPhase::Continuous);
        b.set_unsupported(true);
        assert_eq!(b.motion, Motion::Falling(DropPhase::Continuous));
        b.set_unsupported(false);
        assert_eq!(b.motion, Motion::Idle);
    }

    #[test]
    fn test_clearing_takes_precedence_over_falling() {
        let mut b = Block::new(BlockColor::Yellow);
        b.set_unsupported(true);
        b.start_clearing(2);
        assert!(b.is_clearing());
        assert!(!b.is_falling());
        b.set_unsupported(true);
        assert_eq!(b.motion, Motion::Clearing { chain: 2 });
        // Second selection keeps the first chain.
        b.start_clearing(5);
        assert_eq!(b.motion, Motion::Clearing { chain: 2 });
    }
}
