//! Match detection: runs of three same-coloured settled blocks, horizontal or vertical.

use super::Playfield;
use super::block::BlockColor;
use std::collections::HashSet;

/// Every (x, y) position selected for clearing this tick.
pub type MatchSet = HashSet<(usize, usize)>;

/// Colour of a block that may take part in a match (present, not falling, not clearing).
fn matchable(field: &Playfield, x: usize, y: usize) -> Option<BlockColor> {
    field
        .block(x, y)
        .filter(|b| b.is_settled())
        .map(|b| b.color)
}

/// Scan the whole field. From each cell test the run of three extending right
/// and the run of three extending down; all counted runs are unioned, so
/// longer or crossing runs collapse into one set. Pure in the field state.
pub fn find_matches(field: &Playfield) -> MatchSet {
    let mut matched = MatchSet::new();
    for y in 0..field.height {
        for x in 0..field.width {
            let Some(color) = matchable(field, x, y) else {
                continue;
            };
            if x + 2 < field.width
                && matchable(field, x + 1, y) == Some(color)
                && matchable(field, x + 2, y) == Some(color)
            {
                matched.extend([(x, y), (x + 1, y), (x + 2, y)]);
            }
            if y + 2 < field.height
                && matchable(field, x, y + 1) == Some(color)
                && matchable(field, x, y + 2) == Some(color)
            {
                matched.extend([(x, y), (x, y + 1), (x, y + 2)]);
            }
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::block::{Block, Cell};

    fn field(rows: &[&str]) -> Playfield {
        let mut f = Playfield::new(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let color = BlockColor::ALL.into_iter().find(|c| c.short() == ch);
                if let Some(color) = color {
                    f.set(x, y, Cell::Block(Block::new(color)));
                }
            }
        }
        f
    }

    #[test]
    fn test_horizontal_three() {
        let f = field(&["......", "RRRBGY"]);
        let m = find_matches(&f);
        assert_eq!(m, MatchSet::from([(0, 1), (1, 1), (2, 1)]));
    }

    #[test]
    fn test_vertical_three() {
        let f = field(&["B..", "B..", "B..", "R.."]);
        let m = find_matches(&f);
        assert_eq!(m, MatchSet::from([(0, 0), (0, 1), (0, 2)]));
    }

    #[test]
    fn test_run_of_five_merges() {
        let f = field(&["GGGGGBR"]);
        let m = find_matches(&f);
        assert_eq!(m.len(), 5);
        assert!((0..5).all(|x| m.contains(&(x, 0))));
    }

    #[test]
    fn test_cross_shape_unions() {
        let f = field(&[".Y.", "YYY", ".Y."]);
        let m = find_matches(&f);
        assert_eq!(m.len(), 5);
    }

    #[test]
    fn test_two_is_not_a_match() {
        let f = field(&["RRB", "BBR"]);
        assert!(find_matches(&f).is_empty());
    }

    #[test]
    fn test_falling_or_clearing_blocks_do_not_match() {
        let mut f = field(&["PPP", "RRR"]);
        f.block_mut(1, 0).unwrap().set_unsupported(true);
        f.block_mut(2, 1).unwrap().start_clearing(1);
        assert!(find_matches(&f).is_empty());
    }

    #[test]
    fn test_detection_is_idempotent() {
        let f = field(&["RBRBRBR", "GGGYYYP", "BRBRBRB"]);
        let first = find_matches(&f);
        let second = find_matches(&f);
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }
}
