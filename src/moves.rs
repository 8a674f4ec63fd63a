//! Move legality rules for one piece type.
//!
//! Rules are a table of relative `(d_row, d_col)` deltas, each optionally
//! tagged as capture-only or non-capture-only. Lines follow the
//! `moves.txt` shape:
//!
//! ```text
//! -1,0:non_capture    # pawn push
//! -1,1:capture        # pawn takes
//! 0,1                 # can both capture and not
//! ```
//!
//! `is_valid` checks board bounds, delta membership, the capture tag
//! against destination occupancy, and (for sliding pieces) that the
//! straight-line path between source and destination is clear.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::Cell;
use crate::error::EngineError;

/// Capture behavior of a single relative move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureTag {
    /// Legal whether or not the destination is occupied.
    Either,
    /// Legal only onto an occupied destination (pawn diagonal).
    CaptureOnly,
    /// Legal only onto an empty destination (pawn push).
    NonCaptureOnly,
}

/// Legality ruleset for one piece type: bounds, pattern, blocking.
#[derive(Clone, Debug)]
pub struct Moves {
    dims: (i32, i32),
    deltas: FxHashMap<(i32, i32), CaptureTag>,
    need_clear_path: bool,
}

impl Moves {
    /// Parse rules from `moves.txt`-shaped lines.
    ///
    /// Blank lines and `#` comments (whole-line or trailing) are skipped.
    /// `dims` is `(rows, cols)`. `need_clear_path` is false for pieces
    /// that leap over blockers (knights).
    pub fn parse<'a>(
        lines: impl IntoIterator<Item = &'a str>,
        dims: (i32, i32),
        need_clear_path: bool,
    ) -> Result<Self, EngineError> {
        let mut deltas = FxHashMap::default();

        for raw in lines {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let (coords, tag_str) = match line.split_once(':') {
                Some((c, t)) => (c.trim(), t.trim()),
                None => (line, ""),
            };

            let (dr, dc) = coords
                .split_once(',')
                .and_then(|(r, c)| {
                    Some((
                        r.trim().parse::<i32>().ok()?,
                        c.trim().parse::<i32>().ok()?,
                    ))
                })
                .ok_or_else(|| EngineError::BadMoveRule(raw.to_string()))?;

            let tag = match tag_str {
                "capture" => CaptureTag::CaptureOnly,
                "non_capture" => CaptureTag::NonCaptureOnly,
                _ => CaptureTag::Either,
            };
            deltas.insert((dr, dc), tag);
        }

        Ok(Self {
            dims,
            deltas,
            need_clear_path,
        })
    }

    /// Number of distinct relative moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Whether the ruleset has no moves at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Decide whether `src -> dst` is legal given the occupied cells.
    #[must_use]
    pub fn is_valid(&self, src: Cell, dst: Cell, occupied: &FxHashSet<Cell>) -> bool {
        if !(0..self.dims.0).contains(&dst.row) || !(0..self.dims.1).contains(&dst.col) {
            return false;
        }

        let delta = dst.delta_from(src);
        let Some(tag) = self.deltas.get(&delta) else {
            return false;
        };

        let dst_occupied = occupied.contains(&dst);
        let tag_ok = match tag {
            CaptureTag::Either => true,
            CaptureTag::CaptureOnly => dst_occupied,
            CaptureTag::NonCaptureOnly => !dst_occupied,
        };
        if !tag_ok {
            return false;
        }

        if self.need_clear_path && !self.path_is_clear(src, dst, occupied) {
            return false;
        }
        true
    }

    /// True when no intermediate cell between `src` and `dst` is occupied.
    fn path_is_clear(&self, src: Cell, dst: Cell, occupied: &FxHashSet<Cell>) -> bool {
        let (dr, dc) = dst.delta_from(src);
        let steps = dr.abs().max(dc.abs());
        if steps == 0 {
            return true;
        }

        let step_r = f64::from(dr) / f64::from(steps);
        let step_c = f64::from(dc) / f64::from(steps);
        for i in 1..steps {
            let cell = Cell::new(
                src.row + (f64::from(i) * step_r) as i32,
                src.col + (f64::from(i) * step_c) as i32,
            );
            if occupied.contains(&cell) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(cells: &[Cell]) -> FxHashSet<Cell> {
        cells.iter().copied().collect()
    }

    fn rook() -> Moves {
        let lines: Vec<String> = (1..8)
            .flat_map(|d| {
                vec![
                    format!("{d},0"),
                    format!("-{d},0"),
                    format!("0,{d}"),
                    format!("0,-{d}"),
                ]
            })
            .collect();
        Moves::parse(lines.iter().map(String::as_str), (8, 8), true).unwrap()
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let moves = Moves::parse(
            ["# header", "", "  1,0  ", "0,1 # trailing"],
            (8, 8),
            true,
        )
        .unwrap();
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Moves::parse(["one,two"], (8, 8), true).is_err());
    }

    #[test]
    fn test_unlisted_delta_is_illegal() {
        let moves = Moves::parse(["1,0"], (8, 8), true).unwrap();
        assert!(moves.is_valid(Cell::new(0, 0), Cell::new(1, 0), &occ(&[])));
        assert!(!moves.is_valid(Cell::new(0, 0), Cell::new(2, 0), &occ(&[])));
    }

    #[test]
    fn test_out_of_bounds_destination() {
        let moves = Moves::parse(["-1,0"], (8, 8), true).unwrap();
        assert!(!moves.is_valid(Cell::new(0, 4), Cell::new(-1, 4), &occ(&[])));
    }

    #[test]
    fn test_capture_tags() {
        let moves = Moves::parse(["-1,0:non_capture", "-1,1:capture"], (8, 8), true).unwrap();
        let src = Cell::new(6, 4);

        // Push blocked by an occupant, diagonal requires one.
        assert!(moves.is_valid(src, Cell::new(5, 4), &occ(&[])));
        assert!(!moves.is_valid(src, Cell::new(5, 4), &occ(&[Cell::new(5, 4)])));
        assert!(!moves.is_valid(src, Cell::new(5, 5), &occ(&[])));
        assert!(moves.is_valid(src, Cell::new(5, 5), &occ(&[Cell::new(5, 5)])));
    }

    #[test]
    fn test_sliding_piece_is_path_blocked() {
        let rook = rook();
        let src = Cell::new(0, 0);

        assert!(rook.is_valid(src, Cell::new(0, 7), &occ(&[])));
        // Blocker on an intermediate cell.
        assert!(!rook.is_valid(src, Cell::new(0, 7), &occ(&[Cell::new(0, 3)])));
        // Occupied destination itself is fine (capture).
        assert!(rook.is_valid(src, Cell::new(0, 7), &occ(&[Cell::new(0, 7)])));
    }

    #[test]
    fn test_leaper_ignores_blockers() {
        let knight = Moves::parse(["2,1", "1,2"], (8, 8), false).unwrap();
        let src = Cell::new(0, 0);

        assert!(knight.is_valid(src, Cell::new(2, 1), &occ(&[Cell::new(1, 0), Cell::new(1, 1)])));
    }
}
