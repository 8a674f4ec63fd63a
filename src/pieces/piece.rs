//! Pieces: identity plus a private automaton.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::{Cell, Command, EventKind};
use crate::state::{Automaton, State, StateId};

/// Which army a piece belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// The id marker character for this side.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::White => 'W',
            Self::Black => 'B',
        }
    }

    /// Parse a marker character (`W`/`B`).
    #[must_use]
    pub const fn from_marker(c: char) -> Option<Self> {
        match c {
            'W' => Some(Self::White),
            'B' => Some(Self::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => f.write_str("White"),
            Self::Black => f.write_str("Black"),
        }
    }
}

/// A piece's unique identity, by convention `<typeCode>_<initialCell>`,
/// e.g. `KW_(7,4)`.
///
/// The id never changes after creation even though the piece moves. The
/// type code's first character is the piece kind (`K` = king) and the
/// second is the side marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceId(String);

impl PieceId {
    /// Wrap a raw id string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Derive the id for a type code placed at a cell.
    #[must_use]
    pub fn for_placement(type_code: &str, cell: Cell) -> Self {
        Self(format!("{type_code}_{cell}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The side marker, read from the id's second character.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        self.0.chars().nth(1).and_then(Side::from_marker)
    }

    /// Whether this id names a king (`KW`/`KB` prefix).
    #[must_use]
    pub fn is_king(&self) -> bool {
        self.0.starts_with("KW") || self.0.starts_with("KB")
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PieceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A placed piece: identity plus the current state of its private
/// automaton clone.
pub struct Piece {
    id: PieceId,
    automaton: Automaton,
    current: StateId,
}

impl Piece {
    /// Take ownership of an automaton; the piece starts at its idle root.
    #[must_use]
    pub fn new(id: PieceId, automaton: Automaton) -> Self {
        let current = automaton.idle();
        Self {
            id,
            automaton,
            current,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PieceId {
        &self.id
    }

    /// The current automaton state.
    #[must_use]
    pub fn state(&self) -> &State {
        self.automaton.state(self.current)
    }

    /// Read access to the piece's private automaton.
    #[must_use]
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    #[must_use]
    pub fn state_name(&self) -> &str {
        self.state().name()
    }

    /// The board cell this piece currently occupies.
    #[must_use]
    pub fn current_cell(&self) -> Cell {
        self.state().curr_cell()
    }

    /// When the piece entered its current state.
    #[must_use]
    pub fn start_ms(&self) -> u64 {
        self.state().start_ms()
    }

    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.state().can_capture()
    }

    #[must_use]
    pub fn can_be_captured(&self) -> bool {
        self.state().can_be_captured()
    }

    /// Advance physics; autonomous transitions may change the state.
    pub fn update(&mut self, now_ms: u64) {
        self.current = self.automaton.tick(self.current, now_ms);
    }

    /// Apply an external command (with occupancy context for legality).
    pub fn on_command(&mut self, cmd: &Command, occupied: Option<&FxHashSet<Cell>>) {
        self.current = self.automaton.handle_command(self.current, cmd, occupied);
    }

    /// Re-baseline the current state's start time without moving it.
    pub fn reset(&mut self, start_ms: u64) {
        let cmd = Command::for_piece(start_ms, self.id.as_str(), EventKind::Idle, &[]);
        self.automaton.state_mut(self.current).reset(&cmd);
    }

    /// Place the piece: reset the current state with a synthetic `idle`
    /// command carrying the placement cell.
    pub fn place(&mut self, timestamp_ms: u64, cell: Cell) {
        let cmd = Command::for_piece(timestamp_ms, self.id.as_str(), EventKind::Idle, &[cell]);
        self.automaton.state_mut(self.current).reset(&cmd);
    }
}

impl std::fmt::Debug for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Piece({} @ {})", self.id, self.current_cell())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_id_side_and_king() {
        assert_eq!(PieceId::new("KW_(7,4)").side(), Some(Side::White));
        assert_eq!(PieceId::new("PB_(1,0)").side(), Some(Side::Black));
        assert_eq!(PieceId::new("X").side(), None);

        assert!(PieceId::new("KW_(7,4)").is_king());
        assert!(PieceId::new("KB_(0,4)").is_king());
        assert!(!PieceId::new("QW_(7,3)").is_king());
    }

    #[test]
    fn test_id_derived_from_placement() {
        let id = PieceId::for_placement("PW", Cell::new(6, 0));
        assert_eq!(id.as_str(), "PW_(6,0)");
    }

    #[test]
    fn test_side_markers_round_trip() {
        assert_eq!(Side::from_marker(Side::White.marker()), Some(Side::White));
        assert_eq!(Side::from_marker(Side::Black.marker()), Some(Side::Black));
        assert_eq!(Side::from_marker('Q'), None);
    }
}
