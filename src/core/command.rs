//! Commands: the single intent/event record shared by every producer.
//!
//! External producers (players), the physics drivers, and the state
//! machines all speak `Command`. A command is immutable once created:
//! a timestamp, an optional target piece, an event kind, and an ordered
//! list of cell parameters (commonly zero, one, or two cells).
//!
//! Event names arriving from outside are free-form text and matched
//! case-insensitively; internally they are a closed enum so transition
//! tables are not stringly-typed.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::cell::Cell;

/// The kind of event a command carries.
///
/// The engine interprets `Idle`, `Move`, `Jump`, and `Done`; any other
/// externally-sourced name is preserved (lower-cased) as `Custom` and
/// still routed through transition tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Enter or re-enter the idle state (also placement).
    Idle,
    /// Player-initiated move; carries source and destination cells.
    Move,
    /// Player-initiated jump in place.
    Jump,
    /// Synthesized by physics when motion or a timer completes.
    Done,
    /// Any other event name, stored lower-cased.
    Custom(String),
}

impl EventKind {
    /// Parse an event name case-insensitively.
    ///
    /// `"MOVE"`, `"Move"`, and `"move"` all map to [`EventKind::Move`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "idle" => Self::Idle,
            "move" => Self::Move,
            "jump" => Self::Jump,
            "done" => Self::Done,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The canonical lower-cased name of this event.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Move => "move",
            Self::Jump => "jump",
            Self::Done => "done",
            Self::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable intent/event record.
///
/// `piece_id` is `None` for commands synthesized internally by a physics
/// driver (the target is implicit: the piece whose driver produced it).
///
/// `params` uses a `SmallVec` sized for the common case of zero to two
/// cells (source/destination) without heap allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Simulation timestamp in milliseconds.
    pub timestamp_ms: u64,

    /// Target piece id, or `None` for physics-internal commands.
    pub piece_id: Option<String>,

    /// The event this command triggers.
    pub kind: EventKind,

    /// Ordered cell parameters (commonly source, destination).
    pub params: SmallVec<[Cell; 2]>,
}

impl Command {
    /// Create a command targeting a piece by id.
    #[must_use]
    pub fn for_piece(
        timestamp_ms: u64,
        piece_id: impl Into<String>,
        kind: EventKind,
        params: &[Cell],
    ) -> Self {
        Self {
            timestamp_ms,
            piece_id: Some(piece_id.into()),
            kind,
            params: SmallVec::from_slice(params),
        }
    }

    /// Create a physics-internal command with no explicit target.
    #[must_use]
    pub fn internal(timestamp_ms: u64, kind: EventKind, params: &[Cell]) -> Self {
        Self {
            timestamp_ms,
            piece_id: None,
            kind,
            params: SmallVec::from_slice(params),
        }
    }

    /// The source cell, when present (first parameter).
    #[must_use]
    pub fn source(&self) -> Option<Cell> {
        self.params.first().copied()
    }

    /// The destination cell, when present (second parameter).
    #[must_use]
    pub fn destination(&self) -> Option<Cell> {
        self.params.get(1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_case_insensitive() {
        assert_eq!(EventKind::parse("MOVE"), EventKind::Move);
        assert_eq!(EventKind::parse("Move"), EventKind::Move);
        assert_eq!(EventKind::parse("jump"), EventKind::Jump);
        assert_eq!(EventKind::parse("IDLE"), EventKind::Idle);
        assert_eq!(EventKind::parse("Done"), EventKind::Done);
    }

    #[test]
    fn test_event_kind_custom_lowercased() {
        assert_eq!(
            EventKind::parse("PROMOTE"),
            EventKind::Custom("promote".to_string())
        );
        assert_eq!(EventKind::parse("PROMOTE").name(), "promote");
    }

    #[test]
    fn test_command_params() {
        let cmd = Command::for_piece(
            100,
            "PW_(6,0)",
            EventKind::Move,
            &[Cell::new(6, 0), Cell::new(4, 0)],
        );

        assert_eq!(cmd.source(), Some(Cell::new(6, 0)));
        assert_eq!(cmd.destination(), Some(Cell::new(4, 0)));
        assert_eq!(cmd.piece_id.as_deref(), Some("PW_(6,0)"));
    }

    #[test]
    fn test_internal_command_has_no_target() {
        let cmd = Command::internal(5, EventKind::Done, &[Cell::new(0, 0)]);
        assert!(cmd.piece_id.is_none());
        assert_eq!(cmd.destination(), None);
    }
}
