//! Piece-type library configuration shapes.
//!
//! The on-disk piece library is directory-shaped (one directory per type,
//! one sub-directory per state, `moves.txt`, `config.json`,
//! `transitions.csv`, a `board.csv` placement grid). Reading those files
//! is an external concern; this module defines the deserialized shape the
//! factory consumes, so any loader that yields it works.

use serde::{Deserialize, Serialize};

use crate::core::Cell;
use crate::graphics::GraphicsConfig;
use crate::physics::PhysicsConfig;

/// One named state of a piece type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateSpec {
    /// State name; `idle` is the automaton entry point.
    pub name: String,

    /// `moves.txt`-shaped rule lines. Absent means no legality ruleset
    /// is attached to this state.
    #[serde(default)]
    pub moves: Option<Vec<String>>,

    /// False for leapers (knights) whose moves ignore blockers.
    #[serde(default = "default_true")]
    pub needs_clear_path: bool,

    /// Sprite frames the loader found for this state. Zero is a library
    /// error.
    #[serde(default = "default_frames")]
    pub frames: usize,

    #[serde(default)]
    pub graphics: GraphicsConfig,

    #[serde(default)]
    pub physics: PhysicsConfig,
}

fn default_true() -> bool {
    true
}

fn default_frames() -> usize {
    1
}

impl StateSpec {
    /// A state with defaults (one frame, no moves, clear-path required).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            moves: None,
            needs_clear_path: true,
            frames: default_frames(),
            graphics: GraphicsConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }

    /// Attach move-rule lines.
    #[must_use]
    pub fn with_moves(mut self, lines: &[&str]) -> Self {
        self.moves = Some(lines.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Mark the piece as a leaper (no path-clear checks).
    #[must_use]
    pub fn leaper(mut self) -> Self {
        self.needs_clear_path = false;
        self
    }

    /// Set the sprite frame count.
    #[must_use]
    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    /// Set physics parameters.
    #[must_use]
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }
}

/// A complete piece-type definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PieceTypeSpec {
    /// Type code, e.g. `KW`, `PB`. Second character is the side marker.
    pub code: String,

    /// Named states.
    #[serde(default)]
    pub states: Vec<StateSpec>,

    /// Raw `transitions.csv`-shaped override rows
    /// (`from_state,event,to_state`); header and comment rows allowed.
    #[serde(default)]
    pub transitions: Vec<String>,
}

impl PieceTypeSpec {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: StateSpec) -> Self {
        self.states.push(state);
        self
    }

    #[must_use]
    pub fn with_transitions(mut self, rows: &[&str]) -> Self {
        self.transitions
            .extend(rows.iter().map(|s| (*s).to_string()));
        self
    }
}

/// Parse a `board.csv`-shaped placement grid: one line per row, cells
/// separated by commas, a type code or blank per cell.
#[must_use]
pub fn parse_placements(text: &str) -> Vec<(String, Cell)> {
    let mut placements = Vec::new();
    for (row, line) in text.lines().enumerate() {
        for (col, token) in line.split(',').enumerate() {
            let code = token.trim();
            if code.is_empty() {
                continue;
            }
            placements.push((code.to_string(), Cell::new(row as i32, col as i32)));
        }
    }
    placements
}
