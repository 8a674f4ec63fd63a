//! Engine error taxonomy.
//!
//! Construction-time and library-build-time failures are `Err` and
//! propagate immediately; no partially-constructed game or piece type is
//! ever returned. Per-tick failures (unknown target, stale source,
//! illegal move) are deliberately *not* errors: real-time input may race
//! ahead of or behind the simulation, so they degrade to no-ops.

use thiserror::Error;

/// Fatal errors raised while building the piece library or a game.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Initial placement violates a board invariant (same-side overlap,
    /// wrong king count).
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    /// A placement names a type code with no template in the library.
    #[error("unknown piece type `{0}`")]
    UnknownPieceType(String),

    /// A piece-type definition cannot produce a usable automaton.
    #[error("malformed piece type `{type_code}`: {reason}")]
    MalformedLibrary {
        type_code: String,
        reason: String,
    },

    /// A move-rule line did not parse.
    #[error("unparseable move rule `{0}`")]
    BadMoveRule(String),
}

impl EngineError {
    /// Attach a piece-type code to a library-build failure.
    #[must_use]
    pub fn for_type(self, type_code: &str) -> Self {
        match self {
            Self::BadMoveRule(reason) => Self::MalformedLibrary {
                type_code: type_code.to_string(),
                reason: format!("unparseable move rule `{reason}`"),
            },
            Self::MalformedLibrary { reason, .. } => Self::MalformedLibrary {
                type_code: type_code.to_string(),
                reason,
            },
            other => other,
        }
    }
}
