//! Pieces: identity, per-piece automata, and the type library/factory.

pub mod config;
pub mod factory;
pub mod piece;

pub use config::{parse_placements, PieceTypeSpec, StateSpec};
pub use factory::PieceFactory;
pub use piece::{Piece, PieceId, Side};
