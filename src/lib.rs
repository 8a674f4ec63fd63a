//! # kfchess
//!
//! A real-time ("kung-fu") chess engine. Pieces move continuously rather
//! than in alternating turns; each piece is driven by its own animated
//! finite-state machine, and captures are resolved by comparing *when*
//! colliding pieces entered their current motion, not by move order.
//!
//! ## Design Principles
//!
//! 1. **One owner for simulation state**: a single-threaded tick loop
//!    owns the roster, occupancy, and indices. The only cross-thread
//!    structure is the input command queue.
//!
//! 2. **Templates are immutable, instances are private**: each piece
//!    type's automaton is built once and only ever cloned; every placed
//!    piece exclusively owns its clone.
//!
//! 3. **Permissive at the input boundary**: unknown targets, stale
//!    sources, and illegal moves are dropped, never errors — real-time
//!    input legitimately races the simulation.
//!
//! ## Modules
//!
//! - `core`: cells, commands, the simulation clock, the command queue
//! - `board`: grid dimensions and coordinate conversions
//! - `moves`: move-legality rulesets (pattern, bounds, blocking)
//! - `physics`: per-state motion/timing drivers
//! - `graphics`: observational animation drivers
//! - `state`: template and instance automata
//! - `pieces`: piece identity, the type library, the factory
//! - `game`: the authoritative tick loop and capture arbitration
//! - `input`: producer threads feeding the command queue
//! - `error`: construction-time failure taxonomy

pub mod board;
pub mod core;
pub mod error;
pub mod game;
pub mod graphics;
pub mod input;
pub mod moves;
pub mod physics;
pub mod pieces;
pub mod state;

// Re-export commonly used types
pub use crate::core::{Cell, Command, CommandQueue, CommandSink, EventKind, GameClock};

pub use crate::board::Board;
pub use crate::error::EngineError;
pub use crate::game::Game;
pub use crate::graphics::{Animation, GraphicsConfig};
pub use crate::input::{CommandProducer, CommandSource};
pub use crate::moves::{CaptureTag, Moves};
pub use crate::physics::{
    IdlePhysics, MovePhysics, Physics, PhysicsConfig, PhysicsFactory, StaticTemporaryPhysics,
};
pub use crate::pieces::{
    parse_placements, Piece, PieceFactory, PieceId, PieceTypeSpec, Side, StateSpec,
};
pub use crate::state::{Automaton, State, StateId, TemplateAutomaton, TemplateState};
