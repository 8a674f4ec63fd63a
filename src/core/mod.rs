//! Core value types: cells, commands, the simulation clock, and the
//! cross-thread command queue.
//!
//! Everything here is plumbing shared by every other module; nothing in
//! `core` knows about boards, pieces, or the game loop.

pub mod cell;
pub mod clock;
pub mod command;
pub mod queue;

pub use cell::Cell;
pub use clock::GameClock;
pub use command::{Command, EventKind};
pub use queue::{CommandQueue, CommandSink};
