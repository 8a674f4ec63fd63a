//! The authoritative game: roster, tick loop, collision arbitration.
//!
//! One single-threaded tick loop owns all simulation state. The only
//! structure shared with other threads is the input command queue;
//! producers enqueue, the loop drains. A tick is:
//!
//! 1. advance every piece's physics (autonomous transitions),
//! 2. rebuild the occupancy index from piece positions,
//! 3. drain the input queue in FIFO order and apply each command,
//! 4. resolve collisions (timing-based capture arbitration),
//! 5. check the win condition.
//!
//! Capture arbitration: among pieces sharing a cell, the one that entered
//! its current state most recently (maximum physics start timestamp) is
//! the winner — its move caused the collision. The winner captures every
//! co-occupant that can be captured, provided it can capture at all.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::board::Board;
use crate::core::{Cell, Command, CommandQueue, CommandSink, GameClock};
use crate::error::EngineError;
use crate::pieces::{Piece, Side};

/// The full game: piece roster, board, clock, and input queue.
pub struct Game {
    pieces: Vec<Piece>,
    board: Arc<Board>,
    clock: GameClock,
    queue: CommandQueue,
    /// Roster position by id. Derived: rebuilt whenever the roster
    /// changes, never the source of truth.
    by_id: FxHashMap<String, usize>,
}

impl Game {
    /// Validate the initial placement and build a game.
    ///
    /// Fails when two same-side pieces share a cell or when either side
    /// does not have exactly one king. No partially-constructed game is
    /// returned. Two *opposite*-side pieces may share a starting cell;
    /// the first tick resolves the collision.
    pub fn new(pieces: Vec<Piece>, board: Arc<Board>) -> Result<Self, EngineError> {
        Self::validate(&pieces)?;

        let mut game = Self {
            pieces,
            board,
            clock: GameClock::new(),
            queue: CommandQueue::new(),
            by_id: FxHashMap::default(),
        };
        game.rebuild_id_index();
        Ok(game)
    }

    fn validate(pieces: &[Piece]) -> Result<(), EngineError> {
        let mut occupant_side: FxHashMap<Cell, Side> = FxHashMap::default();
        let mut white_kings = 0usize;
        let mut black_kings = 0usize;

        for piece in pieces {
            let Some(side) = piece.id().side() else {
                return Err(EngineError::InvalidBoard(format!(
                    "piece `{}` has no side marker",
                    piece.id()
                )));
            };

            let cell = piece.current_cell();
            if let Some(prev) = occupant_side.insert(cell, side) {
                if prev == side {
                    return Err(EngineError::InvalidBoard(format!(
                        "two {side} pieces share cell {cell}"
                    )));
                }
            }

            if piece.id().is_king() {
                match side {
                    Side::White => white_kings += 1,
                    Side::Black => black_kings += 1,
                }
            }
        }

        if white_kings != 1 || black_kings != 1 {
            return Err(EngineError::InvalidBoard(format!(
                "expected exactly one king per side, found {white_kings} white / {black_kings} black"
            )));
        }
        Ok(())
    }

    fn rebuild_id_index(&mut self) {
        self.by_id = self
            .pieces
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id().as_str().to_string(), i))
            .collect();
    }

    /// The board.
    #[must_use]
    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    /// Live piece roster (read access, for rendering).
    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Look up a piece by id.
    #[must_use]
    pub fn piece(&self, id: &str) -> Option<&Piece> {
        self.by_id.get(id).map(|&i| &self.pieces[i])
    }

    /// A sink for feeding commands into this game from any thread.
    #[must_use]
    pub fn sink(&self) -> CommandSink {
        self.queue.sink()
    }

    /// Current simulation time in milliseconds.
    #[must_use]
    pub fn game_time_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Scale simulation time (tests run faster than wall clock).
    pub fn set_time_factor(&mut self, factor: u64) {
        self.clock.set_time_factor(factor);
    }

    /// True once fewer than two kings remain.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.kings_remaining() < 2
    }

    fn kings_remaining(&self) -> usize {
        self.pieces.iter().filter(|p| p.id().is_king()).count()
    }

    /// Run the tick loop until the win condition holds, or for at most
    /// `max_iterations` ticks when a cap is supplied (a cap of zero
    /// runs no tick at all).
    pub fn run(&mut self, max_iterations: Option<u64>) {
        let start_ms = self.game_time_ms();
        for piece in &mut self.pieces {
            piece.reset(start_ms);
        }

        let mut counter = 0u64;
        while !self.is_win() {
            if max_iterations.is_some_and(|cap| counter >= cap) {
                break;
            }
            self.tick();
            counter += 1;
        }

        if self.is_win() {
            self.announce_win();
        }
    }

    /// One pass of the loop: physics, occupancy, input, collisions.
    pub fn tick(&mut self) {
        let now = self.game_time_ms();

        // Physics advance. Nothing is removed in this phase; captures
        // happen later in the same tick.
        for piece in &mut self.pieces {
            piece.update(now);
        }

        let occupied: FxHashSet<Cell> = self.pieces.iter().map(Piece::current_cell).collect();

        // Drain completely, in FIFO arrival order.
        for cmd in self.queue.drain() {
            self.process_input(&cmd, &occupied);
        }

        self.resolve_collisions();
    }

    fn process_input(&mut self, cmd: &Command, occupied: &FxHashSet<Cell>) {
        let Some(id) = cmd.piece_id.as_deref() else {
            tracing::debug!(?cmd, "dropping command with no target piece");
            return;
        };
        let Some(&idx) = self.by_id.get(id) else {
            // The target may have been captured earlier this tick.
            tracing::debug!(id, "dropping command for unknown piece");
            return;
        };
        self.pieces[idx].on_command(cmd, Some(occupied));
    }

    /// Timing-based capture arbitration over a fresh occupancy grouping.
    fn resolve_collisions(&mut self) {
        let mut occupancy: FxHashMap<Cell, Vec<usize>> = FxHashMap::default();
        for (idx, piece) in self.pieces.iter().enumerate() {
            occupancy.entry(piece.current_cell()).or_default().push(idx);
        }

        let mut captured: FxHashSet<usize> = FxHashSet::default();
        for (cell, occupants) in &occupancy {
            if occupants.len() < 2 {
                continue;
            }

            // The most recent arrival caused the collision and is
            // credited with the capture. Tie order is unspecified.
            let winner = *occupants
                .iter()
                .max_by_key(|&&idx| self.pieces[idx].start_ms())
                .expect("occupant list is non-empty");

            if !self.pieces[winner].can_capture() {
                continue;
            }

            for &idx in occupants {
                if idx != winner && self.pieces[idx].can_be_captured() {
                    tracing::info!(
                        captured = %self.pieces[idx].id(),
                        by = %self.pieces[winner].id(),
                        cell = %cell,
                        "capture"
                    );
                    captured.insert(idx);
                }
            }
        }

        if !captured.is_empty() {
            let mut idx = 0;
            self.pieces.retain(|_| {
                let keep = !captured.contains(&idx);
                idx += 1;
                keep
            });
            self.rebuild_id_index();
        }
    }

    fn announce_win(&self) {
        let black_remains = self
            .pieces
            .iter()
            .any(|p| p.id().is_king() && p.id().side() == Some(Side::Black));
        let winner = if black_remains { Side::Black } else { Side::White };
        tracing::info!(%winner, "game over");
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("pieces", &self.pieces.len())
            .field("kings", &self.kings_remaining())
            .finish()
    }
}
