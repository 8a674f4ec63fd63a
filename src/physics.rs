//! Per-state motion and timing drivers.
//!
//! Each automaton state owns one `Physics` driver. A driver tracks the
//! piece's position in metres, reports the cell it currently occupies and
//! the timestamp at which the state was entered, and on each tick may
//! synthesize a [`Command`] to drive an autonomous transition (motion
//! complete, rest timer elapsed).
//!
//! The capture flags live here because they are state-dependent: an idle
//! piece cannot capture, a jumping piece cannot be captured, a resting
//! piece blocks movement but cannot capture.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::core::{Cell, Command, EventKind};

/// Motion/timing model for one automaton state.
///
/// `reset` re-seeds the driver from a command's timestamp and cell
/// parameters. Drivers tolerate missing parameters by keeping their
/// previous placement and only re-baselining the start timestamp; a
/// freshly placed piece always receives a synthetic `idle` command with
/// its placement cell before its first tick.
pub trait Physics: Send {
    /// Re-initialize from a command (timestamp + cell parameters).
    fn reset(&mut self, cmd: &Command);

    /// Advance to `now_ms`. May return a synthetic command (e.g. `done`
    /// when motion completes) to drive an autonomous transition.
    fn update(&mut self, now_ms: u64) -> Option<Command>;

    /// Current position in metres, as `(x, y)`.
    fn pos_m(&self) -> (f64, f64);

    /// The board cell currently occupied.
    fn curr_cell(&self) -> Cell;

    /// Timestamp at which this state was entered. Collision arbitration
    /// compares these to pick the capture winner.
    fn start_ms(&self) -> u64;

    /// Whether a piece in this state may capture on collision.
    fn can_capture(&self) -> bool {
        true
    }

    /// Whether a piece in this state may be captured on collision.
    fn can_be_captured(&self) -> bool {
        true
    }

    /// Whether a piece in this state blocks sliding movement.
    fn is_movement_blocker(&self) -> bool {
        false
    }
}

/// Shared placement bookkeeping for the stock drivers.
#[derive(Clone, Debug)]
struct Placement {
    board: Arc<Board>,
    start_cell: Cell,
    pos_m: (f64, f64),
    start_ms: u64,
}

impl Placement {
    fn new(board: Arc<Board>, start_cell: Cell) -> Self {
        let pos_m = board.cell_to_m(start_cell);
        Self {
            board,
            start_cell,
            pos_m,
            start_ms: 0,
        }
    }

    /// Re-seed from a command; keeps the previous cell when the command
    /// carries no placement parameter.
    fn rebase(&mut self, cmd: &Command) {
        if let Some(cell) = cmd.source() {
            self.start_cell = cell;
            self.pos_m = self.board.cell_to_m(cell);
        }
        self.start_ms = cmd.timestamp_ms;
    }

    fn curr_cell(&self) -> Cell {
        self.board.m_to_cell(self.pos_m.0, self.pos_m.1)
    }
}

/// Stationary driver for `idle` states. Cannot capture; blocks movement.
pub struct IdlePhysics {
    placement: Placement,
}

impl IdlePhysics {
    #[must_use]
    pub fn new(board: Arc<Board>, start_cell: Cell) -> Self {
        Self {
            placement: Placement::new(board, start_cell),
        }
    }
}

impl Physics for IdlePhysics {
    fn reset(&mut self, cmd: &Command) {
        self.placement.rebase(cmd);
    }

    fn update(&mut self, _now_ms: u64) -> Option<Command> {
        None
    }

    fn pos_m(&self) -> (f64, f64) {
        self.placement.pos_m
    }

    fn curr_cell(&self) -> Cell {
        self.placement.curr_cell()
    }

    fn start_ms(&self) -> u64 {
        self.placement.start_ms
    }

    fn can_capture(&self) -> bool {
        false
    }

    fn is_movement_blocker(&self) -> bool {
        true
    }
}

/// Constant-speed interpolation between two cells.
///
/// Emits `done` (carrying the destination cell) once the traversal
/// duration has elapsed.
pub struct MovePhysics {
    placement: Placement,
    speed_m_s: f64,
    end_cell: Cell,
    dir: (f64, f64),
    duration_s: f64,
}

impl MovePhysics {
    /// `speed_m_s` must be positive; non-positive speeds fall back to 1.
    #[must_use]
    pub fn new(board: Arc<Board>, start_cell: Cell, speed_m_s: f64) -> Self {
        let speed_m_s = if speed_m_s > 0.0 { speed_m_s } else { 1.0 };
        Self {
            placement: Placement::new(board, start_cell),
            speed_m_s,
            end_cell: start_cell,
            dir: (0.0, 0.0),
            duration_s: 0.0,
        }
    }
}

impl Physics for MovePhysics {
    fn reset(&mut self, cmd: &Command) {
        self.placement.rebase(cmd);
        self.end_cell = cmd.destination().unwrap_or(self.placement.start_cell);

        let start = self.placement.board.cell_to_m(self.placement.start_cell);
        let end = self.placement.board.cell_to_m(self.end_cell);
        let vec = (end.0 - start.0, end.1 - start.1);
        let len = vec.0.hypot(vec.1);
        if len > 0.0 {
            self.dir = (vec.0 / len, vec.1 / len);
            self.duration_s = len / self.speed_m_s;
        } else {
            self.dir = (0.0, 0.0);
            self.duration_s = 0.0;
        }
    }

    fn update(&mut self, now_ms: u64) -> Option<Command> {
        let seconds = (now_ms.saturating_sub(self.placement.start_ms)) as f64 / 1000.0;
        let start = self.placement.board.cell_to_m(self.placement.start_cell);
        let travelled = (seconds * self.speed_m_s).min(self.duration_s * self.speed_m_s);
        self.placement.pos_m = (
            start.0 + self.dir.0 * travelled,
            start.1 + self.dir.1 * travelled,
        );

        if seconds >= self.duration_s {
            return Some(Command::internal(now_ms, EventKind::Done, &[self.end_cell]));
        }
        None
    }

    fn pos_m(&self) -> (f64, f64) {
        self.placement.pos_m
    }

    fn curr_cell(&self) -> Cell {
        self.placement.curr_cell()
    }

    fn start_ms(&self) -> u64 {
        self.placement.start_ms
    }
}

/// Stationary driver that emits `done` after a fixed duration.
///
/// Used for jumps and post-action rest states; the capture flags vary by
/// role, so they are constructor parameters.
pub struct StaticTemporaryPhysics {
    placement: Placement,
    duration_s: f64,
    can_capture: bool,
    can_be_captured: bool,
    movement_blocker: bool,
}

impl StaticTemporaryPhysics {
    /// A jump: briefly airborne, cannot be captured while up.
    #[must_use]
    pub fn jump(board: Arc<Board>, start_cell: Cell, duration_s: f64) -> Self {
        Self {
            placement: Placement::new(board, start_cell),
            duration_s,
            can_capture: true,
            can_be_captured: false,
            movement_blocker: false,
        }
    }

    /// A rest: exhausted after acting, cannot capture, blocks movement.
    #[must_use]
    pub fn rest(board: Arc<Board>, start_cell: Cell, duration_s: f64) -> Self {
        Self {
            placement: Placement::new(board, start_cell),
            duration_s,
            can_capture: false,
            can_be_captured: true,
            movement_blocker: true,
        }
    }
}

impl Physics for StaticTemporaryPhysics {
    fn reset(&mut self, cmd: &Command) {
        self.placement.rebase(cmd);
    }

    fn update(&mut self, now_ms: u64) -> Option<Command> {
        let seconds = (now_ms.saturating_sub(self.placement.start_ms)) as f64 / 1000.0;
        if seconds >= self.duration_s {
            return Some(Command::internal(
                now_ms,
                EventKind::Done,
                &[self.placement.start_cell],
            ));
        }
        None
    }

    fn pos_m(&self) -> (f64, f64) {
        self.placement.pos_m
    }

    fn curr_cell(&self) -> Cell {
        self.placement.curr_cell()
    }

    fn start_ms(&self) -> u64 {
        self.placement.start_ms
    }

    fn can_capture(&self) -> bool {
        self.can_capture
    }

    fn can_be_captured(&self) -> bool {
        self.can_be_captured
    }

    fn is_movement_blocker(&self) -> bool {
        self.movement_blocker
    }
}

/// Per-state physics parameters, as found in a state's `config.json`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Traversal speed for `move` states.
    #[serde(default)]
    pub speed_m_per_sec: Option<f64>,

    /// Timer length for jump/rest states.
    #[serde(default)]
    pub duration_ms: Option<f64>,
}

/// Builds a physics driver from a state name and its configuration.
///
/// Dispatch is by state name: `move` gets interpolation, `jump` gets an
/// airborne timer, names ending in `rest` get an exhausted timer, and
/// everything else (including `idle`) is stationary.
#[derive(Clone, Debug)]
pub struct PhysicsFactory {
    board: Arc<Board>,
}

impl PhysicsFactory {
    #[must_use]
    pub fn new(board: Arc<Board>) -> Self {
        Self { board }
    }

    /// Create a driver for a state, placed at `start_cell`.
    #[must_use]
    pub fn create(&self, start_cell: Cell, state_name: &str, cfg: &PhysicsConfig) -> Box<dyn Physics> {
        let name = state_name.to_ascii_lowercase();
        let board = Arc::clone(&self.board);

        if name == "move" {
            let speed = cfg.speed_m_per_sec.unwrap_or(1.0);
            Box::new(MovePhysics::new(board, start_cell, speed))
        } else if name == "jump" {
            let duration_s = cfg.duration_ms.unwrap_or(1000.0) / 1000.0;
            Box::new(StaticTemporaryPhysics::jump(board, start_cell, duration_s))
        } else if name.ends_with("rest") {
            let duration_s = cfg.duration_ms.unwrap_or(3000.0) / 1000.0;
            Box::new(StaticTemporaryPhysics::rest(board, start_cell, duration_s))
        } else {
            Box::new(IdlePhysics::new(board, start_cell))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn board() -> Arc<Board> {
        Arc::new(Board::standard(32))
    }

    fn move_cmd(ts: u64, src: Cell, dst: Cell) -> Command {
        Command {
            timestamp_ms: ts,
            piece_id: None,
            kind: EventKind::Move,
            params: smallvec![src, dst],
        }
    }

    #[test]
    fn test_idle_reports_placement_cell() {
        let mut phys = IdlePhysics::new(board(), Cell::new(0, 0));
        phys.reset(&Command::internal(10, EventKind::Idle, &[Cell::new(3, 4)]));

        assert_eq!(phys.curr_cell(), Cell::new(3, 4));
        assert_eq!(phys.start_ms(), 10);
        assert!(!phys.can_capture());
        assert!(phys.can_be_captured());
        assert!(phys.update(99_999).is_none());
    }

    #[test]
    fn test_idle_reset_without_cell_keeps_placement() {
        let mut phys = IdlePhysics::new(board(), Cell::new(2, 2));
        phys.reset(&Command::internal(50, EventKind::Idle, &[]));

        assert_eq!(phys.curr_cell(), Cell::new(2, 2));
        assert_eq!(phys.start_ms(), 50);
    }

    #[test]
    fn test_move_interpolates_and_completes() {
        // 1 m/s across 2 cells of 1m: done at 2000ms.
        let mut phys = MovePhysics::new(board(), Cell::new(0, 0), 1.0);
        phys.reset(&move_cmd(0, Cell::new(0, 0), Cell::new(0, 2)));

        assert!(phys.update(500).is_none());
        assert_eq!(phys.curr_cell(), Cell::new(0, 1)); // 0.5m rounds up
        assert!(phys.update(1000).is_none());
        assert_eq!(phys.curr_cell(), Cell::new(0, 1));

        let done = phys.update(2000).expect("move should complete");
        assert_eq!(done.kind, EventKind::Done);
        assert_eq!(done.source(), Some(Cell::new(0, 2)));
        assert_eq!(phys.curr_cell(), Cell::new(0, 2));
    }

    #[test]
    fn test_move_start_ms_is_command_timestamp() {
        let mut phys = MovePhysics::new(board(), Cell::new(0, 0), 1.0);
        phys.reset(&move_cmd(777, Cell::new(0, 0), Cell::new(0, 1)));
        assert_eq!(phys.start_ms(), 777);
    }

    #[test]
    fn test_move_to_same_cell_completes_immediately() {
        let mut phys = MovePhysics::new(board(), Cell::new(4, 4), 1.0);
        phys.reset(&move_cmd(0, Cell::new(4, 4), Cell::new(4, 4)));

        assert!(phys.update(0).is_some());
    }

    #[test]
    fn test_jump_is_invulnerable_until_done() {
        let mut phys = StaticTemporaryPhysics::jump(board(), Cell::new(1, 1), 0.5);
        phys.reset(&Command::internal(0, EventKind::Jump, &[Cell::new(1, 1)]));

        assert!(!phys.can_be_captured());
        assert!(phys.update(499).is_none());
        let done = phys.update(500).expect("jump timer should fire");
        assert_eq!(done.kind, EventKind::Done);
    }

    #[test]
    fn test_rest_cannot_capture() {
        let phys = StaticTemporaryPhysics::rest(board(), Cell::new(1, 1), 3.0);
        assert!(!phys.can_capture());
        assert!(phys.can_be_captured());
        assert!(phys.is_movement_blocker());
    }

    #[test]
    fn test_factory_dispatch_by_state_name() {
        let factory = PhysicsFactory::new(board());
        let cfg = PhysicsConfig::default();
        let cell = Cell::new(0, 0);

        assert!(!factory.create(cell, "idle", &cfg).can_capture());
        assert!(!factory.create(cell, "jump", &cfg).can_be_captured());
        assert!(!factory.create(cell, "long_rest", &cfg).can_capture());
        assert!(factory.create(cell, "move", &cfg).can_capture());
        // Unknown names fall back to a stationary driver.
        assert!(factory.create(cell, "mystery", &cfg).is_movement_blocker());
    }

    #[test]
    fn test_config_json_shape() {
        let cfg: PhysicsConfig =
            serde_json::from_str(r#"{"speed_m_per_sec": 2.5, "duration_ms": 1500}"#).unwrap();
        assert_eq!(cfg.speed_m_per_sec, Some(2.5));
        assert_eq!(cfg.duration_ms, Some(1500.0));

        let empty: PhysicsConfig = serde_json::from_str("{}").unwrap();
        assert!(empty.speed_m_per_sec.is_none());
    }
}
