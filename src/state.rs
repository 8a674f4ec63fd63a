//! Piece automata: templates and per-piece instances.
//!
//! An automaton is a directed, generally cyclic graph of states rooted at
//! `idle`. To keep cycles and self-loops cheap and safe, states live in
//! an arena (`Vec`) and edges are stable [`StateId`] indices rather than
//! owned references.
//!
//! Two flavors exist:
//! - [`TemplateAutomaton`]: one per piece *type*, immutable after library
//!   construction, holding per-state physics configuration instead of
//!   live drivers.
//! - [`Automaton`]: one per placed *piece*, exclusively owned by it, with
//!   live physics and animation per state.
//!
//! The transition rules: an unmatched event is a no-op; a matched `move`
//! event with a legality ruleset and an occupancy context is gated on a
//! fresh source cell and the ruleset; every other matched edge is taken
//! unconditionally. Physics-synthesized commands arrive with no occupancy
//! context and therefore bypass legality — they do not cross a trust
//! boundary.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{Cell, Command, EventKind};
use crate::graphics::Animation;
use crate::moves::Moves;
use crate::physics::{Physics, PhysicsConfig};

/// Index of a state within its automaton's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId(pub u16);

impl StateId {
    /// Create a state ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of a piece-type template: configuration, no live drivers.
#[derive(Clone, Debug)]
pub struct TemplateState {
    name: String,
    moves: Option<Arc<Moves>>,
    animation: Animation,
    physics_cfg: PhysicsConfig,
    transitions: FxHashMap<EventKind, StateId>,
}

impl TemplateState {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        moves: Option<Arc<Moves>>,
        animation: Animation,
        physics_cfg: PhysicsConfig,
    ) -> Self {
        Self {
            name: name.into(),
            moves,
            animation,
            physics_cfg,
            transitions: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register/overwrite the outgoing edge for an event.
    pub fn set_transition(&mut self, event: EventKind, target: StateId) {
        self.transitions.insert(event, target);
    }

    #[must_use]
    pub fn transition(&self, event: &EventKind) -> Option<StateId> {
        self.transitions.get(event).copied()
    }

    /// All outgoing edges.
    pub fn transitions(&self) -> impl Iterator<Item = (&EventKind, StateId)> {
        self.transitions.iter().map(|(k, v)| (k, *v))
    }

    #[must_use]
    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    #[must_use]
    pub fn moves(&self) -> Option<&Arc<Moves>> {
        self.moves.as_ref()
    }

    #[must_use]
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    #[must_use]
    pub fn physics_cfg(&self) -> &PhysicsConfig {
        &self.physics_cfg
    }
}

/// A piece type's template automaton.
///
/// Never mutated after library construction; every placed piece clones
/// the subgraph reachable from `idle`.
#[derive(Clone, Debug)]
pub struct TemplateAutomaton {
    states: Vec<TemplateState>,
    idle: Option<StateId>,
}

impl TemplateAutomaton {
    /// Build from a state set; the entry point is the state named `idle`,
    /// if present. Types without one are unusable for placement.
    #[must_use]
    pub fn new(states: Vec<TemplateState>) -> Self {
        let idle = states
            .iter()
            .position(|s| s.name == "idle")
            .map(|i| StateId::new(i as u16));
        Self { states, idle }
    }

    /// The idle root, if the type has one.
    #[must_use]
    pub fn idle(&self) -> Option<StateId> {
        self.idle
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &TemplateState {
        &self.states[id.index()]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut TemplateState {
        &mut self.states[id.index()]
    }

    /// Look up a state by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(|i| StateId::new(i as u16))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// One node of a placed piece's automaton, with live drivers.
///
/// The legality ruleset is shared with the template (read-only); the
/// animation and physics drivers are private to this instance.
pub struct State {
    name: String,
    moves: Option<Arc<Moves>>,
    animation: Animation,
    physics: Box<dyn Physics>,
    transitions: FxHashMap<EventKind, StateId>,
}

impl State {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        moves: Option<Arc<Moves>>,
        animation: Animation,
        physics: Box<dyn Physics>,
    ) -> Self {
        Self {
            name: name.into(),
            moves,
            animation,
            physics,
            transitions: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register/overwrite the outgoing edge for an event.
    pub fn set_transition(&mut self, event: EventKind, target: StateId) {
        self.transitions.insert(event, target);
    }

    #[must_use]
    pub fn transition(&self, event: &EventKind) -> Option<StateId> {
        self.transitions.get(event).copied()
    }

    /// All outgoing edges.
    pub fn transitions(&self) -> impl Iterator<Item = (&EventKind, StateId)> {
        self.transitions.iter().map(|(k, v)| (k, *v))
    }

    /// Re-initialize the animation and physics drivers from a command.
    pub fn reset(&mut self, cmd: &Command) {
        self.animation.reset(cmd);
        self.physics.reset(cmd);
    }

    #[must_use]
    pub fn physics(&self) -> &dyn Physics {
        self.physics.as_ref()
    }

    #[must_use]
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    #[must_use]
    pub fn curr_cell(&self) -> Cell {
        self.physics.curr_cell()
    }

    #[must_use]
    pub fn start_ms(&self) -> u64 {
        self.physics.start_ms()
    }

    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.physics.can_capture()
    }

    #[must_use]
    pub fn can_be_captured(&self) -> bool {
        self.physics.can_be_captured()
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "State({})", self.name)
    }
}

/// A placed piece's private automaton.
pub struct Automaton {
    states: Vec<State>,
    idle: StateId,
}

impl Automaton {
    /// `idle` must index into `states`.
    #[must_use]
    pub fn new(states: Vec<State>, idle: StateId) -> Self {
        debug_assert!(idle.index() < states.len());
        Self { states, idle }
    }

    /// The idle root.
    #[must_use]
    pub fn idle(&self) -> StateId {
        self.idle
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Apply a command to the state `current` and return the next state.
    ///
    /// - No matching edge: no-op, returns `current`.
    /// - A `move` edge with a legality ruleset, two cell parameters, and
    ///   an occupancy context: rejected when the declared source is stale
    ///   (does not match the physics-reported cell) or the ruleset says
    ///   no. Accepted moves reset the target with this command.
    /// - Any other matched edge: taken unconditionally.
    pub fn handle_command(
        &mut self,
        current: StateId,
        cmd: &Command,
        occupied: Option<&FxHashSet<Cell>>,
    ) -> StateId {
        let st = &self.states[current.index()];
        let Some(next) = st.transition(&cmd.kind) else {
            return current;
        };

        if cmd.kind == EventKind::Move {
            if let (Some(rules), Some(occupied)) = (&st.moves, occupied) {
                if let (Some(src), Some(dst)) = (cmd.source(), cmd.destination()) {
                    if src != st.physics.curr_cell() {
                        tracing::debug!(
                            state = %st.name,
                            declared = %src,
                            actual = %st.physics.curr_cell(),
                            "rejecting stale move command"
                        );
                        return current;
                    }
                    if !rules.is_valid(src, dst, occupied) {
                        tracing::debug!(state = %st.name, from = %src, to = %dst, "illegal move");
                        return current;
                    }
                }
            }
        }

        self.states[next.index()].reset(cmd);
        next
    }

    /// Advance the state `current` to `now_ms`.
    ///
    /// When physics synthesizes a command (motion complete, timer fired)
    /// it is fed back with no occupancy context: autonomous transitions
    /// bypass legality checks.
    pub fn tick(&mut self, current: StateId, now_ms: u64) -> StateId {
        let st = &mut self.states[current.index()];
        st.animation.update(now_ms);
        if let Some(internal) = st.physics.update(now_ms) {
            return self.handle_command(current, &internal, None);
        }
        current
    }
}

impl std::fmt::Debug for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automaton")
            .field("states", &self.states)
            .field("idle", &self.idle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::graphics::GraphicsConfig;
    use crate::physics::{IdlePhysics, MovePhysics};
    use smallvec::smallvec;

    fn board() -> Arc<Board> {
        Arc::new(Board::standard(32))
    }

    fn anim() -> Animation {
        Animation::new(1, &GraphicsConfig::default())
    }

    fn rules(lines: &[&str]) -> Arc<Moves> {
        Arc::new(Moves::parse(lines.iter().copied(), (8, 8), true).unwrap())
    }

    fn occ(cells: &[Cell]) -> FxHashSet<Cell> {
        cells.iter().copied().collect()
    }

    /// idle --move--> move --done--> idle, idle at `cell`.
    fn two_state_automaton(cell: Cell, move_rules: Arc<Moves>) -> Automaton {
        let mut idle = State::new(
            "idle",
            Some(Arc::clone(&move_rules)),
            anim(),
            Box::new(IdlePhysics::new(board(), cell)),
        );
        let mut mv = State::new(
            "move",
            Some(move_rules),
            anim(),
            Box::new(MovePhysics::new(board(), cell, 1.0)),
        );
        idle.set_transition(EventKind::Move, StateId::new(1));
        mv.set_transition(EventKind::Done, StateId::new(0));

        let mut auto = Automaton::new(vec![idle, mv], StateId::new(0));
        let place = Command::internal(0, EventKind::Idle, &[cell]);
        auto.state_mut(StateId::new(0)).reset(&place);
        auto
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
    fn test_unmatched_event_is_noop() {
        let mut auto = two_state_automaton(Cell::new(0, 0), rules(&["0,1"]));
        let next = auto.handle_command(
            StateId::new(0),
            &Command::internal(5, EventKind::Jump, &[]),
            Some(&occ(&[])),
        );
        assert_eq!(next, StateId::new(0));
    }

    #[test]
    fn test_legal_move_is_accepted_and_resets_target() {
        let mut auto = two_state_automaton(Cell::new(0, 0), rules(&["0,1"]));
        let next = auto.handle_command(
            StateId::new(0),
            &move_cmd(42, Cell::new(0, 0), Cell::new(0, 1)),
            Some(&occ(&[Cell::new(0, 0)])),
        );

        assert_eq!(next, StateId::new(1));
        assert_eq!(auto.state(next).start_ms(), 42);
        assert_eq!(auto.state(next).curr_cell(), Cell::new(0, 0));
    }

    #[test]
    fn test_stale_source_is_rejected() {
        let mut auto = two_state_automaton(Cell::new(0, 0), rules(&["0,1"]));
        // Declared source does not match the physics-reported cell.
        let next = auto.handle_command(
            StateId::new(0),
            &move_cmd(42, Cell::new(3, 3), Cell::new(3, 4)),
            Some(&occ(&[])),
        );
        assert_eq!(next, StateId::new(0));
    }

    #[test]
    fn test_illegal_destination_is_rejected() {
        let mut auto = two_state_automaton(Cell::new(0, 0), rules(&["0,1"]));
        let next = auto.handle_command(
            StateId::new(0),
            &move_cmd(42, Cell::new(0, 0), Cell::new(5, 5)),
            Some(&occ(&[])),
        );
        assert_eq!(next, StateId::new(0));
    }

    #[test]
    fn test_move_without_occupancy_context_bypasses_legality() {
        let mut auto = two_state_automaton(Cell::new(0, 0), rules(&["0,1"]));
        // Same illegal destination, but no occupancy index supplied.
        let next = auto.handle_command(
            StateId::new(0),
            &move_cmd(42, Cell::new(0, 0), Cell::new(5, 5)),
            None,
        );
        assert_eq!(next, StateId::new(1));
    }

    #[test]
    fn test_autonomous_done_transition() {
        let mut auto = two_state_automaton(Cell::new(0, 0), rules(&["0,1"]));
        let mut current = auto.handle_command(
            StateId::new(0),
            &move_cmd(0, Cell::new(0, 0), Cell::new(0, 1)),
            Some(&occ(&[])),
        );
        assert_eq!(auto.state(current).name(), "move");

        // Mid-flight: still moving.
        current = auto.tick(current, 500);
        assert_eq!(auto.state(current).name(), "move");

        // 1m at 1 m/s: complete at 1000ms, physics emits done -> idle.
        current = auto.tick(current, 1000);
        assert_eq!(auto.state(current).name(), "idle");
        assert_eq!(auto.state(current).curr_cell(), Cell::new(0, 1));
    }

    #[test]
    fn test_self_loop_transition() {
        let mut idle = State::new(
            "idle",
            None,
            anim(),
            Box::new(IdlePhysics::new(board(), Cell::new(2, 2))),
        );
        idle.set_transition(EventKind::Idle, StateId::new(0));
        let mut auto = Automaton::new(vec![idle], StateId::new(0));

        let next = auto.handle_command(
            StateId::new(0),
            &Command::internal(9, EventKind::Idle, &[Cell::new(2, 2)]),
            None,
        );
        assert_eq!(next, StateId::new(0));
        assert_eq!(auto.state(next).start_ms(), 9);
    }

    #[test]
    fn test_template_idle_lookup() {
        let tmpl = TemplateAutomaton::new(vec![
            TemplateState::new("move", None, anim(), PhysicsConfig::default()),
            TemplateState::new("idle", None, anim(), PhysicsConfig::default()),
        ]);
        assert_eq!(tmpl.idle(), Some(StateId::new(1)));
        assert_eq!(tmpl.find("move"), Some(StateId::new(0)));

        let no_idle =
            TemplateAutomaton::new(vec![TemplateState::new("move", None, anim(), PhysicsConfig::default())]);
        assert_eq!(no_idle.idle(), None);
    }
}
