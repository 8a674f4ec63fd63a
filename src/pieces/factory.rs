//! The piece factory: template construction and cloning.
//!
//! Build phase (once per process): each [`PieceTypeSpec`] becomes one
//! immutable [`TemplateAutomaton`] in the type library. Clone phase (once
//! per placement): the template subgraph reachable from `idle` is
//! deep-cloned into a private [`Automaton`] with fresh physics per node.
//!
//! Template graphs are cyclic (states loop back to `idle`, and to
//! themselves), so the clone walks with an explicit original→clone map
//! and a work stack rather than recursion.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::board::Board;
use crate::core::{Cell, EventKind};
use crate::error::EngineError;
use crate::graphics::Animation;
use crate::moves::Moves;
use crate::physics::PhysicsFactory;
use crate::state::{Automaton, State, StateId, TemplateAutomaton, TemplateState};

use super::config::{parse_placements, PieceTypeSpec};
use super::piece::{Piece, PieceId};

/// Builds piece-type templates and instantiates pieces from them.
pub struct PieceFactory {
    board: Arc<Board>,
    physics: PhysicsFactory,
    templates: FxHashMap<String, TemplateAutomaton>,
}

impl PieceFactory {
    #[must_use]
    pub fn new(board: Arc<Board>) -> Self {
        let physics = PhysicsFactory::new(Arc::clone(&board));
        Self {
            board,
            physics,
            templates: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    /// Build one template per type spec and store it in the library.
    ///
    /// Fails fast on the first malformed type; the library keeps the
    /// types already built.
    pub fn generate_library(
        &mut self,
        specs: impl IntoIterator<Item = PieceTypeSpec>,
    ) -> Result<(), EngineError> {
        for spec in specs {
            let template = self.build_template(&spec)?;
            tracing::debug!(code = %spec.code, states = template.len(), "piece type built");
            self.templates.insert(spec.code, template);
        }
        Ok(())
    }

    /// Number of types in the library.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look up a built template.
    #[must_use]
    pub fn template(&self, code: &str) -> Option<&TemplateAutomaton> {
        self.templates.get(code)
    }

    fn build_template(&self, spec: &PieceTypeSpec) -> Result<TemplateAutomaton, EngineError> {
        if spec.states.is_empty() {
            return Err(EngineError::MalformedLibrary {
                type_code: spec.code.clone(),
                reason: "no states defined".to_string(),
            });
        }

        let dims = (self.board.h_cells(), self.board.w_cells());
        let mut states = Vec::with_capacity(spec.states.len());

        for state_spec in &spec.states {
            if state_spec.frames == 0 {
                return Err(EngineError::MalformedLibrary {
                    type_code: spec.code.clone(),
                    reason: format!("state `{}` has no animation frames", state_spec.name),
                });
            }

            let moves = match &state_spec.moves {
                Some(lines) => Some(Arc::new(
                    Moves::parse(
                        lines.iter().map(String::as_str),
                        dims,
                        state_spec.needs_clear_path,
                    )
                    .map_err(|e| e.for_type(&spec.code))?,
                )),
                None => None,
            };

            states.push(TemplateState::new(
                state_spec.name.clone(),
                moves,
                Animation::new(state_spec.frames, &state_spec.graphics),
                state_spec.physics.clone(),
            ));
        }

        let mut template = TemplateAutomaton::new(states);

        // Override rows: header/comment/short rows skipped, unknown
        // state names silently dropped.
        for row in &spec.transitions {
            let Some((from, event, to)) = parse_transition_row(row) else {
                continue;
            };
            match (template.find(&from), template.find(&to)) {
                (Some(src), Some(dst)) => template.state_mut(src).set_transition(event, dst),
                _ => {
                    tracing::debug!(
                        code = %spec.code,
                        row = %row,
                        "transition row references unknown state; dropped"
                    );
                }
            }
        }

        // Fallback repair: a transition-less idle would leave every
        // instance of this type permanently inert.
        if let Some(idle) = template.idle() {
            if !template.state(idle).has_transitions() {
                if let Some(mv) = template.find("move") {
                    template.state_mut(idle).set_transition(EventKind::Move, mv);
                }
                if let Some(jump) = template.find("jump") {
                    template.state_mut(idle).set_transition(EventKind::Jump, jump);
                }
            }
        }

        Ok(template)
    }

    /// Instantiate a piece of a library type at a cell.
    ///
    /// The piece id is `<code>_<cell>`; the fresh idle clone is reset
    /// with a synthetic `idle` command carrying the placement cell so its
    /// physics reports the right position immediately.
    pub fn create_piece(&self, code: &str, cell: Cell) -> Result<Piece, EngineError> {
        let template = self
            .templates
            .get(code)
            .ok_or_else(|| EngineError::UnknownPieceType(code.to_string()))?;
        let idle = template.idle().ok_or_else(|| EngineError::MalformedLibrary {
            type_code: code.to_string(),
            reason: "no idle state; type cannot be placed".to_string(),
        })?;

        let automaton = self.clone_automaton(template, idle, cell);
        let id = PieceId::for_placement(code, cell);
        let mut piece = Piece::new(id, automaton);
        piece.reset(0);
        piece.place(0, cell);
        Ok(piece)
    }

    /// Instantiate every placement in a `board.csv`-shaped grid.
    pub fn create_from_placements(&self, text: &str) -> Result<Vec<Piece>, EngineError> {
        parse_placements(text)
            .into_iter()
            .map(|(code, cell)| self.create_piece(&code, cell))
            .collect()
    }

    /// Deep-clone the template subgraph reachable from `idle`.
    ///
    /// Explicit visited-map + work-stack traversal: the graph is cyclic,
    /// so a naive recursive copy would not terminate. Rulesets are shared
    /// with the template (`Arc`); animation is copied; physics is built
    /// fresh for the placement cell.
    fn clone_automaton(&self, template: &TemplateAutomaton, idle: StateId, cell: Cell) -> Automaton {
        let mut clone_of: FxHashMap<StateId, StateId> = FxHashMap::default();
        let mut work = vec![idle];
        let mut clones: Vec<State> = Vec::new();

        while let Some(orig_id) = work.pop() {
            if clone_of.contains_key(&orig_id) {
                continue;
            }
            let orig = template.state(orig_id);
            clone_of.insert(orig_id, StateId::new(clones.len() as u16));
            clones.push(State::new(
                orig.name(),
                orig.moves().cloned(),
                orig.animation().clone(),
                self.physics.create(cell, orig.name(), orig.physics_cfg()),
            ));
            for (_, target) in orig.transitions() {
                work.push(target);
            }
        }

        // Reconnect every clone's edges to the corresponding clones;
        // every edge target was visited above, never a template node.
        for (orig_id, clone_id) in &clone_of {
            for (event, target) in template.state(*orig_id).transitions() {
                clones[clone_id.index()].set_transition(event.clone(), clone_of[&target]);
            }
        }

        Automaton::new(clones, clone_of[&idle])
    }
}

impl std::fmt::Debug for PieceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceFactory")
            .field("types", &self.templates.len())
            .finish()
    }
}

fn parse_transition_row(row: &str) -> Option<(String, EventKind, String)> {
    let line = row.trim();
    if line.is_empty()
        || line.starts_with('#')
        || line.to_ascii_lowercase().starts_with("from_state")
    {
        return None;
    }

    let mut parts = line.split(',');
    let from = parts.next()?.trim();
    let event = parts.next()?.trim();
    let to = parts.next()?.trim();
    if from.is_empty() || event.is_empty() || to.is_empty() {
        return None;
    }
    Some((from.to_string(), EventKind::parse(event), to.to_string()))
}
