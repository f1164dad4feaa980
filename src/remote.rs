//! Boundary to the game server.
//!
//! The hosted game is driven through [`RemoteGame`]: the selector submits
//! its move as an action id and reads back the ids of every move played so
//! far. Browser automation itself lives outside this crate.
//!
//! [`LocalOpponent`] implements the trait in-process with a uniform random
//! opponent and serves its move list as SGF, the same way the server does.

use thiserror::Error;

use crate::action_space::{ActionId, ActionSpace, Move, RemainingActions, SgfMove};
use crate::board::Color;
use crate::engine::{Phase, QuantumGo};
use crate::rollout::player_at;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The operation had no effect and may be retried.
    #[error("transient remote failure: {0}")]
    Transient(String),
    #[error("remote failure: {0}")]
    Fatal(String),
    #[error("move {index} of the remote move list does not map to an action")]
    InvalidNotation { index: usize },
}

pub trait RemoteGame {
    /// Play `action` for our side.
    fn submit(&mut self, action: ActionId) -> Result<(), RemoteError>;

    /// Ids of all moves played so far, oldest first, including the
    /// opponent's latest reply.
    fn moves(&mut self) -> Result<Vec<ActionId>, RemoteError>;
}

/// Translate an SGF move list into ids, rejecting unmapped notation.
pub fn ids_from_sgf(space: &ActionSpace, sgf: &str) -> Result<Vec<ActionId>, RemoteError> {
    space
        .parse_sgf_moves(sgf)
        .into_iter()
        .enumerate()
        .map(|(index, mv)| match mv {
            SgfMove::Action(id) => Ok(id),
            SgfMove::Invalid => Err(RemoteError::InvalidNotation { index }),
        })
        .collect()
}

/// An in-process opponent that answers every move with a uniformly random
/// legal one. It never resigns.
#[derive(Debug)]
pub struct LocalOpponent {
    space: ActionSpace,
    game: QuantumGo,
    history: Vec<ActionId>,
    remaining: RemainingActions,
    color: Color,
    rng: fastrand::Rng,
    flakiness: f64,
}

impl LocalOpponent {
    /// An opponent playing `color` on a `size`x`size` board.
    pub fn new(size: usize, komi: f32, color: Color, seed: u64) -> Self {
        let space = ActionSpace::new(size);
        let remaining = space.full();
        Self {
            game: QuantumGo::new(size, komi),
            space,
            history: Vec::new(),
            remaining,
            color,
            rng: fastrand::Rng::with_seed(seed),
            flakiness: 0.0,
        }
    }

    /// Make every call fail transiently with probability `p` before doing
    /// anything.
    pub fn with_flakiness(mut self, p: f64) -> Self {
        self.flakiness = p;
        self
    }

    pub fn game(&self) -> &QuantumGo {
        &self.game
    }

    /// The move list as SGF.
    pub fn sgf(&self) -> String {
        let size = self.space.size();
        let mut out = format!("(;GM[1]FF[4]SZ[{size}]KM[{}]", self.game.komi());
        for (ply, &id) in self.history.iter().enumerate() {
            let color = player_at(ply);
            if let Some(node) = self.space.sgf_node(color, id) {
                out.push_str(&node);
            }
        }
        out.push(')');
        out
    }

    fn flaky(&mut self) -> Result<(), RemoteError> {
        if self.flakiness > 0.0 && self.rng.f64() < self.flakiness {
            return Err(RemoteError::Transient("simulated hiccup".into()));
        }
        Ok(())
    }

    fn play(&mut self, id: ActionId) -> Result<(), RemoteError> {
        let mv = self
            .space
            .move_of(id)
            .ok_or_else(|| RemoteError::Fatal(format!("unknown action {id}")))?;
        self.game
            .apply_move(self.game.current_player(), mv)
            .map_err(|e| RemoteError::Fatal(format!("action {id} rejected: {e}")))?;
        if mv != Move::Pass {
            self.remaining.remove(id);
        }
        self.history.push(id);
        Ok(())
    }

    fn reply(&mut self) -> Result<(), RemoteError> {
        let resign = self.space.resign_id();
        let pass = self.space.pass_id();
        let can_pass = self.game.phase() != Phase::Placement;
        let candidates: Vec<ActionId> = self
            .remaining
            .iter()
            .filter(|&id| id != resign && (can_pass || id != pass))
            .collect();
        let id = if candidates.is_empty() {
            pass
        } else {
            candidates[self.rng.usize(..candidates.len())]
        };
        self.play(id)
    }
}

impl RemoteGame for LocalOpponent {
    fn submit(&mut self, action: ActionId) -> Result<(), RemoteError> {
        self.flaky()?;
        if self.game.current_player() == self.color {
            return Err(RemoteError::Fatal("not our turn".into()));
        }
        self.play(action)
    }

    fn moves(&mut self) -> Result<Vec<ActionId>, RemoteError> {
        self.flaky()?;
        if self.game.phase() != Phase::GameOver && self.game.current_player() == self.color {
            self.reply()?;
        }
        let mut ids = ids_from_sgf(&self.space, &self.sgf())?;
        // Resignations are not part of the SGF move list.
        if self.history.last() == Some(&self.space.resign_id()) {
            ids.push(self.space.resign_id());
        }
        Ok(ids)
    }
}
