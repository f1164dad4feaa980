//! Move selection.
//!
//! [`MoveSelector`] runs the evaluate-then-move cycle: expand the root into
//! one child per remaining action, run rollout passes over the children on a
//! bounded rayon pool, and pick the child with the best win ratio. It also
//! drives a whole game against a [`RemoteGame`].

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::action_space::{ActionId, ActionSpace};
use crate::config::SearchConfig;
use crate::engine::{GameResult, QuantumGo};
use crate::remote::{RemoteError, RemoteGame};
use crate::rollout::{RolloutError, player_at, replay, rollout};
use crate::tree::{LogProgress, Progress, SearchTree};

/// Delay between two polls of the remote move list while waiting for the
/// opponent.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no candidate move could be simulated")]
    NoCandidates,
    #[error("failed to start the rollout workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("remote move list is not a legal game: {0}")]
    IllegalHistory(#[from] RolloutError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("remote operation failed {attempts} times, last error: {last}")]
    RetriesExhausted { attempts: usize, last: RemoteError },
}

pub struct MoveSelector {
    config: SearchConfig,
    space: ActionSpace,
    tree: SearchTree,
    pool: rayon::ThreadPool,
    rng: fastrand::Rng,
    progress: Box<dyn Progress>,
    poll_interval: Duration,
}

impl MoveSelector {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let space = ActionSpace::new(config.board_size);
        let tree = SearchTree::new(&space);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("rollout-{i}"))
            .build()?;
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Ok(Self {
            config,
            space,
            tree,
            pool,
            rng,
            progress: Box::new(LogProgress::default()),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Replace the default logging progress reporter.
    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Moves played so far, as the selector knows them.
    pub fn history(&self) -> &[ActionId] {
        &self.tree.root_node().history
    }

    pub fn is_our_turn(&self) -> bool {
        player_at(self.history().len()) == self.config.color
    }

    /// The current position replayed through the rules engine.
    pub fn position(&self) -> Result<QuantumGo, SearchError> {
        Ok(replay(&self.space, self.history(), self.config.komi)?)
    }

    /// Evaluate every candidate from the current root and return the best.
    pub fn choose_move(&mut self) -> Result<ActionId, SearchError> {
        let start = Instant::now();
        let root = self.tree.root();
        let children = self.tree.expand(root);
        let seed = self.rng.u64(..);

        let tree = &mut self.tree;
        let space = &self.space;
        let progress = self.progress.as_ref();
        let (passes, color, komi) = (self.config.passes, self.config.color, self.config.komi);
        let report = self.pool.install(|| {
            tree.simulate_and_update(root, passes, color, seed, progress, |history, rng| {
                rollout(space, history, komi, rng)
            })
        });

        for (action, err) in &report.rejected {
            warn!("candidate {} rejected: {err}", self.space.describe(*action));
        }
        let best = self
            .tree
            .select_best(root, &mut self.rng)
            .ok_or(SearchError::NoCandidates)?;
        let node = self.tree.node(best);
        let action = node.action.ok_or(SearchError::NoCandidates)?;
        info!(
            "simulated {children} children x {passes} passes ({} rollouts) in {:.2}s, best {} wins {}/{} ({:.1}%)",
            report.rollouts,
            start.elapsed().as_secs_f64(),
            self.space.describe(action),
            node.wins,
            node.plays,
            node.winrate().unwrap_or_default() * 100.0
        );
        Ok(action)
    }

    /// Commit to `action`: the matching child becomes the root.
    pub fn accept(&mut self, action: ActionId) {
        let root = self.tree.root();
        let child = self
            .tree
            .node(root)
            .children
            .iter()
            .copied()
            .find(|&c| self.tree.node(c).action == Some(action));
        match child {
            Some(c) => self.tree.advance(c),
            None => {
                let mut history = self.history().to_vec();
                history.push(action);
                self.tree.reset_root(history);
            }
        }
    }

    /// Take the remote move list as the truth about the game so far.
    ///
    /// # Errors
    /// If the list is not a legal game; the selector is unchanged then.
    pub fn observe(&mut self, moves: Vec<ActionId>) -> Result<(), SearchError> {
        replay(&self.space, &moves, self.config.komi)?;
        if moves.as_slice() != self.history() {
            debug!("remote history now has {} moves", moves.len());
            self.tree.reset_root(moves);
        }
        Ok(())
    }

    fn with_retries<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, RemoteError>,
    ) -> Result<T, SearchError> {
        let attempts = self.config.remote_retries;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(RemoteError::Transient(msg)) if attempt < attempts => {
                    warn!("{what} failed (attempt {attempt}/{attempts}): {msg}");
                    attempt += 1;
                }
                Err(last @ RemoteError::Transient(_)) => {
                    return Err(SearchError::RetriesExhausted { attempts, last });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Play against `remote` until the game ends.
    pub fn play_game(&mut self, remote: &mut impl RemoteGame) -> Result<GameResult, SearchError> {
        loop {
            let moves = self.with_retries("reading moves", || remote.moves())?;
            self.observe(moves)?;

            let position = self.position()?;
            if let Some(result) = position.result() {
                info!("game over after {} moves: {result}", self.history().len());
                return Ok(result);
            }
            if !self.is_our_turn() {
                thread::sleep(self.poll_interval);
                continue;
            }

            let best = self.choose_move()?;
            self.with_retries("submitting move", || remote.submit(best))?;
            info!("played {}", self.space.describe(best));
            self.accept(best);
        }
    }
}
