//! Single-ply search tree.
//!
//! The tree is an arena: nodes live in a `Vec` and refer to each other by
//! [`NodeId`]. Only the root is ever expanded; each child stands for one
//! candidate move and accumulates rollout statistics. When a move is
//! accepted, the chosen child becomes the new root and everything else is
//! dropped.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use rayon::prelude::*;

use crate::action_space::{ActionId, ActionSpace, RemainingActions};
use crate::board::Color;
use crate::constants::REPORT_PERIOD;
use crate::engine::Winner;
use crate::rollout::RolloutError;

/// Handle of a node inside a [`SearchTree`].
pub type NodeId = usize;

/// A node of the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Moves played to reach the parent position, plus this node's
    /// candidate once it has been simulated.
    pub history: Vec<ActionId>,
    /// Ids still available from this node.
    pub remaining: RemainingActions,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Rollouts run (`plays`) and won for the search color (`wins`).
    pub plays: u32,
    pub wins: u32,
    /// The move this node stands for; `None` for the root.
    pub action: Option<ActionId>,
    applied: bool,
    rejected: Option<RolloutError>,
}

impl SearchNode {
    fn root(history: Vec<ActionId>, remaining: RemainingActions) -> Self {
        Self {
            history,
            remaining,
            parent: None,
            children: Vec::new(),
            plays: 0,
            wins: 0,
            action: None,
            applied: true,
            rejected: None,
        }
    }

    /// Win ratio, or `None` before the first rollout.
    pub fn winrate(&self) -> Option<f64> {
        (self.plays > 0).then(|| self.wins as f64 / self.plays as f64)
    }

    pub fn record(&mut self, won: bool) {
        self.plays += 1;
        if won {
            self.wins += 1;
        }
    }

    /// Why this node's line could not be simulated, if it could not.
    pub fn rejection(&self) -> Option<&RolloutError> {
        self.rejected.as_ref()
    }

    /// Append the candidate to the history. Safe to call repeatedly.
    fn apply_candidate(&mut self) {
        if !self.applied {
            if let Some(action) = self.action {
                self.history.push(action);
            }
            self.applied = true;
        }
    }

    /// Compare win ratios without rounding: `a.wins/a.plays` vs `b.wins/b.plays`.
    fn cmp_ratio(&self, other: &SearchNode) -> std::cmp::Ordering {
        let lhs = self.wins as u64 * other.plays as u64;
        let rhs = other.wins as u64 * self.plays as u64;
        lhs.cmp(&rhs)
    }
}

/// Receives progress events from [`SearchTree::simulate_and_update`].
pub trait Progress: Sync {
    fn rollout_finished(&self, _action: ActionId, _winner: Winner) {}
    fn pass_finished(&self, _pass: usize, _passes: usize) {}
}

/// Ignores every event.
impl Progress for () {}

/// Logs a line every [`REPORT_PERIOD`] rollouts and after every pass.
#[derive(Debug, Default)]
pub struct LogProgress {
    rollouts: AtomicUsize,
}

impl Progress for LogProgress {
    fn rollout_finished(&self, action: ActionId, winner: Winner) {
        let n = self.rollouts.fetch_add(1, Ordering::Relaxed) + 1;
        if n % REPORT_PERIOD == 0 {
            debug!("{n} rollouts done (last: action {action} -> {winner})");
        }
    }

    fn pass_finished(&self, pass: usize, passes: usize) {
        debug!(
            "pass {}/{passes} done, {} rollouts so far",
            pass + 1,
            self.rollouts.load(Ordering::Relaxed)
        );
    }
}

/// Summary of one [`SearchTree::simulate_and_update`] call.
#[derive(Debug, Default)]
pub struct SimulationReport {
    /// Rollouts that reached a result.
    pub rollouts: usize,
    /// Children whose line was illegal, with the reason.
    pub rejected: Vec<(ActionId, RolloutError)>,
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
    pass_id: ActionId,
    space_len: usize,
}

/// Mix a seed with a pass index and an action into a per-rollout seed.
fn rollout_seed(seed: u64, pass: usize, action: ActionId) -> u64 {
    let mut z = seed
        .wrapping_add((pass as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((action as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl SearchTree {
    /// A tree whose root is the empty game.
    pub fn new(space: &ActionSpace) -> Self {
        Self {
            nodes: vec![SearchNode::root(Vec::new(), space.full())],
            root: 0,
            pass_id: space.pass_id(),
            space_len: space.len(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }

    pub fn root_node(&self) -> &SearchNode {
        &self.nodes[self.root]
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SearchNode> + '_ {
        self.nodes[id].children.iter().map(|&c| &self.nodes[c])
    }

    /// Create one child per remaining id of `id`, in ascending id order.
    ///
    /// Every child gets its own copy of the history and of the remaining
    /// ids. Does nothing if `id` already has children. Returns the number of
    /// children.
    pub fn expand(&mut self, id: NodeId) -> usize {
        if !self.nodes[id].children.is_empty() {
            return self.nodes[id].children.len();
        }
        let candidates = self.nodes[id].remaining.sorted();
        for action in candidates {
            let parent = &self.nodes[id];
            let child = SearchNode {
                history: parent.history.clone(),
                remaining: parent.remaining.clone(),
                parent: Some(id),
                children: Vec::new(),
                plays: 0,
                wins: 0,
                action: Some(action),
                applied: false,
                rejected: None,
            };
            let child_id = self.nodes.len();
            self.nodes.push(child);
            self.nodes[id].children.push(child_id);
        }
        self.nodes[id].children.len()
    }

    /// Run `passes` rounds of one rollout per child of `id`.
    ///
    /// Children are simulated in parallel on the current rayon pool. Each
    /// rollout gets its own RNG derived from `seed`, so the outcome does not
    /// depend on scheduling. A rollout won by `color` counts as a win. A
    /// child whose line is rejected is reported and skipped from then on.
    pub fn simulate_and_update<F>(
        &mut self,
        id: NodeId,
        passes: usize,
        color: Color,
        seed: u64,
        progress: &dyn Progress,
        rollout: F,
    ) -> SimulationReport
    where
        F: Fn(&[ActionId], &mut fastrand::Rng) -> Result<Winner, RolloutError> + Sync,
    {
        let mut report = SimulationReport::default();
        for pass in 0..passes {
            let outcomes: Vec<Result<(), (ActionId, RolloutError)>> = self
                .nodes
                .par_iter_mut()
                .filter(|n| n.parent == Some(id) && n.rejected.is_none())
                .map(|child| {
                    let action = child.action.unwrap_or_default();
                    child.apply_candidate();
                    let mut rng = fastrand::Rng::with_seed(rollout_seed(seed, pass, action));
                    match rollout(&child.history, &mut rng) {
                        Ok(winner) => {
                            child.record(winner.is(color));
                            progress.rollout_finished(action, winner);
                            Ok(())
                        }
                        Err(err) => {
                            child.rejected = Some(err.clone());
                            Err((action, err))
                        }
                    }
                })
                .collect();

            for outcome in outcomes {
                match outcome {
                    Ok(()) => report.rollouts += 1,
                    Err(rejection) => report.rejected.push(rejection),
                }
            }
            progress.pass_finished(pass, passes);
        }
        report
    }

    /// The child of `id` with the best win ratio.
    ///
    /// Children without rollouts are not candidates. Ties are broken
    /// uniformly at random.
    pub fn select_best(&self, id: NodeId, rng: &mut fastrand::Rng) -> Option<NodeId> {
        let mut best: Vec<NodeId> = Vec::new();
        for &c in &self.nodes[id].children {
            let child = &self.nodes[c];
            if child.plays == 0 {
                continue;
            }
            match best.first().map(|&b| child.cmp_ratio(&self.nodes[b])) {
                None | Some(std::cmp::Ordering::Greater) => {
                    best.clear();
                    best.push(c);
                }
                Some(std::cmp::Ordering::Equal) => best.push(c),
                Some(std::cmp::Ordering::Less) => {}
            }
        }
        if best.is_empty() {
            None
        } else {
            Some(best[rng.usize(..best.len())])
        }
    }

    /// Candidate move of the best child of `id`.
    pub fn best_move(&self, id: NodeId, rng: &mut fastrand::Rng) -> Option<ActionId> {
        self.select_best(id, rng)
            .and_then(|c| self.nodes[c].action)
    }

    /// Make `child` the root, dropping every node outside its subtree.
    ///
    /// The child's move is appended to its history and, unless it is a
    /// pass, removed from its remaining ids.
    pub fn advance(&mut self, child: NodeId) {
        let mut order = vec![child];
        let mut i = 0;
        while i < order.len() {
            order.extend(self.nodes[order[i]].children.iter().copied());
            i += 1;
        }

        let mut remap = vec![None; self.nodes.len()];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = Some(new);
        }
        let mut old_nodes: Vec<Option<SearchNode>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();

        for &old in &order {
            let Some(mut node) = old_nodes[old].take() else {
                continue;
            };
            node.parent = node.parent.and_then(|p| remap[p]);
            node.children = node.children.iter().filter_map(|&c| remap[c]).collect();
            self.nodes.push(node);
        }
        self.root = 0;

        let pass_id = self.pass_id;
        let root = &mut self.nodes[0];
        root.parent = None;
        root.apply_candidate();
        if let Some(action) = root.action {
            if action != pass_id {
                root.remaining.remove(action);
            }
        }
        debug!("advanced root, {} nodes kept", self.nodes.len());
    }

    /// Replace the root with a fresh one at `history`.
    ///
    /// Used when the game server reports the moves played so far. The
    /// remaining ids are recomputed from the full action space; passes stay
    /// available.
    pub fn reset_root(&mut self, history: Vec<ActionId>) {
        let mut remaining = RemainingActions::new(self.space_len);
        for &id in &history {
            if id != self.pass_id {
                remaining.remove(id);
            }
        }
        self.nodes = vec![SearchNode::root(history, remaining)];
        self.root = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_space::build_action_space;

    fn tree_with_stats(stats: &[(u32, u32)]) -> SearchTree {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.expand(tree.root());
        let children = tree.node(tree.root()).children.clone();
        for (&c, &(plays, wins)) in children.iter().zip(stats) {
            for i in 0..plays {
                tree.nodes[c].record(i < wins);
            }
        }
        tree
    }

    #[test]
    fn test_expand_creates_one_child_per_action() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        assert_eq!(tree.expand(tree.root()), 27);
        assert_eq!(tree.len(), 28);
        let actions: Vec<_> = tree.children(tree.root()).map(|c| c.action).collect();
        assert_eq!(actions[0], Some(0));
        assert_eq!(actions[26], Some(26));
        // Expanding again is a no-op.
        assert_eq!(tree.expand(tree.root()), 27);
        assert_eq!(tree.len(), 28);
    }

    #[test]
    fn test_children_own_their_remaining_actions() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.expand(tree.root());
        let first = tree.node(tree.root()).children[0];
        let second = tree.node(tree.root()).children[1];
        tree.nodes[first].remaining.remove(5);
        tree.nodes[first].history.push(99);
        assert!(tree.node(second).remaining.contains(5));
        assert!(tree.node(second).history.is_empty());
        assert!(tree.root_node().remaining.contains(5));
    }

    #[test]
    fn test_select_best_skips_unplayed_children() {
        // Only the third child has been played, and it always lost.
        let tree = tree_with_stats(&[(0, 0), (0, 0), (3, 0)]);
        let mut rng = fastrand::Rng::with_seed(0);
        let best = tree.select_best(tree.root(), &mut rng).unwrap();
        assert_eq!(tree.node(best).action, Some(2));
    }

    #[test]
    fn test_select_best_none_without_plays() {
        let tree = tree_with_stats(&[]);
        let mut rng = fastrand::Rng::with_seed(0);
        assert_eq!(tree.select_best(tree.root(), &mut rng), None);
    }

    #[test]
    fn test_select_best_exact_ratio() {
        // 2/3 beats 3/5; 4/6 ties with 2/3.
        let tree = tree_with_stats(&[(5, 3), (3, 2), (6, 4), (1, 0)]);
        let mut rng = fastrand::Rng::with_seed(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(tree.best_move(tree.root(), &mut rng).unwrap());
        }
        assert_eq!(seen, [1, 2].into_iter().collect());
    }

    #[test]
    fn test_simulate_and_update_counts() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.expand(tree.root());
        // Even ids always win for Black, odd ids always lose.
        let report = tree.simulate_and_update(tree.root(), 3, Color::Black, 7, &(), |history, _| {
            let last = *history.last().unwrap();
            Ok(if last % 2 == 0 { Winner::Black } else { Winner::White })
        });
        assert_eq!(report.rollouts, 27 * 3);
        assert!(report.rejected.is_empty());
        for child in tree.children(tree.root()) {
            assert_eq!(child.plays, 3);
            assert!(child.wins <= child.plays);
            // Appended exactly once across passes.
            assert_eq!(child.history, vec![child.action.unwrap()]);
            let expected = if child.action.unwrap() % 2 == 0 { 3 } else { 0 };
            assert_eq!(child.wins, expected);
        }
    }

    #[test]
    fn test_rejected_child_is_reported_once() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.expand(tree.root());
        let report = tree.simulate_and_update(tree.root(), 2, Color::Black, 1, &(), |history, _| {
            if history == [4] {
                Err(RolloutError::ResignBeforeEnd { ply: 0 })
            } else {
                Ok(Winner::Tie)
            }
        });
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, 4);
        let rejected = tree.children(tree.root()).find(|c| c.action == Some(4)).unwrap();
        assert_eq!(rejected.plays, 0);
        assert!(rejected.rejection().is_some());
        // Ties are not wins.
        assert!(tree.children(tree.root()).all(|c| c.wins == 0));
    }

    #[test]
    fn test_advance_keeps_only_chosen_child() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.expand(tree.root());
        let chosen = tree.node(tree.root()).children[7];
        tree.advance(chosen);
        assert_eq!(tree.len(), 1);
        let root = tree.root_node();
        assert_eq!(root.parent, None);
        assert_eq!(root.history, vec![7]);
        assert!(!root.remaining.contains(7));
        assert_eq!(root.remaining.len(), 26);
    }

    #[test]
    fn test_advance_on_pass_keeps_pass_available() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.reset_root(vec![0, 1]);
        tree.expand(tree.root());
        let pass_child = tree
            .node(tree.root())
            .children
            .iter()
            .copied()
            .find(|&c| tree.node(c).action == Some(space.pass_id()))
            .unwrap();
        tree.advance(pass_child);
        assert_eq!(tree.root_node().history, vec![0, 1, 25]);
        assert!(tree.root_node().remaining.contains(25));
    }

    #[test]
    fn test_reset_root_recomputes_remaining() {
        let space = build_action_space(5);
        let mut tree = SearchTree::new(&space);
        tree.expand(tree.root());
        tree.reset_root(vec![3, 8, 25, 12]);
        assert_eq!(tree.len(), 1);
        let root = tree.root_node();
        assert_eq!(root.remaining.len(), 27 - 3);
        assert!(root.remaining.contains(25));
        assert!(!root.remaining.contains(12));
    }
}
