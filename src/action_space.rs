//! Integer move identifiers.
//!
//! The search and the game server talk about moves as plain integers. For a
//! board of size `n`:
//!
//! - ids `0..n*n` are placements in row-major order (`id = n*row + col`)
//! - id `n*n` is Pass
//! - id `n*n + 1` is Resign
//!
//! [`RemainingActions`] is the per-node set of ids still available, and the
//! SGF helpers translate the server's move list into ids.

use std::collections::HashMap;
use std::fmt;

use crate::board::{Color, Coord};
use crate::constants::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};

/// Index into an [`ActionSpace`].
pub type ActionId = usize;

/// A move as the rules engine sees it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Place(Coord),
    Pass,
    Resign,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(c) => write!(f, "{c}"),
            Move::Pass => write!(f, "pass"),
            Move::Resign => write!(f, "resign"),
        }
    }
}

/// A move parsed from the server's SGF move list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SgfMove {
    Action(ActionId),
    /// Notation that does not map to any id on this board.
    Invalid,
}

/// Bijection between ids and moves for one board size.
#[derive(Clone, Debug)]
pub struct ActionSpace {
    size: usize,
    moves: Vec<Move>,
    index: HashMap<Move, ActionId>,
}

/// Build the action space for an `n`x`n` board.
pub fn build_action_space(n: usize) -> ActionSpace {
    ActionSpace::new(n)
}

impl ActionSpace {
    /// # Panics
    /// If `size` is outside `MIN_BOARD_SIZE..=MAX_BOARD_SIZE`.
    pub fn new(size: usize) -> Self {
        assert!(
            (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size),
            "unsupported board size {size}"
        );
        let mut moves = Vec::with_capacity(size * size + 2);
        for row in 0..size {
            for col in 0..size {
                moves.push(Move::Place(Coord::new(row, col)));
            }
        }
        moves.push(Move::Pass);
        moves.push(Move::Resign);

        let index = moves.iter().enumerate().map(|(id, &mv)| (mv, id)).collect();
        Self { size, moves, index }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of ids, `n*n + 2`.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn pass_id(&self) -> ActionId {
        self.size * self.size
    }

    pub fn resign_id(&self) -> ActionId {
        self.size * self.size + 1
    }

    pub fn is_pass(&self, id: ActionId) -> bool {
        id == self.pass_id()
    }

    pub fn is_resign(&self, id: ActionId) -> bool {
        id == self.resign_id()
    }

    pub fn move_of(&self, id: ActionId) -> Option<Move> {
        self.moves.get(id).copied()
    }

    pub fn id_of(&self, mv: Move) -> Option<ActionId> {
        self.index.get(&mv).copied()
    }

    /// Id of the placement at a 1-indexed `(row, column)`.
    pub fn id_at(&self, row: usize, col: usize) -> Option<ActionId> {
        if row == 0 || col == 0 {
            return None;
        }
        self.id_of(Move::Place(Coord::from_one_based(row, col)))
    }

    /// Every id paired with its move, in id order.
    pub fn entries(&self) -> impl Iterator<Item = (ActionId, Move)> + '_ {
        self.moves.iter().copied().enumerate()
    }

    /// A fresh set holding every id.
    pub fn full(&self) -> RemainingActions {
        RemainingActions::new(self.len())
    }

    /// Human readable form of an id, e.g. `12 (3,3)`.
    pub fn describe(&self, id: ActionId) -> String {
        match self.move_of(id) {
            Some(mv) => format!("{id} {mv}"),
            None => format!("{id} <invalid>"),
        }
    }

    /// SGF point (`[cd]` without brackets) of a placement id.
    pub fn sgf_point(&self, id: ActionId) -> Option<String> {
        match self.move_of(id)? {
            Move::Place(c) => Some(format!(
                "{}{}",
                (b'a' + c.col as u8) as char,
                (b'a' + c.row as u8) as char
            )),
            Move::Pass => Some(String::new()),
            Move::Resign => None,
        }
    }

    /// One SGF move node, e.g. `;B[cd]`. Resign has no SGF node.
    pub fn sgf_node(&self, color: Color, id: ActionId) -> Option<String> {
        let point = self.sgf_point(id)?;
        Some(format!(";{}[{point}]", color.letter()))
    }

    /// Translate a single SGF point value into an id.
    ///
    /// An empty value is Pass, as is `tt` on boards up to 19.
    pub fn parse_sgf_point(&self, value: &str) -> SgfMove {
        if value.is_empty() || (value == "tt" && self.size <= 19) {
            return SgfMove::Action(self.pass_id());
        }
        let bytes = value.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
            return SgfMove::Invalid;
        }
        let col = (bytes[0] - b'a') as usize;
        let row = (bytes[1] - b'a') as usize;
        match self.id_of(Move::Place(Coord::new(row, col))) {
            Some(id) => SgfMove::Action(id),
            None => SgfMove::Invalid,
        }
    }

    /// Extract the ordered move list from SGF text.
    ///
    /// Only `;B[..]` and `;W[..]` nodes are considered; everything else in
    /// the record (game info, comments) is skipped.
    pub fn parse_sgf_moves(&self, sgf: &str) -> Vec<SgfMove> {
        let mut out = Vec::new();
        let mut rest = sgf;
        while let Some(pos) = rest.find(';') {
            rest = &rest[pos + 1..];
            let trimmed = rest.trim_start();
            let mut chars = trimmed.chars();
            let is_move = matches!(chars.next(), Some('B' | 'W')) && chars.next() == Some('[');
            if !is_move {
                continue;
            }
            let body = &trimmed[2..];
            match body.find(']') {
                Some(end) => {
                    out.push(self.parse_sgf_point(&body[..end]));
                    rest = &body[end + 1..];
                }
                None => {
                    out.push(SgfMove::Invalid);
                    break;
                }
            }
        }
        out
    }
}

/// The set of ids still available from some point of a game.
///
/// Supports O(1) membership, removal and uniform sampling. Iteration order
/// is not stable across removals; use [`RemainingActions::sorted`] where the
/// order matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemainingActions {
    ids: Vec<ActionId>,
    slots: Vec<Option<usize>>,
}

impl RemainingActions {
    /// A set holding `0..len`.
    pub fn new(len: usize) -> Self {
        Self {
            ids: (0..len).collect(),
            slots: (0..len).map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ActionId) -> bool {
        matches!(self.slots.get(id), Some(Some(_)))
    }

    /// Remove `id`, returning whether it was present.
    pub fn remove(&mut self, id: ActionId) -> bool {
        let Some(slot) = self.slots.get_mut(id).and_then(Option::take) else {
            return false;
        };
        self.ids.swap_remove(slot);
        if let Some(&moved) = self.ids.get(slot) {
            self.slots[moved] = Some(slot);
        }
        true
    }

    /// Uniformly random member.
    pub fn choose(&self, rng: &mut fastrand::Rng) -> Option<ActionId> {
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids[rng.usize(..self.ids.len())])
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.ids.iter().copied()
    }

    /// Members in ascending order.
    pub fn sorted(&self) -> Vec<ActionId> {
        let mut ids = self.ids.clone();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_five_layout() {
        let space = build_action_space(5);
        assert_eq!(space.len(), 27);
        assert_eq!(space.move_of(0), Some(Move::Place(Coord::from_one_based(1, 1))));
        assert_eq!(space.move_of(24), Some(Move::Place(Coord::from_one_based(5, 5))));
        assert_eq!(space.move_of(25), Some(Move::Pass));
        assert_eq!(space.move_of(26), Some(Move::Resign));
        assert_eq!(space.move_of(27), None);
    }

    #[test]
    fn test_row_major_ids() {
        let space = build_action_space(9);
        assert_eq!(space.id_at(1, 2), Some(1));
        assert_eq!(space.id_at(2, 1), Some(9));
        assert_eq!(space.id_at(0, 1), None);
        assert_eq!(space.id_at(10, 1), None);
    }

    #[test]
    fn test_inverse_roundtrip() {
        for size in [5, 9, 19] {
            let space = build_action_space(size);
            assert_eq!(space.len(), size * size + 2);
            for (id, mv) in space.entries() {
                assert_eq!(space.id_of(mv), Some(id), "size {size} id {id}");
            }
        }
    }

    #[test]
    fn test_sgf_points() {
        let space = build_action_space(5);
        assert_eq!(space.parse_sgf_point("aa"), SgfMove::Action(0));
        // column e, row d
        assert_eq!(space.parse_sgf_point("ed"), SgfMove::Action(3 * 5 + 4));
        assert_eq!(space.parse_sgf_point(""), SgfMove::Action(25));
        assert_eq!(space.parse_sgf_point("tt"), SgfMove::Action(25));
        assert_eq!(space.parse_sgf_point("fa"), SgfMove::Invalid);
        assert_eq!(space.parse_sgf_point("A1"), SgfMove::Invalid);
        assert_eq!(space.sgf_point(19).as_deref(), Some("ed"));
        assert_eq!(space.sgf_node(Color::White, 25).as_deref(), Some(";W[]"));
        assert_eq!(space.sgf_node(Color::Black, 26), None);
    }

    #[test]
    fn test_parse_sgf_moves() {
        let space = build_action_space(5);
        let sgf = "(;GM[1]FF[4]SZ[5];B[aa];W[ed];B[];W[zz])";
        assert_eq!(
            space.parse_sgf_moves(sgf),
            vec![
                SgfMove::Action(0),
                SgfMove::Action(19),
                SgfMove::Action(25),
                SgfMove::Invalid,
            ]
        );
        assert!(space.parse_sgf_moves("(;GM[1]SZ[5])").is_empty());
        assert_eq!(space.parse_sgf_moves(";B[aa"), vec![SgfMove::Invalid]);
    }

    #[test]
    fn test_remaining_actions_remove_and_choose() {
        let mut set = RemainingActions::new(6);
        assert!(set.remove(2));
        assert!(!set.remove(2));
        assert!(set.remove(5));
        assert!(!set.remove(99));
        assert_eq!(set.len(), 4);
        assert!(!set.contains(2));
        assert!(set.contains(4));
        assert_eq!(set.sorted(), vec![0, 1, 3, 4]);

        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let id = set.choose(&mut rng).unwrap();
            assert!(set.contains(id));
        }
    }

    #[test]
    fn test_remaining_actions_clone_is_independent() {
        let a = RemainingActions::new(4);
        let mut b = a.clone();
        b.remove(1);
        assert!(a.contains(1));
        assert!(!b.contains(1));
    }
}
