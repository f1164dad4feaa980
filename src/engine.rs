//! The Quantum Go rules engine.
//!
//! A game is played on two subgames at once. The first two plies place the
//! quantum stones: nothing appears on either board until the second one lands,
//! then subgame A gets the first player's color on the first stone and the
//! other color on the second, while subgame B gets the swapped assignment.
//! From then on every placement is applied to both subgames independently.
//!
//! Capturing a stone that sits on a quantum coordinate collapses its twin:
//! the other quantum coordinate is cleared on the opposite subgame.
//!
//! Captures use a plain liberty test everywhere: a group is removed exactly
//! when none of its stones touches an empty intersection. Only the opponent
//! groups next to the played stone are examined after a move, so a stone
//! without liberties of its own stays on the board.

use std::fmt;

use thiserror::Error;

use crate::action_space::Move;
use crate::board::{Board, Color, Coord};
use crate::constants::{DEFAULT_BOARD_SIZE, DEFAULT_KOMI, QUANTUM_PLIES};

/// Why a move was rejected. The engine is unchanged after any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("it is {expected:?}'s turn, not {got:?}'s")]
    OutOfTurn { expected: Color, got: Color },
    #[error("intersection {0} is occupied")]
    OccupiedCell(Coord),
    #[error("the game is already over")]
    GameAlreadyOver,
    #[error("passing is not allowed while quantum stones are being placed")]
    IllegalPassDuringPlacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Plies 0 and 1: the quantum stones are being placed.
    Placement,
    Play,
    GameOver,
}

/// Who won a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winner {
    Black,
    White,
    Tie,
}

impl Winner {
    pub fn from_color(color: Color) -> Self {
        match color {
            Color::Black => Winner::Black,
            Color::White => Winner::White,
            Color::Empty => Winner::Tie,
        }
    }

    pub fn is(self, color: Color) -> bool {
        self == Winner::from_color(color) && color != Color::Empty
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Black => write!(f, "B"),
            Winner::White => write!(f, "W"),
            Winner::Tie => write!(f, "Tie"),
        }
    }
}

/// Final result, printed in the usual notation (`B+0.5`, `W+R`, `Tie`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameResult {
    Score { winner: Color, margin: f32 },
    Resignation { winner: Color },
    Tie,
}

impl GameResult {
    /// Score a finished game: positive favors Black.
    pub fn from_score(score: f32) -> Self {
        if score > 0.0 {
            GameResult::Score {
                winner: Color::Black,
                margin: score,
            }
        } else if score < 0.0 {
            GameResult::Score {
                winner: Color::White,
                margin: -score,
            }
        } else {
            GameResult::Tie
        }
    }

    pub fn winner(&self) -> Winner {
        match *self {
            GameResult::Score { winner, .. } | GameResult::Resignation { winner } => {
                Winner::from_color(winner)
            }
            GameResult::Tie => Winner::Tie,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Margins keep a decimal point, so 3 prints as `3.0`.
            GameResult::Score { winner, margin } => write!(f, "{}+{margin:?}", winner.letter()),
            GameResult::Resignation { winner } => write!(f, "{}+R", winner.letter()),
            GameResult::Tie => write!(f, "Tie"),
        }
    }
}

/// Full engine state. Cloning gives an independent copy; equality compares
/// every field, so it doubles as the serialized-state check in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumGo {
    subgames: [Board; 2],
    quantum: Vec<Coord>,
    ply: usize,
    current: Color,
    phase: Phase,
    /// Stones captured, indexed by `[subgame][color]` with Black = 0, White = 1.
    captures: [[usize; 2]; 2],
    consecutive_passes: u32,
    komi: f32,
    result: Option<GameResult>,
}

impl Default for QuantumGo {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE, DEFAULT_KOMI)
    }
}

fn color_index(color: Color) -> usize {
    match color {
        Color::Black => 0,
        Color::White => 1,
        Color::Empty => unreachable!("captures are only credited to a player"),
    }
}

impl QuantumGo {
    pub fn new(size: usize, komi: f32) -> Self {
        Self {
            subgames: [Board::square(size), Board::square(size)],
            quantum: Vec::with_capacity(QUANTUM_PLIES),
            ply: 0,
            current: Color::Black,
            phase: Phase::Placement,
            captures: [[0; 2]; 2],
            consecutive_passes: 0,
            komi,
            result: None,
        }
    }

    pub fn size(&self) -> usize {
        self.subgames[0].width
    }

    pub fn subgame(&self, index: usize) -> &Board {
        &self.subgames[index]
    }

    pub fn subgames(&self) -> (&Board, &Board) {
        (&self.subgames[0], &self.subgames[1])
    }

    pub fn quantum_stones(&self) -> &[Coord] {
        &self.quantum
    }

    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn current_player(&self) -> Color {
        self.current
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn consecutive_passes(&self) -> u32 {
        self.consecutive_passes
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Stones of the opponent captured by `color` on one subgame.
    pub fn captures_on(&self, subgame: usize, color: Color) -> usize {
        self.captures[subgame][color_index(color)]
    }

    /// Stones captured by `color` summed over both subgames.
    pub fn captures(&self, color: Color) -> usize {
        self.captures_on(0, color) + self.captures_on(1, color)
    }

    /// Play `mv` for `player`.
    ///
    /// # Errors
    /// Any [`RuleError`]; the engine is left untouched in that case.
    ///
    /// # Panics
    /// If a placement lies outside the board.
    pub fn apply_move(&mut self, player: Color, mv: Move) -> Result<(), RuleError> {
        if self.phase == Phase::GameOver {
            return Err(RuleError::GameAlreadyOver);
        }
        if player != self.current {
            return Err(RuleError::OutOfTurn {
                expected: self.current,
                got: player,
            });
        }

        match mv {
            Move::Resign => {
                self.finish(GameResult::Resignation {
                    winner: player.opponent(),
                });
                Ok(())
            }
            Move::Pass => self.pass(),
            Move::Place(coord) => {
                let size = self.size();
                assert!(
                    self.subgames[0].in_bounds(coord),
                    "placement {coord} outside {size}x{size} board"
                );
                if self.phase == Phase::Placement {
                    self.place_quantum(coord)?;
                } else {
                    self.place(player, coord)?;
                }
                self.consecutive_passes = 0;
                self.ply += 1;
                self.current = self.current.opponent();
                if self.ply >= QUANTUM_PLIES && self.phase == Phase::Placement {
                    self.phase = Phase::Play;
                }
                Ok(())
            }
        }
    }

    fn pass(&mut self) -> Result<(), RuleError> {
        if self.phase == Phase::Placement {
            return Err(RuleError::IllegalPassDuringPlacement);
        }
        self.consecutive_passes += 1;
        if self.consecutive_passes >= 2 {
            let result = GameResult::from_score(self.score());
            self.finish(result);
        } else {
            self.current = self.current.opponent();
        }
        Ok(())
    }

    fn finish(&mut self, result: GameResult) {
        self.phase = Phase::GameOver;
        self.result = Some(result);
    }

    /// Black captures over both subgames minus komi.
    pub fn score(&self) -> f32 {
        self.captures(Color::Black) as f32 - self.komi
    }

    fn place_quantum(&mut self, coord: Coord) -> Result<(), RuleError> {
        if self.quantum.contains(&coord) {
            return Err(RuleError::OccupiedCell(coord));
        }
        self.quantum.push(coord);
        if self.quantum.len() == QUANTUM_PLIES {
            let (first, second) = (self.quantum[0], self.quantum[1]);
            // The ply-0 player is whoever moved one ply ago.
            let opener = self.current.opponent();
            self.subgames[0].set(first, opener);
            self.subgames[0].set(second, opener.opponent());
            self.subgames[1].set(first, opener.opponent());
            self.subgames[1].set(second, opener);
            for subgame in 0..2 {
                self.deduce_captures(subgame);
            }
        }
        Ok(())
    }

    fn place(&mut self, player: Color, coord: Coord) -> Result<(), RuleError> {
        if self.subgames.iter().any(|b| !b.is_empty_at(coord)) {
            return Err(RuleError::OccupiedCell(coord));
        }
        for subgame in 0..2 {
            self.subgames[subgame].set(coord, player);
            self.resolve_captures(subgame, player, coord);
        }
        Ok(())
    }

    /// Remove opponent groups next to `coord` that have run out of liberties.
    fn resolve_captures(&mut self, subgame: usize, player: Color, coord: Coord) -> usize {
        let opponent = player.opponent();
        let neighbors: Vec<Coord> = self.subgames[subgame].neighbors(coord).collect();
        let mut total = 0;
        for n in neighbors {
            let board = &self.subgames[subgame];
            if board.get(n) != opponent {
                continue;
            }
            let group = board.group(n);
            if !board.has_liberty(&group) {
                total += self.capture_group(subgame, player, &group);
            }
        }
        total
    }

    /// Full-board pass: every liberty-less group is captured by its opponent.
    fn deduce_captures(&mut self, subgame: usize) -> usize {
        let coords: Vec<Coord> = self.subgames[subgame].coords().collect();
        let mut total = 0;
        for c in coords {
            let board = &self.subgames[subgame];
            let color = board.get(c);
            if color == Color::Empty {
                continue;
            }
            let group = board.group(c);
            if !board.has_liberty(&group) {
                total += self.capture_group(subgame, color.opponent(), &group);
            }
        }
        total
    }

    /// Clear `group` from `subgame`, credit `capturer`, and collapse the
    /// entangled twin of any quantum stone in the group.
    fn capture_group(&mut self, subgame: usize, capturer: Color, group: &[Coord]) -> usize {
        let removed = self.subgames[subgame].remove(group);
        self.captures[subgame][color_index(capturer)] += removed;

        if self.quantum.len() == QUANTUM_PLIES {
            let other_board = 1 - subgame;
            for stone in group {
                if let Some(i) = self.quantum.iter().position(|q| q == stone) {
                    let twin = self.quantum[1 - i];
                    self.subgames[other_board].set(twin, Color::Empty);
                }
            }
        }
        removed
    }
}

impl fmt::Display for QuantumGo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.subgames();
        let pad = a.width * 2;
        writeln!(f, "{:<pad$}   {}", "A", "B")?;
        for row in 0..a.height {
            writeln!(f, "{:<pad$}   {}", a.render_row(row), b.render_row(row).trim_end())?;
        }
        write!(
            f,
            "ply {} to move {:?} captures B:{} W:{}",
            self.ply,
            self.current,
            self.captures(Color::Black),
            self.captures(Color::White)
        )?;
        if let Some(result) = self.result {
            write!(f, " result {result}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(row: usize, col: usize) -> Move {
        Move::Place(Coord::from_one_based(row, col))
    }

    fn play(game: &mut QuantumGo, mv: Move) {
        let player = game.current_player();
        game.apply_move(player, mv).unwrap();
    }

    #[test]
    fn test_new_game() {
        let game = QuantumGo::new(5, 6.5);
        assert_eq!(game.phase(), Phase::Placement);
        assert_eq!(game.current_player(), Color::Black);
        assert!(game.quantum_stones().is_empty());
        assert_eq!(game.result(), None);
    }

    #[test]
    fn test_quantum_pair_grows_to_two() {
        let mut game = QuantumGo::new(5, 6.5);
        play(&mut game, at(3, 3));
        assert_eq!(game.quantum_stones().len(), 1);
        // Nothing is visible until the pair is complete.
        assert!(game.subgame(0).coords().all(|c| game.subgame(0).is_empty_at(c)));
        play(&mut game, at(3, 5));
        assert_eq!(game.quantum_stones().len(), 2);
        assert_eq!(game.phase(), Phase::Play);
        play(&mut game, at(1, 1));
        assert_eq!(game.quantum_stones().len(), 2);
    }

    #[test]
    fn test_second_quantum_stone_on_first_is_rejected() {
        let mut game = QuantumGo::new(5, 6.5);
        play(&mut game, at(2, 2));
        let before = game.clone();
        let err = game.apply_move(Color::White, at(2, 2)).unwrap_err();
        assert_eq!(err, RuleError::OccupiedCell(Coord::new(1, 1)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_resign_sets_result() {
        let mut game = QuantumGo::new(5, 6.5);
        game.apply_move(Color::Black, Move::Resign).unwrap();
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.result().unwrap().to_string(), "W+R");
        assert_eq!(
            game.apply_move(Color::Black, at(1, 1)),
            Err(RuleError::GameAlreadyOver)
        );
    }

    #[test]
    fn test_out_of_turn() {
        let mut game = QuantumGo::new(5, 6.5);
        let before = game.clone();
        assert_eq!(
            game.apply_move(Color::White, at(1, 1)),
            Err(RuleError::OutOfTurn {
                expected: Color::Black,
                got: Color::White
            })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_score_notation() {
        assert_eq!(GameResult::from_score(0.5).to_string(), "B+0.5");
        assert_eq!(GameResult::from_score(-6.5).to_string(), "W+6.5");
        assert_eq!(GameResult::from_score(3.0).to_string(), "B+3.0");
        assert_eq!(GameResult::from_score(-12.0).to_string(), "W+12.0");
        assert_eq!(GameResult::from_score(0.0).to_string(), "Tie");
        assert_eq!(GameResult::from_score(-1.0).winner(), Winner::White);
    }

    #[test]
    fn test_display_shows_both_subgames() {
        let mut game = QuantumGo::new(3, 0.0);
        play(&mut game, at(1, 1));
        play(&mut game, at(3, 3));
        let text = game.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "X . .    O . .");
        assert_eq!(lines[3], ". . O    . . X");
    }
}
