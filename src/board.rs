//! A single subgame board.
//!
//! The board is a plain row-major grid of [`Color`]. It knows nothing about
//! turns or entanglement; the rules engine owns two of these and decides what
//! to place and what to remove.

use std::fmt;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    Empty,
    Black,
    White,
}

impl Color {
    /// The other player. `Empty` has no opponent and maps to itself.
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            Color::Empty => Color::Empty,
        }
    }

    /// Single-letter notation used in results and SGF (`B`, `W`).
    pub fn letter(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
            Color::Empty => '.',
        }
    }
}

/// A board intersection, 0-indexed.
///
/// Externally (action tables, logs) coordinates are reported 1-indexed; use
/// [`Coord::from_one_based`] and [`Coord::one_based`] at those edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Build from a 1-indexed `(row, column)` pair.
    ///
    /// # Panics
    /// If either component is zero.
    pub fn from_one_based(row: usize, col: usize) -> Self {
        assert!(row >= 1 && col >= 1, "1-indexed coordinate ({row}, {col})");
        Self::new(row - 1, col - 1)
    }

    /// The 1-indexed `(row, column)` pair.
    pub fn one_based(self) -> (usize, usize) {
        (self.row + 1, self.col + 1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.one_based();
        write!(f, "({row},{col})")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    cells: Vec<Color>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Color::Empty; width * height],
        }
    }

    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    fn idx(&self, c: Coord) -> usize {
        assert!(self.in_bounds(c), "coordinate {c} outside {}x{} board", self.width, self.height);
        c.row * self.width + c.col
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        c.row < self.height && c.col < self.width
    }

    pub fn get(&self, c: Coord) -> Color {
        self.cells[self.idx(c)]
    }

    pub fn set(&mut self, c: Coord, color: Color) {
        let i = self.idx(c);
        self.cells[i] = color;
    }

    pub fn is_empty_at(&self, c: Coord) -> bool {
        self.get(c) == Color::Empty
    }

    /// Orthogonal neighbors that lie on the board.
    pub fn neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        let mut v = Vec::with_capacity(4);
        if c.row > 0 {
            v.push(Coord::new(c.row - 1, c.col));
        }
        if c.row + 1 < self.height {
            v.push(Coord::new(c.row + 1, c.col));
        }
        if c.col > 0 {
            v.push(Coord::new(c.row, c.col - 1));
        }
        if c.col + 1 < self.width {
            v.push(Coord::new(c.row, c.col + 1));
        }
        v.into_iter()
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Coord::new(row, col)))
    }

    /// Collect the 4-connected group of same-colored stones containing `start`.
    ///
    /// Returns an empty group when `start` is empty.
    pub fn group(&self, start: Coord) -> Vec<Coord> {
        let color = self.get(start);
        if color == Color::Empty {
            return Vec::new();
        }
        let mut stack = vec![start];
        let mut visited = vec![false; self.cells.len()];
        let mut out = Vec::new();
        while let Some(c) = stack.pop() {
            let i = self.idx(c);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            out.push(c);
            for n in self.neighbors(c) {
                if !visited[self.idx(n)] && self.get(n) == color {
                    stack.push(n);
                }
            }
        }
        out
    }

    /// True if any stone of `group` touches an empty intersection.
    pub fn has_liberty(&self, group: &[Coord]) -> bool {
        group
            .iter()
            .any(|&c| self.neighbors(c).any(|n| self.is_empty_at(n)))
    }

    /// Clear every stone of `group`, returning how many were removed.
    pub fn remove(&mut self, group: &[Coord]) -> usize {
        for &c in group {
            self.set(c, Color::Empty);
        }
        group.len()
    }

    /// One text row of the board, used for side-by-side rendering.
    pub(crate) fn render_row(&self, row: usize) -> String {
        (0..self.width)
            .map(|col| match self.get(Coord::new(row, col)) {
                Color::Black => 'X',
                Color::White => 'O',
                Color::Empty => '.',
            })
            .flat_map(|ch| [ch, ' '])
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            writeln!(f, "{}", self.render_row(row).trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_corner_and_center() {
        let board = Board::square(5);
        assert_eq!(board.neighbors(Coord::new(0, 0)).count(), 2);
        assert_eq!(board.neighbors(Coord::new(0, 2)).count(), 3);
        assert_eq!(board.neighbors(Coord::new(2, 2)).count(), 4);
    }

    #[test]
    fn test_group_and_liberties() {
        let mut board = Board::square(5);
        board.set(Coord::new(1, 1), Color::Black);
        board.set(Coord::new(1, 2), Color::Black);
        board.set(Coord::new(2, 2), Color::White);

        let group = board.group(Coord::new(1, 1));
        assert_eq!(group.len(), 2);
        assert!(board.has_liberty(&group));
        assert!(board.group(Coord::new(4, 4)).is_empty());
    }

    #[test]
    fn test_group_without_liberty() {
        let mut board = Board::square(3);
        board.set(Coord::new(0, 0), Color::White);
        board.set(Coord::new(0, 1), Color::Black);
        board.set(Coord::new(1, 0), Color::Black);

        let group = board.group(Coord::new(0, 0));
        assert!(!board.has_liberty(&group));
        assert_eq!(board.remove(&group), 1);
        assert!(board.is_empty_at(Coord::new(0, 0)));
    }

    #[test]
    fn test_one_based_roundtrip() {
        let c = Coord::from_one_based(3, 5);
        assert_eq!(c, Coord::new(2, 4));
        assert_eq!(c.one_based(), (3, 5));
        assert_eq!(c.to_string(), "(3,5)");
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let board = Board::square(5);
        board.get(Coord::new(5, 0));
    }

    #[test]
    fn test_display() {
        let mut board = Board::square(2);
        board.set(Coord::new(0, 1), Color::Black);
        board.set(Coord::new(1, 0), Color::White);
        assert_eq!(board.to_string(), ". X\nO .\n");
    }
}
