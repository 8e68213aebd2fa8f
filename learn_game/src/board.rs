use crate::error::Error;
use crate::q_table::StateKey;
use itertools::Itertools;
use ndarray::prelude::*;
use std::{fmt, ops::Deref};

pub const EMPTY: i8 = 0;
pub const SIDE: usize = 3;
pub const NUM_CELLS: usize = SIDE * SIDE;

/// The two sides of a game. The discriminant is the value written into a cell,
/// `NOUGHT` always moves first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Marks {
    NOUGHT = 1isize,
    CROSS = -1isize,
}

impl Marks {
    pub fn other(self) -> Self {
        match self {
            Self::NOUGHT => Marks::CROSS,
            Self::CROSS => Marks::NOUGHT,
        }
    }
    pub fn sign(self) -> i8 {
        self as i8
    }
    pub fn as_char(self) -> char {
        match self {
            Self::NOUGHT => 'o',
            Self::CROSS => 'x',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsGameOver {
    InPlay,
    Drawn,
    Win,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub state: Array2<i8>,
}

impl Deref for Board {
    type Target = Array2<i8>;
    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_char(value: i8) -> char {
    match value {
        1 => Marks::NOUGHT.as_char(),
        -1 => Marks::CROSS.as_char(),
        _ => ' ',
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (a, b, c) in self.state.iter().map(|&value| cell_char(value)).tuples::<(_, _, _)>() {
            writeln!(f, "------")?;
            writeln!(f, "{}|{}|{}", a, b, c)?;
        }
        write!(f, "------")
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            state: Array2::zeros((SIDE, SIDE)),
        }
    }

    pub fn from_rows(rows: [[i8; SIDE]; SIDE]) -> Self {
        let mut board = Board::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                board.state[[r, c]] = value.signum();
            }
        }
        board
    }

    pub fn reset(&mut self) {
        self.state.fill(EMPTY);
    }

    /// The same position with every mark swapped for the opponent's.
    pub fn flipped(&self) -> Board {
        Board {
            state: self.state.mapv(|value| -value),
        }
    }

    pub fn is_vacant(&self, row: usize, col: usize) -> bool {
        self.state.get([row, col]) == Some(&EMPTY)
    }

    pub fn place(&mut self, mark: Marks, (row, col): (usize, usize)) -> Result<(), Error> {
        match self.state.get_mut([row, col]) {
            None => Err(Error::OutOfBounds { row, col }),
            Some(cell) if *cell != EMPTY => Err(Error::OccupiedCell { row, col }),
            Some(cell) => {
                *cell = mark.sign();
                Ok(())
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.iter().all(|&value| value != EMPTY)
    }

    /// Rows, columns and both diagonals.
    fn lines(&self) -> Vec<[i8; SIDE]> {
        let mut lines = Vec::with_capacity(2 * SIDE + 2);
        for row in self.rows() {
            lines.push([row[0], row[1], row[2]]);
        }
        for column in self.columns() {
            lines.push([column[0], column[1], column[2]]);
        }
        let diag = self.diag();
        lines.push([diag[0], diag[1], diag[2]]);
        lines.push([self.state[[0, 2]], self.state[[1, 1]], self.state[[2, 0]]]);
        lines
    }

    pub fn winner(&self) -> Option<Marks> {
        self.lines()
            .into_iter()
            .find(|line| line[0] != EMPTY && line.iter().all_equal())
            .map(|line| if line[0] > 0 { Marks::NOUGHT } else { Marks::CROSS })
    }

    pub fn win(&self) -> bool {
        self.winner().is_some()
    }

    pub fn end(&self) -> bool {
        self.win() || self.is_full()
    }

    /// Status of the game right after `mark` has moved.
    pub fn is_game_over(&self, mark: Marks) -> IsGameOver {
        match self.winner() {
            Some(winner) if winner == mark => IsGameOver::Win,
            _ if self.is_full() => IsGameOver::Drawn,
            _ => IsGameOver::InPlay,
        }
    }

    /// Flattens the board row-major and multiplies every cell by the sign of
    /// `mark`, so the caller's own marks always read as `+1`.
    pub fn normalize(&self, mark: Marks) -> StateKey {
        let sign = mark.sign();
        let mut cells = [EMPTY; NUM_CELLS];
        for (cell, &value) in cells.iter_mut().zip(self.iter()) {
            *cell = value * sign;
        }
        StateKey::new(cells)
    }
}
