use crate::agent::ValueAgent;
use crate::board::{Board, Marks};
use crate::error::Error;
use itertools::Itertools;
use std::io::{BufRead, Write};

pub trait Player {
    fn get_name(&self) -> &str;
    fn choose_move(&mut self, board: &Board, mark: Marks) -> Result<(usize, usize), Error>;
}

impl Player for ValueAgent {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, board: &Board, mark: Marks) -> Result<(usize, usize), Error> {
        self.select_action(board, mark)
    }
}

/// Parses a `row col` command, both zero-based.
pub fn parse_cmd(user_cmd: &str) -> Option<(usize, usize)> {
    user_cmd
        .split_whitespace()
        .map(|token| token.parse::<usize>().ok())
        .collect_tuple::<(_, _)>()
        .and_then(|(row, col)| Some((row?, col?)))
}

/// A person at the keyboard, or any other line-based input.
#[derive(Debug)]
pub struct HumanPlayer<R, W> {
    pub name: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(name: &str, input: R, output: W) -> Self {
        HumanPlayer {
            name: name.to_owned(),
            input,
            output,
        }
    }

    fn read_line(&mut self) -> Result<String, Error> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line.trim().to_owned())
    }

    pub fn choose_first(&mut self) -> Result<bool, Error> {
        write!(self.output, "would you like to go first (y/n)? ")?;
        loop {
            match self.read_line()?.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => write!(self.output, "please answer y or n: ")?,
            }
        }
    }

    pub fn tell(&mut self, message: &str) -> Result<(), Error> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn get_name(&self) -> &str {
        &self.name
    }

    /// Keeps asking until the command names an empty cell on the board.
    fn choose_move(&mut self, board: &Board, mark: Marks) -> Result<(usize, usize), Error> {
        writeln!(self.output, "{}", board)?;
        write!(self.output, "{} ({}), enter position (row col): ", self.name, mark.as_char())?;
        loop {
            let user_cmd = self.read_line()?;
            match parse_cmd(&user_cmd) {
                Some((row, col)) if board.is_vacant(row, col) => return Ok((row, col)),
                Some(_) => write!(self.output, "invalid, enter a new position: ")?,
                None => write!(self.output, "could not read '{}', enter a new position (row col): ", user_cmd)?,
            }
        }
    }
}
