use crate::game::ClientGameState;
use std::io::{self, Write};

/// Writes the game to a text console
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn prompt_name(&mut self) -> io::Result<()> {
        write!(self.out, "Enter your name: ")?;
        self.out.flush()
    }

    pub fn draw_turn(&mut self, game: &ClientGameState) -> io::Result<()> {
        writeln!(self.out, "\nTurn {}", game.guesses() + 1)?;
        writeln!(self.out, "{}", game.masked())?;
        write!(self.out, "Guess a letter: ")?;
        self.out.flush()
    }

    pub fn invalid_guess(&mut self, line: &str) -> io::Result<()> {
        write!(self.out, "{:?} is not a letter, try again: ", line)?;
        self.out.flush()
    }

    pub fn draw_verdict(&mut self, correct: bool) -> io::Result<()> {
        if correct {
            writeln!(self.out, "Correct!")
        } else {
            writeln!(self.out, "Incorrect Guess!")
        }
    }

    pub fn draw_victory(&mut self, game: &ClientGameState) -> io::Result<()> {
        writeln!(self.out, "\nYou won!")?;
        writeln!(self.out, "Word: {}", game.word())?;
        writeln!(self.out, "Guesses: {}", game.guesses())?;
        writeln!(self.out, "Score: {:.2}", game.score())
    }

    pub fn draw_leaderboard(&mut self, report: &str) -> io::Result<()> {
        writeln!(self.out, "{}", report)?;
        self.out.flush()
    }
}
