//! Console input: player name and letter guesses read line by line

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Turns one typed line into a guess letter
///
/// Only the first character counts; it is upper-cased and must be an ASCII
/// letter.
pub fn parse_guess_input(line: &str) -> Option<u8> {
    let first = line.trim().chars().next()?;
    first
        .is_ascii_alphabetic()
        .then(|| first.to_ascii_uppercase() as u8)
}

/// Line reader over any buffered async source, normally stdin
pub struct InputReader<R> {
    reader: R,
}

impl<R> InputReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Next trimmed line, or `None` once input is exhausted
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Reads lines until a non-empty name arrives
    pub async fn read_name(&mut self) -> io::Result<Option<String>> {
        while let Some(line) = self.next_line().await? {
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Reads lines until one starts with a letter; `on_invalid` runs for
    /// each rejected line so the caller can re-prompt
    pub async fn read_guess(&mut self, mut on_invalid: impl FnMut(&str)) -> io::Result<Option<u8>> {
        while let Some(line) = self.next_line().await? {
            match parse_guess_input(&line) {
                Some(letter) => return Ok(Some(letter)),
                None => on_invalid(&line),
            }
        }
        Ok(None)
    }
}
