use shared::{validate_word, GuessOutcome, ProtocolError};

/// The player's view of the word being guessed
///
/// Mirrors the server's reveal mask using only the positions the server
/// confirmed for each guess.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    word: Vec<u8>,
    revealed: Vec<bool>,
    guesses: u32,
    won: bool,
}

impl ClientGameState {
    /// Starts a game from the word announced by the server
    pub fn new(word: &str, max_len: usize) -> Result<Self, ProtocolError> {
        validate_word(word, max_len)
            .map_err(|e| ProtocolError::violation(format!("server sent an unusable word: {}", e)))?;

        Ok(Self {
            word: word.as_bytes().to_vec(),
            revealed: vec![false; word.len()],
            guesses: 0,
            won: false,
        })
    }

    /// Applies the server's verdict on `letter`, returning how many
    /// positions became visible
    pub fn apply_outcome(
        &mut self,
        letter: u8,
        outcome: &GuessOutcome,
    ) -> Result<usize, ProtocolError> {
        if let Some(&pos) = outcome
            .positions
            .iter()
            .find(|&&pos| pos as usize >= self.word.len())
        {
            return Err(ProtocolError::violation(format!(
                "position {} is outside a {}-letter word",
                pos,
                self.word.len()
            )));
        }

        self.guesses += 1;

        let mut newly_revealed = 0;
        for &pos in &outcome.positions {
            let pos = pos as usize;
            if self.word[pos] == letter && !self.revealed[pos] {
                self.revealed[pos] = true;
                newly_revealed += 1;
            }
        }

        if outcome.won {
            self.won = true;
        }
        Ok(newly_revealed)
    }

    pub fn word(&self) -> &str {
        std::str::from_utf8(&self.word).unwrap_or_default()
    }

    pub fn word_len(&self) -> usize {
        self.word.len()
    }

    pub fn guesses(&self) -> u32 {
        self.guesses
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn score(&self) -> f64 {
        self.guesses as f64 / self.word.len() as f64
    }

    /// The word as the player may see it, hidden letters as `-`
    pub fn masked(&self) -> String {
        self.word
            .iter()
            .zip(&self.revealed)
            .map(|(&c, &shown)| if shown { c as char } else { '-' })
            .collect()
    }
}
