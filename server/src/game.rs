use shared::{validate_word, WordError};

/// Lifecycle of a single word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
}

/// Effect of applying one guess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessResult {
    /// Positions revealed by this guess, ascending
    pub matched_positions: Vec<usize>,
    /// True when this guess revealed the last hidden letter
    pub won_now: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("guess submitted after the word was already solved")]
    AlreadyWon,
}

/// One player's secret word and reveal state
///
/// Pure state machine: `InProgress` until every position is revealed, then
/// `Won` for good. There is no losing state and no guess limit.
#[derive(Debug, Clone)]
pub struct GameSession {
    word: Vec<u8>,
    revealed: Vec<bool>,
    guess_count: u32,
    correct_letters: usize,
    status: GameStatus,
}

impl GameSession {
    pub fn new(word: &str) -> Result<Self, WordError> {
        validate_word(word, usize::MAX)?;

        Ok(Self {
            word: word.as_bytes().to_vec(),
            revealed: vec![false; word.len()],
            guess_count: 0,
            correct_letters: 0,
            status: GameStatus::InProgress,
        })
    }

    /// Reveals every still-hidden occurrence of `letter`
    ///
    /// Counts as a guess whether or not anything matched. A letter whose
    /// occurrences are all revealed already matches nothing.
    pub fn apply_guess(&mut self, letter: u8) -> Result<GuessResult, GameError> {
        if self.is_terminal() {
            return Err(GameError::AlreadyWon);
        }

        let mut matched_positions = Vec::new();
        for (i, (&c, revealed)) in self.word.iter().zip(self.revealed.iter_mut()).enumerate() {
            if c == letter && !*revealed {
                *revealed = true;
                matched_positions.push(i);
            }
        }

        self.guess_count += 1;
        self.correct_letters += matched_positions.len();

        let won_now = self.correct_letters == self.word.len();
        if won_now {
            self.status = GameStatus::Won;
        }

        Ok(GuessResult {
            matched_positions,
            won_now,
        })
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status == GameStatus::Won
    }

    /// Guesses per letter of the word, lower is better; only defined once won
    pub fn final_score(&self) -> Option<f64> {
        if self.is_terminal() {
            Some(self.guess_count as f64 / self.word.len() as f64)
        } else {
            None
        }
    }

    pub fn word(&self) -> &str {
        // Validated as ASCII in `new`
        std::str::from_utf8(&self.word).unwrap_or_default()
    }

    pub fn word_len(&self) -> usize {
        self.word.len()
    }

    pub fn guess_count(&self) -> u32 {
        self.guess_count
    }

    pub fn correct_letter_count(&self) -> usize {
        self.correct_letters
    }

    pub fn revealed(&self) -> &[bool] {
        &self.revealed
    }

    /// The word with hidden letters shown as `-`
    pub fn masked(&self) -> String {
        self.word
            .iter()
            .zip(&self.revealed)
            .map(|(&c, &shown)| if shown { c as char } else { '-' })
            .collect()
    }
}
