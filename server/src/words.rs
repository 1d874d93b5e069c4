//! Secret word selection

use log::{info, warn};
use rand::seq::SliceRandom;
use shared::{validate_word, WordError};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum WordSourceError {
    #[error("failed to read word list: {0}")]
    Io(#[from] io::Error),

    #[error("word list contains no usable words")]
    Empty,

    #[error("invalid word {word:?}: {source}")]
    InvalidWord {
        word: String,
        #[source]
        source: WordError,
    },
}

/// Supplies secret words to new sessions
pub trait WordSource: Send + Sync {
    fn next_word(&self) -> Result<String, WordSourceError>;
}

/// Words loaded from a newline-separated list, picked at random
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Loads a word list file, keeping words of at most `max_len` letters
    pub fn from_file(path: impl AsRef<Path>, max_len: usize) -> Result<Self, WordSourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let list = Self::parse(&text, max_len)?;
        info!("Loaded {} words from {}", list.len(), path.display());
        Ok(list)
    }

    /// Parses one word per line; lines are trimmed and upper-cased
    ///
    /// Lines that still are not valid words are skipped with a warning.
    pub fn parse(text: &str, max_len: usize) -> Result<Self, WordSourceError> {
        let mut words = Vec::new();
        let mut skipped = 0;

        for line in text.lines() {
            let word = line.trim().to_ascii_uppercase();
            if word.is_empty() {
                continue;
            }
            match validate_word(&word, max_len) {
                Ok(()) => words.push(word),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping word {:?}: {}", word, e);
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {} unusable lines in word list", skipped);
        }
        if words.is_empty() {
            return Err(WordSourceError::Empty);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

impl WordSource for WordList {
    fn next_word(&self) -> Result<String, WordSourceError> {
        self.words
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(WordSourceError::Empty)
    }
}

/// Hands out a fixed sequence of words in order, wrapping around
#[derive(Debug)]
pub struct FixedWords {
    words: Vec<String>,
    next: AtomicUsize,
}

impl FixedWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl WordSource for FixedWords {
    fn next_word(&self) -> Result<String, WordSourceError> {
        if self.words.is_empty() {
            return Err(WordSourceError::Empty);
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.words.len();
        Ok(self.words[index].clone())
    }
}
