//! Wire protocol shared by the hangman server and client
//!
//! A session is a strict request/response exchange of framed messages:
//!
//! 1. client → server: player name
//! 2. server → client: secret word (uppercase letters)
//! 3. client → server: guess (only the first character is significant)
//! 4. server → client: guess outcome `[won][correct][position]*`
//! 5. once `won` is set, server → client: leaderboard report text
//!
//! Steps 3 and 4 repeat until the word is fully revealed.

pub mod error;
pub mod framing;

pub use error::{ProtocolError, WordError};
pub use framing::{FramedStream, Framing, DELIMITER, MAX_FRAME_LEN};

pub const DEFAULT_PORT: u16 = 8080;

/// Longest accepted player name, in characters
pub const MAX_NAME_LEN: usize = 32;

/// Result of one guess as carried on the wire
///
/// Encoded as one flag byte for `won`, one flag byte for `correct`, then one
/// byte per newly revealed position. Positions are unordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub won: bool,
    pub correct: bool,
    pub positions: Vec<u8>,
}

impl GuessOutcome {
    /// Builds an outcome from revealed word positions
    ///
    /// Every position must be below `framing.max_word_len()`; anything larger
    /// cannot be represented and is rejected instead of wrapping.
    pub fn new(won: bool, positions: &[usize], framing: Framing) -> Result<Self, ProtocolError> {
        let limit = framing.max_word_len();
        let positions = positions
            .iter()
            .map(|&pos| {
                if pos < limit {
                    Ok(pos as u8)
                } else {
                    Err(ProtocolError::violation(format!(
                        "position {} does not fit a {} result message",
                        pos, framing
                    )))
                }
            })
            .collect::<Result<Vec<u8>, _>>()?;

        Ok(Self {
            won,
            correct: !positions.is_empty(),
            positions,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.positions.len());
        bytes.push(self.won as u8);
        bytes.push(self.correct as u8);
        bytes.extend_from_slice(&self.positions);
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < 2 {
            return Err(ProtocolError::violation(format!(
                "guess outcome needs at least 2 bytes, got {}",
                bytes.len()
            )));
        }

        let won = decode_flag(bytes[0], "won")?;
        let correct = decode_flag(bytes[1], "correct")?;
        let positions = bytes[2..].to_vec();

        if correct == positions.is_empty() {
            return Err(ProtocolError::violation(
                "correct flag disagrees with the revealed positions",
            ));
        }

        Ok(Self {
            won,
            correct,
            positions,
        })
    }
}

fn decode_flag(byte: u8, name: &str) -> Result<bool, ProtocolError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ProtocolError::violation(format!(
            "{} flag must be 0 or 1, got {}",
            name, other
        ))),
    }
}

/// Checks that `word` is usable as a secret word of at most `max_len` letters
pub fn validate_word(word: &str, max_len: usize) -> Result<(), WordError> {
    if word.is_empty() {
        return Err(WordError::Empty);
    }
    if let Some(c) = word.chars().find(|c| !c.is_ascii_uppercase()) {
        return Err(WordError::InvalidCharacter(c));
    }
    if word.len() > max_len {
        return Err(WordError::TooLong {
            len: word.len(),
            max: max_len,
        });
    }
    Ok(())
}

/// Extracts the guessed letter from a guess message
///
/// Only the first character counts. ASCII letters are upper-cased; anything
/// else is a protocol violation.
pub fn parse_guess(message: &[u8]) -> Result<u8, ProtocolError> {
    match message.first() {
        None => Err(ProtocolError::violation("empty guess")),
        Some(b) if b.is_ascii_alphabetic() => Ok(b.to_ascii_uppercase()),
        Some(b) => Err(ProtocolError::violation(format!(
            "guess must start with a letter, got byte {}",
            b
        ))),
    }
}

/// Normalizes and checks a player name received during the handshake
///
/// Names end up in the leaderboard report, which must stay sendable under
/// either framing, so the delimiter byte is refused even when the session
/// itself is length-prefixed.
pub fn parse_player_name(raw: &str) -> Result<String, ProtocolError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ProtocolError::violation("player name is empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ProtocolError::violation(format!(
            "player name longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ProtocolError::violation(
            "player name contains control characters",
        ));
    }
    if name.contains(DELIMITER as char) {
        return Err(ProtocolError::violation(format!(
            "player name contains the reserved {:?} character",
            DELIMITER as char
        )));
    }
    Ok(name.to_string())
}
