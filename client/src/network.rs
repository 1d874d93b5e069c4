//! Client side of the hangman protocol
//!
//! `Client` mirrors the server's session handler: it sends the player name,
//! receives the word, exchanges guesses for outcomes until the server reports
//! a win, then reads the leaderboard report. Calls made out of that order are
//! rejected locally as protocol violations.

use crate::game::ClientGameState;
use log::{debug, info};
use shared::{FramedStream, Framing, GuessOutcome, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    AwaitingName,
    Playing,
    AwaitingLeaderboard,
    Done,
}

/// What one guess achieved, from the player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub correct: bool,
    pub won: bool,
    pub newly_revealed: usize,
}

pub struct Client<S> {
    stream: FramedStream<S>,
    phase: ClientPhase,
    game: Option<ClientGameState>,
}

impl Client<TcpStream> {
    pub async fn connect(addr: &str, framing: Framing) -> Result<Self, ProtocolError> {
        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Client::new(stream, framing))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, framing: Framing) -> Self {
        Self {
            stream: FramedStream::new(stream, framing),
            phase: ClientPhase::AwaitingName,
            game: None,
        }
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn game(&self) -> Option<&ClientGameState> {
        self.game.as_ref()
    }

    /// Sends the player name and waits for the secret word
    pub async fn join(&mut self, name: &str) -> Result<&ClientGameState, ProtocolError> {
        self.expect_phase(ClientPhase::AwaitingName)?;

        self.stream.write_frame(name.as_bytes()).await?;
        let word = self.stream.read_text().await?;
        let game = ClientGameState::new(&word, self.stream.framing().max_word_len())?;
        debug!("Joined as {}, word has {} letters", name, game.word_len());

        self.phase = ClientPhase::Playing;
        Ok(self.game.insert(game))
    }

    /// Guesses one letter and applies the server's answer to the local mask
    pub async fn guess(&mut self, letter: u8) -> Result<TurnReport, ProtocolError> {
        self.expect_phase(ClientPhase::Playing)?;
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(ProtocolError::violation(format!(
                "guess must be a letter, got {:?}",
                letter as char
            )));
        }

        self.stream.write_frame(&[letter]).await?;
        let outcome = GuessOutcome::decode(&self.stream.read_frame().await?)?;

        let game = self
            .game
            .as_mut()
            .ok_or_else(|| ProtocolError::violation("no game in progress"))?;
        let newly_revealed = game.apply_outcome(letter, &outcome)?;
        debug!("Guess {} -> {:?}", letter as char, outcome.positions);

        if outcome.won {
            self.phase = ClientPhase::AwaitingLeaderboard;
        }

        Ok(TurnReport {
            correct: outcome.correct,
            won: outcome.won,
            newly_revealed,
        })
    }

    /// Reads the leaderboard report sent after a win
    pub async fn receive_leaderboard(&mut self) -> Result<String, ProtocolError> {
        self.expect_phase(ClientPhase::AwaitingLeaderboard)?;
        let report = self.stream.read_text().await?;
        self.phase = ClientPhase::Done;

        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown failed: {}", e);
        }
        Ok(report)
    }

    fn expect_phase(&self, expected: ClientPhase) -> Result<(), ProtocolError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ProtocolError::violation(format!(
                "expected {:?} but client is in {:?}",
                expected, self.phase
            )))
        }
    }
}
