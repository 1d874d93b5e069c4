//! Per-connection protocol driver
//!
//! A `SessionHandler` owns one transport and walks it through
//! `AwaitingName → AwaitingWordAssignment → PlayTurn(n) → Finished`. The only
//! state it shares with other sessions is the leaderboard and the word
//! source, both reached through the `SessionContext`.
//!
//! Every failure is local: the handler returns an error, closes its own
//! transport and leaves the rest of the server untouched.

use crate::game::{GameError, GameSession};
use crate::leaderboard::{render_report, Leaderboard};
use crate::words::{WordSource, WordSourceError};
use log::{debug, info, warn};
use shared::{
    parse_guess, parse_player_name, validate_word, FramedStream, Framing, GuessOutcome,
    ProtocolError,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Dependencies shared by every session of one server
pub struct SessionContext {
    pub leaderboard: Arc<Leaderboard>,
    pub words: Arc<dyn WordSource>,
    pub framing: Framing,
    /// Upper bound on how long a peer may stay silent; `None` waits forever
    pub idle_timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("word source failed: {0}")]
    WordSource(#[from] WordSourceError),

    #[error("game error: {0}")]
    Game(#[from] GameError),

    #[error("peer was idle for more than {0:?}")]
    IdleTimeout(Duration),
}

impl SessionError {
    /// True when the peer simply left; not worth a warning
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SessionError::Protocol(e) if e.is_disconnect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingName,
    AwaitingWordAssignment,
    PlayTurn(u32),
    Finished,
}

/// What a completed session reports back to the acceptor
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub player: String,
    pub word: String,
    pub guesses: u32,
    pub score: f64,
    /// 1-based leaderboard rank, if the score made the board
    pub rank: Option<usize>,
}

pub struct SessionHandler<S> {
    stream: FramedStream<S>,
    context: Arc<SessionContext>,
    peer: String,
    phase: SessionPhase,
    player: Option<String>,
    game: Option<GameSession>,
}

impl<S> SessionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl fmt::Display, context: Arc<SessionContext>) -> Self {
        Self {
            stream: FramedStream::new(stream, context.framing),
            context,
            peer: peer.to_string(),
            phase: SessionPhase::AwaitingName,
            player: None,
            game: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Plays one full game over the connection, then closes it
    pub async fn run(mut self) -> Result<SessionSummary, SessionError> {
        let result = self.drive().await;

        if let Err(e) = self.stream.shutdown().await {
            debug!("[{}] Shutdown failed: {}", self.peer, e);
        }
        result
    }

    async fn drive(&mut self) -> Result<SessionSummary, SessionError> {
        loop {
            match self.phase {
                SessionPhase::AwaitingName => self.receive_name().await?,
                SessionPhase::AwaitingWordAssignment => self.assign_word().await?,
                SessionPhase::PlayTurn(turn) => self.play_turn(turn).await?,
                SessionPhase::Finished => return self.finish().await,
            }
        }
    }

    async fn receive_name(&mut self) -> Result<(), SessionError> {
        let raw = self.read_text().await?;
        let name = parse_player_name(&raw)?;
        info!("[{}] Player name: {}", self.peer, name);

        self.player = Some(name);
        self.phase = SessionPhase::AwaitingWordAssignment;
        Ok(())
    }

    async fn assign_word(&mut self) -> Result<(), SessionError> {
        let word = self.context.words.next_word()?;
        validate_word(&word, self.context.framing.max_word_len()).map_err(|source| {
            WordSourceError::InvalidWord {
                word: word.clone(),
                source,
            }
        })?;
        let game = GameSession::new(&word).map_err(|source| WordSourceError::InvalidWord {
            word: word.clone(),
            source,
        })?;
        debug!("[{}] Secret word: {}", self.peer, word);

        self.stream.write_frame(word.as_bytes()).await?;

        self.game = Some(game);
        self.phase = SessionPhase::PlayTurn(1);
        Ok(())
    }

    async fn play_turn(&mut self, turn: u32) -> Result<(), SessionError> {
        let message = self.read_frame().await?;
        let letter = parse_guess(&message)?;

        let game = self.game_mut()?;
        let result = game.apply_guess(letter)?;
        let masked = game.masked();

        debug!(
            "[{}] Turn {}: guessed {} -> {:?} ({})",
            self.peer, turn, letter as char, result.matched_positions, masked
        );

        let outcome = GuessOutcome::new(
            result.won_now,
            &result.matched_positions,
            self.context.framing,
        )?;
        self.stream.write_frame(&outcome.encode()).await?;

        self.phase = if result.won_now {
            SessionPhase::Finished
        } else {
            SessionPhase::PlayTurn(turn + 1)
        };
        Ok(())
    }

    async fn finish(&mut self) -> Result<SessionSummary, SessionError> {
        let player = self.player.clone().unwrap_or_default();
        let game = self.game_mut()?;
        let word = game.word().to_string();
        let guesses = game.guess_count();
        let score = game
            .final_score()
            .ok_or_else(|| ProtocolError::violation("session finished before the word was solved"))?;

        let leaderboard = &self.context.leaderboard;
        let rank = leaderboard.submit(&player, score).await;
        if let Err(e) = leaderboard.persist().await {
            warn!("[{}] Could not save leaderboard: {}", self.peer, e);
        }

        let report = render_report(&leaderboard.snapshot().await);
        self.stream.write_frame(report.as_bytes()).await?;

        Ok(SessionSummary {
            player,
            word,
            guesses,
            score,
            rank,
        })
    }

    fn game_mut(&mut self) -> Result<&mut GameSession, ProtocolError> {
        self.game
            .as_mut()
            .ok_or_else(|| ProtocolError::violation("no word has been assigned"))
    }

    async fn read_frame(&mut self) -> Result<Vec<u8>, SessionError> {
        match self.context.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.stream.read_frame())
                .await
                .map_err(|_| SessionError::IdleTimeout(limit))?
                .map_err(SessionError::from),
            None => Ok(self.stream.read_frame().await?),
        }
    }

    async fn read_text(&mut self) -> Result<String, SessionError> {
        let frame = self.read_frame().await?;
        String::from_utf8(frame)
            .map_err(|_| ProtocolError::violation("message is not valid UTF-8").into())
    }
}
