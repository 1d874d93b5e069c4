//! # Hangman Server Library
//!
//! Authoritative server for the networked hangman game. The server picks a
//! secret word for every player who connects, judges their letter guesses,
//! and ranks finished games on a shared leaderboard.
//!
//! ## Core Responsibilities
//!
//! ### Game Judging
//! Each connection gets its own [`game::GameSession`]: a secret word and the
//! mask of letters revealed so far. The client only ever learns positions the
//! server has confirmed, so it cannot reveal letters it has not guessed.
//!
//! ### Leaderboard
//! A single [`leaderboard::Leaderboard`] is constructed at startup and shared
//! by every session. It keeps the best (lowest) scores, where a score is the
//! number of guesses divided by the word length.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! The acceptor in [`network::Server`] spawns one detached tokio task per
//! connection. Sessions never talk to each other; the leaderboard lock is the
//! only point where they meet. A failing session ends that connection only.
//!
//! ### Request/Response Protocol
//! Within a session the exchange is strictly sequential: name, word, then
//! guess/outcome pairs until the word is solved, then the leaderboard report.
//! Messages are framed by [`shared::Framing`].
//!
//! ## Module Organization
//!
//! - `game`: reveal-mask state machine for one word
//! - `leaderboard`: bounded, sorted score list with optional file backing
//! - `network`: TCP listener, connection cap, task spawning
//! - `session`: per-connection protocol state machine
//! - `words`: word sources (random from a list, or a fixed sequence)
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//! use server::words::WordList;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "0.0.0.0:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!     let words = WordList::from_file("words.txt", config.framing.max_word_len())?;
//!
//!     let server = Server::bind(config, Arc::new(words)).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod leaderboard;
pub mod network;
pub mod session;
pub mod words;
