//! # Hangman Client Library
//!
//! Console client for the hangman server. [`network::Client`] speaks the
//! protocol and keeps a local copy of the reveal mask in
//! [`game::ClientGameState`]; `input` and `rendering` handle the terminal.
//!
//! The client never knows more than the server has told it: letters are
//! shown only at positions returned in a guess outcome.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
