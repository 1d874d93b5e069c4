//! Error taxonomy shared by both peers of the protocol

use std::io;

/// Failures raised while moving framed messages over a byte stream
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The underlying read or write reported an error
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The peer closed the stream (zero-length read)
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A malformed or out-of-sequence message
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

impl ProtocolError {
    pub fn violation(message: impl Into<String>) -> Self {
        ProtocolError::ProtocolViolation(message.into())
    }

    /// True when the peer simply went away rather than misbehaving
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::ConnectionClosed => true,
            ProtocolError::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ),
            ProtocolError::ProtocolViolation(_) => false,
        }
    }
}

/// Reasons a secret word is unusable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordError {
    #[error("word is empty")]
    Empty,

    #[error("word has {len} letters, at most {max} fit the result message")]
    TooLong { len: usize, max: usize },

    #[error("word contains {0:?}, only uppercase ASCII letters are allowed")]
    InvalidCharacter(char),
}
