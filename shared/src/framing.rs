//! Message framing over a continuous byte stream
//!
//! Two wire formats are supported:
//! - `Delimited`: payload followed by the reserved `*` byte. The default,
//!   compatible with every existing client.
//! - `LengthPrefixed`: 4-byte big-endian payload length, then the payload.
//!
//! Decoding is incremental. Bytes from the transport are appended to a buffer
//! and `Framing::decode` pulls at most one complete message out of it,
//! leaving any trailing bytes for the next call. This makes the decoder
//! indifferent to how the peer's writes were split or coalesced by TCP.

use crate::error::ProtocolError;
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reserved end-of-message byte for delimited framing
pub const DELIMITER: u8 = b'*';

/// Largest payload either framing will buffer before giving up on the peer
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const LENGTH_PREFIX_LEN: usize = 4;
const READ_CHUNK_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    Delimited,
    LengthPrefixed,
}

impl Framing {
    /// Longest secret word whose match positions can be carried in a result
    /// message without colliding with the framing.
    ///
    /// Positions travel as single bytes. Under delimited framing a position
    /// equal to `DELIMITER` would terminate the message early, so positions
    /// must stay below it.
    pub fn max_word_len(self) -> usize {
        match self {
            Framing::Delimited => DELIMITER as usize,
            Framing::LengthPrefixed => u8::MAX as usize + 1,
        }
    }

    /// Produces the exact bytes to put on the wire for one message
    pub fn encode(self, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::violation(format!(
                "message too large: {} bytes (max {})",
                payload.len(),
                MAX_FRAME_LEN
            )));
        }

        match self {
            Framing::Delimited => {
                if payload.contains(&DELIMITER) {
                    return Err(ProtocolError::violation(
                        "payload contains the frame delimiter",
                    ));
                }
                let mut bytes = Vec::with_capacity(payload.len() + 1);
                bytes.extend_from_slice(payload);
                bytes.push(DELIMITER);
                Ok(bytes)
            }
            Framing::LengthPrefixed => {
                let mut bytes = Vec::with_capacity(payload.len() + LENGTH_PREFIX_LEN);
                bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                bytes.extend_from_slice(payload);
                Ok(bytes)
            }
        }
    }

    /// Removes one complete message from the front of `buffer`
    ///
    /// Returns `Ok(None)` when more bytes are needed. Bytes following the
    /// message stay in `buffer`.
    pub fn decode(self, buffer: &mut Vec<u8>) -> Result<Option<Vec<u8>>, ProtocolError> {
        match self {
            Framing::Delimited => match buffer.iter().position(|&b| b == DELIMITER) {
                Some(end) => {
                    let rest = buffer.split_off(end + 1);
                    let mut frame = std::mem::replace(buffer, rest);
                    frame.pop();
                    Ok(Some(frame))
                }
                None if buffer.len() > MAX_FRAME_LEN => Err(ProtocolError::violation(format!(
                    "no delimiter within {} bytes",
                    MAX_FRAME_LEN
                ))),
                None => Ok(None),
            },
            Framing::LengthPrefixed => {
                if buffer.len() < LENGTH_PREFIX_LEN {
                    return Ok(None);
                }
                let mut prefix = [0u8; LENGTH_PREFIX_LEN];
                prefix.copy_from_slice(&buffer[..LENGTH_PREFIX_LEN]);
                let len = u32::from_be_bytes(prefix) as usize;
                if len > MAX_FRAME_LEN {
                    return Err(ProtocolError::violation(format!(
                        "message too large: {} bytes (max {})",
                        len, MAX_FRAME_LEN
                    )));
                }
                if buffer.len() < LENGTH_PREFIX_LEN + len {
                    return Ok(None);
                }
                let rest = buffer.split_off(LENGTH_PREFIX_LEN + len);
                let frame = std::mem::replace(buffer, rest);
                Ok(Some(frame[LENGTH_PREFIX_LEN..].to_vec()))
            }
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Delimited => write!(f, "delimited"),
            Framing::LengthPrefixed => write!(f, "length-prefixed"),
        }
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delimited" => Ok(Framing::Delimited),
            "length-prefixed" | "length" => Ok(Framing::LengthPrefixed),
            other => Err(format!(
                "unknown framing '{}', expected 'delimited' or 'length-prefixed'",
                other
            )),
        }
    }
}

/// A byte stream carrying framed messages
///
/// Owns the transport and the receive buffer, so reads may be resumed after
/// each message without losing bytes that arrived early.
pub struct FramedStream<S> {
    stream: S,
    framing: Framing,
    buffer: Vec<u8>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, framing: Framing) -> Self {
        Self {
            stream,
            framing,
            buffer: Vec::new(),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Waits for the next complete message
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            if let Some(frame) = self.framing.decode(&mut self.buffer)? {
                return Ok(frame);
            }

            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Reads the next message and requires it to be UTF-8 text
    pub async fn read_text(&mut self) -> Result<String, ProtocolError> {
        let frame = self.read_frame().await?;
        String::from_utf8(frame).map_err(|_| ProtocolError::violation("message is not valid UTF-8"))
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
        let bytes = self.framing.encode(payload)?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Closes the write half of the transport
    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
