//! Transport abstraction for a single client connection.
//!
//! The HTTP layer performs the upgrade and hands the core anything implementing
//! [`Transport`]. The core splits it once: the writer half goes to the write pump
//! and the reader half to the read pump, so each direction has exactly one owner.

use crate::error::Error;
use async_trait::async_trait;

/// Literal text message used as a keep-alive probe.
pub const PING: &str = "ping";
/// Literal text message sent in reply to a [`PING`].
pub const PONG: &str = "pong";

/// A message-oriented frame exchanged with a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping,
    Pong,
    Close,
}

impl Frame {
    /// Classifies an inbound text message. Only the exact keep-alive literals
    /// are treated as control frames.
    pub fn from_text(text: &str) -> Self {
        match text {
            PING => Frame::Ping,
            PONG => Frame::Pong,
            other => Frame::Text(other.to_string()),
        }
    }

    /// Wraps rendered payload bytes, preferring a text frame when the bytes are UTF-8.
    pub fn payload(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Frame::Text(text),
            Err(e) => Frame::Binary(e.into_bytes()),
        }
    }
}

/// Writer half of a transport.
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send(&mut self, frame: Frame) -> Result<(), Error>;

    /// Closes the writer half. Errors while closing are not interesting to the core.
    async fn close(&mut self);
}

/// Reader half of a transport. `None` means the peer closed the connection.
#[async_trait]
pub trait FrameStream: Send + 'static {
    async fn recv(&mut self) -> Option<Result<Frame, Error>>;
}

/// A live bidirectional connection that can be split into its two halves.
pub trait Transport: Send + 'static {
    type Sink: FrameSink;
    type Stream: FrameStream;

    fn split(self) -> (Self::Sink, Self::Stream);
}
