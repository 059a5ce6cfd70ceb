//! Adapts an upgraded axum `WebSocket` to the `ws` transport traits.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::*;
use ws::error::TransportErrorKind;
use ws::transport::{PING, PONG};
use ws::{Error, Frame, FrameSink, FrameStream, Transport};

pub(crate) struct AxumTransport {
    socket: WebSocket,
}

impl AxumTransport {
    pub(crate) fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for AxumTransport {
    type Sink = AxumSink;
    type Stream = AxumStream;

    fn split(self) -> (AxumSink, AxumStream) {
        let (sink, stream) = self.socket.split();
        (AxumSink { sink }, AxumStream { stream })
    }
}

pub(crate) struct AxumSink {
    sink: SplitSink<WebSocket, Message>,
}

pub(crate) struct AxumStream {
    stream: SplitStream<WebSocket>,
}

/// Keep-alive frames travel as the literal text messages browsers can see,
/// protocol level pings are answered by axum itself.
fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes.into()),
        Frame::Ping => Message::Text(PING.into()),
        Frame::Pong => Message::Text(PONG.into()),
        Frame::Close => Message::Close(None),
    }
}

fn to_frame(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::from_text(text.as_str()),
        Message::Binary(bytes) => Frame::Binary(bytes.to_vec()),
        // Any protocol level keep-alive counts as traffic from a live peer.
        Message::Ping(_) | Message::Pong(_) => Frame::Pong,
        Message::Close(_) => Frame::Close,
    }
}

#[async_trait]
impl FrameSink for AxumSink {
    async fn send(&mut self, frame: Frame) -> Result<(), Error> {
        self.sink
            .send(to_message(frame))
            .await
            .map_err(|e| Error::transport(TransportErrorKind::Write, e))
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            trace!("Closing WebSocket writer failed: {e}");
        }
    }
}

#[async_trait]
impl FrameStream for AxumStream {
    async fn recv(&mut self) -> Option<Result<Frame, Error>> {
        match self.stream.next().await? {
            Ok(message) => Some(Ok(to_frame(message))),
            Err(e) => Some(Err(Error::transport(TransportErrorKind::Read, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keepalive_frames_are_sent_as_text_literals() {
        assert_eq!(to_message(Frame::Ping), Message::Text("ping".into()));
        assert_eq!(to_message(Frame::Pong), Message::Text("pong".into()));
        assert_eq!(
            to_message(Frame::Text("<span>1</span>".to_string())),
            Message::Text("<span>1</span>".into())
        );
    }

    #[test]
    fn test_inbound_messages_map_to_frames() {
        assert_eq!(to_frame(Message::Text("ping".into())), Frame::Ping);
        assert_eq!(to_frame(Message::Text("pong".into())), Frame::Pong);
        assert_eq!(
            to_frame(Message::Text("hello".into())),
            Frame::Text("hello".to_string())
        );
        assert_eq!(to_frame(Message::Ping(Vec::new().into())), Frame::Pong);
        assert_eq!(to_frame(Message::Close(None)), Frame::Close);
    }
}
