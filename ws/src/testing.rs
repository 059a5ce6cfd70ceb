//! In-memory transport used by the unit tests to drive the real pumps.

use crate::error::{Error, TransportErrorKind};
use crate::transport::{Frame, FrameSink, FrameStream, Transport};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

const FRAME_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SinkMode {
    Normal,
    /// Every write hangs forever, like a client whose socket buffer never drains.
    Stall,
    /// Every write fails, like a reset connection.
    Fail,
}

pub(crate) struct MockTransport {
    sink: MockSink,
    stream: MockStream,
}

pub(crate) struct MockSink {
    written: Option<mpsc::UnboundedSender<Frame>>,
    mode: SinkMode,
}

pub(crate) struct MockStream {
    inbound: mpsc::UnboundedReceiver<Result<Frame, Error>>,
}

/// The client side of a mock transport.
pub(crate) struct MockPeer {
    written: mpsc::UnboundedReceiver<Frame>,
    inbound: Option<mpsc::UnboundedSender<Result<Frame, Error>>>,
}

pub(crate) fn mock_transport(mode: SinkMode) -> (MockTransport, MockPeer) {
    let (written_tx, written_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    let transport = MockTransport {
        sink: MockSink {
            written: Some(written_tx),
            mode,
        },
        stream: MockStream { inbound: inbound_rx },
    };
    let peer = MockPeer {
        written: written_rx,
        inbound: Some(inbound_tx),
    };

    (transport, peer)
}

impl Transport for MockTransport {
    type Sink = MockSink;
    type Stream = MockStream;

    fn split(self) -> (MockSink, MockStream) {
        (self.sink, self.stream)
    }
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, frame: Frame) -> Result<(), Error> {
        match self.mode {
            SinkMode::Normal => match &self.written {
                Some(written) => written
                    .send(frame)
                    .map_err(|_| Error::from(TransportErrorKind::Closed)),
                None => Err(Error::from(TransportErrorKind::Closed)),
            },
            SinkMode::Stall => std::future::pending().await,
            SinkMode::Fail => Err(Error::transport(
                TransportErrorKind::Write,
                "connection reset by peer",
            )),
        }
    }

    async fn close(&mut self) {
        self.written = None;
    }
}

#[async_trait]
impl FrameStream for MockStream {
    async fn recv(&mut self) -> Option<Result<Frame, Error>> {
        self.inbound.recv().await
    }
}

impl MockPeer {
    /// Next frame written by the server, panicking if none arrives in time.
    pub(crate) async fn next_frame(&mut self) -> Frame {
        time::timeout(FRAME_WAIT, self.written.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("transport closed while waiting for a frame")
    }

    /// Next payload frame, skipping keep-alive traffic.
    pub(crate) async fn next_text(&mut self) -> String {
        loop {
            match self.next_frame().await {
                Frame::Text(text) => return text,
                Frame::Ping | Frame::Pong => continue,
                other => panic!("unexpected frame {other:?}"),
            }
        }
    }

    /// True if nothing at all is written for `quiet`.
    pub(crate) async fn is_quiet_for(&mut self, quiet: Duration) -> bool {
        time::timeout(quiet, self.written.recv()).await.is_err()
    }

    /// Waits until the server closes its writer half, discarding anything still in flight.
    pub(crate) async fn wait_closed(&mut self) {
        time::timeout(FRAME_WAIT, async {
            while self.written.recv().await.is_some() {}
        })
        .await
        .expect("server never closed the transport")
    }

    pub(crate) fn send(&self, frame: Frame) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.send(Ok(frame));
        }
    }

    pub(crate) fn fail_read(&self) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.send(Err(Error::transport(
                TransportErrorKind::Read,
                "connection reset by peer",
            )));
        }
    }

    /// Drops the client's writer, which the server sees as end of stream.
    pub(crate) fn disconnect(&mut self) {
        self.inbound = None;
    }
}
