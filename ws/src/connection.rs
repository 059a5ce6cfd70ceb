use crate::error::{Error, TransportErrorKind};
use crate::manager::Manager;
use crate::render::Render;
use crate::settings::Settings;
use crate::transport::{Frame, FrameSink, FrameStream, Transport};
use log::*;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Identifier of the authenticated principal behind a connection (stable across reconnects).
pub type ClientId = String;

/// The last state version a client is known to have seen.
pub type Marker = i64;

/// Pong replies waiting for the write pump. A reply already pending covers any new ping.
const CONTROL_CAPACITY: usize = 1;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one attempt to push an update onto a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// The connection was closed before or while the payload was queued.
    Closed,
    /// The outbound queue stayed full for the whole send timeout.
    TimedOut,
    RenderFailed,
}

/// Server-side session for one client: its outbound queue and lifecycle signal.
///
/// Once registered the connection is owned by the manager; the transport halves
/// belong to the two pumps and nothing else touches them.
pub struct Connection {
    id: ConnectionId,
    client_id: ClientId,
    last_marker: Marker,
    outbound: mpsc::Sender<Vec<u8>>,
    control: mpsc::Sender<Frame>,
    done: CancellationToken,
}

/// The receiving ends and transport of a connection, consumed when the pumps start.
pub(crate) struct Pumps<T: Transport> {
    connection: Arc<Connection>,
    transport: T,
    outbound: mpsc::Receiver<Vec<u8>>,
    control: mpsc::Receiver<Frame>,
}

impl Connection {
    pub(crate) fn new<T: Transport>(
        client_id: ClientId,
        last_marker: Marker,
        transport: T,
        outbound_capacity: usize,
    ) -> (Arc<Self>, Pumps<T>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity.max(1));
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);

        let connection = Arc::new(Self {
            id: ConnectionId::new(),
            client_id,
            last_marker,
            outbound: outbound_tx,
            control: control_tx,
            done: CancellationToken::new(),
        });

        let pumps = Pumps {
            connection: Arc::clone(&connection),
            transport,
            outbound: outbound_rx,
            control: control_rx,
        };

        (connection, pumps)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn last_marker(&self) -> Marker {
        self.last_marker
    }

    /// True once the manager has removed this connection.
    pub fn is_closed(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Resolves when the connection has been removed and closed.
    pub async fn closed(&self) {
        self.done.cancelled().await
    }

    /// Number of payloads queued but not yet written.
    pub fn pending(&self) -> usize {
        self.outbound.max_capacity() - self.outbound.capacity()
    }

    /// Fires the done signal. Only the registry calls this, after removal.
    pub(crate) fn close(&self) {
        self.done.cancel();
    }

    /// Renders the current state for this client and queues it for the write pump.
    pub(crate) async fn send_update(&self, render: &dyn Render, max_wait: Duration) -> SendOutcome {
        if self.is_closed() {
            return SendOutcome::Closed;
        }

        let payload = match render.render(self.last_marker).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    "Error rendering update for client {} (connection {}): {e}",
                    self.client_id, self.id
                );
                return SendOutcome::RenderFailed;
            }
        };

        let outcome = self.enqueue(payload, max_wait).await;
        match outcome {
            SendOutcome::TimedOut => warn!(
                "Timeout sending update to client {} (connection {}), client is slow or suspended",
                self.client_id, self.id
            ),
            SendOutcome::Closed => debug!("Connection {} closed before update was queued", self.id),
            _ => {}
        }
        outcome
    }

    pub(crate) async fn enqueue(&self, payload: Vec<u8>, max_wait: Duration) -> SendOutcome {
        if self.is_closed() {
            return SendOutcome::Closed;
        }

        tokio::select! {
            biased;
            _ = self.done.cancelled() => SendOutcome::Closed,
            sent = self.outbound.send_timeout(payload, max_wait) => match sent {
                Ok(()) => SendOutcome::Queued,
                Err(SendTimeoutError::Timeout(_)) => SendOutcome::TimedOut,
                Err(SendTimeoutError::Closed(_)) => SendOutcome::Closed,
            },
        }
    }

    fn queue_pong(&self) {
        match self.control.try_send(Frame::Pong) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => {
                debug!("Write pump for connection {} already stopped", self.id)
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("client_id", &self.client_id)
            .field("last_marker", &self.last_marker)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T: Transport> Pumps<T> {
    /// Splits the transport and starts the write and read pumps.
    pub(crate) fn spawn(self, manager: Manager, settings: &Settings) {
        let (sink, stream) = self.transport.split();

        tokio::spawn(write_pump(
            Arc::clone(&self.connection),
            sink,
            self.outbound,
            self.control,
            manager.clone(),
            settings.write_timeout,
            settings.ping_period(),
        ));
        tokio::spawn(read_pump(self.connection, stream, manager));
    }
}

/// Sole writer of the transport: drains queued payloads and pong replies, and
/// sends a keep-alive ping every `ping_period`.
async fn write_pump<S: FrameSink>(
    connection: Arc<Connection>,
    mut sink: S,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    mut control: mpsc::Receiver<Frame>,
    manager: Manager,
    write_timeout: Duration,
    ping_period: Duration,
) {
    let mut ticker = match Instant::now().checked_add(ping_period) {
        Some(first_ping) => time::interval_at(first_ping, ping_period),
        None => time::interval(ping_period),
    };
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failed = false;

    loop {
        let frame = tokio::select! {
            biased;
            _ = connection.done.cancelled() => break,
            Some(frame) = control.recv() => frame,
            message = outbound.recv() => match message {
                Some(payload) => Frame::payload(payload),
                None => break,
            },
            _ = ticker.tick() => Frame::Ping,
        };

        if let Err(e) = write_frame(&mut sink, frame, write_timeout).await {
            error!(
                "Error writing to client {} (connection {}): {e}",
                connection.client_id, connection.id
            );
            failed = true;
            break;
        }
    }

    outbound.close();
    if time::timeout(write_timeout, sink.close()).await.is_err() {
        debug!("Timed out closing transport for connection {}", connection.id);
    }

    if failed && !connection.is_closed() {
        manager.unregister_connection(&connection).await;
    }
}

/// Sole reader of the transport. Answers pings and ignores everything else;
/// only a read error, the peer closing, or the done signal ends it. An idle
/// but open peer stays connected.
async fn read_pump<R: FrameStream>(connection: Arc<Connection>, mut stream: R, manager: Manager) {
    loop {
        let next = tokio::select! {
            biased;
            _ = connection.done.cancelled() => break,
            next = stream.recv() => next,
        };

        match next {
            None | Some(Ok(Frame::Close)) => {
                info!(
                    "Connection {} closed by client {}",
                    connection.id, connection.client_id
                );
                break;
            }
            Some(Err(e)) => {
                debug!(
                    "Read error from client {} (connection {}): {e}",
                    connection.client_id, connection.id
                );
                break;
            }
            Some(Ok(Frame::Ping)) => connection.queue_pong(),
            Some(Ok(_)) => {}
        }
    }

    drop(stream);
    if !connection.is_closed() {
        manager.unregister_connection(&connection).await;
    }
}

async fn write_frame<S: FrameSink>(
    sink: &mut S,
    frame: Frame,
    deadline: Duration,
) -> Result<(), Error> {
    match time::timeout(deadline, sink.send(frame)).await {
        Ok(result) => result,
        Err(elapsed) => Err(Error::transport(TransportErrorKind::Timeout, elapsed)),
    }
}
