use crate::connection::{ClientId, Connection, Marker};
use crate::error::{Error, ManagerErrorKind};
use crate::registry::Registry;
use crate::render::Render;
use crate::settings::Settings;
use crate::transport::Transport;
use futures::stream::{self, StreamExt};
use log::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Registrations waiting for the event loop.
const REGISTER_CAPACITY: usize = 16;
/// Unregistrations waiting for the event loop.
const UNREGISTER_CAPACITY: usize = 64;

/// A connection handed to the event loop, acknowledged once it is in the registry.
struct Registration {
    connection: Arc<Connection>,
    ack: oneshot::Sender<()>,
}

/// Receiving ends owned by the event loop once it starts.
struct LoopChannels {
    register: mpsc::Receiver<Registration>,
    unregister: mpsc::Receiver<Arc<Connection>>,
    broadcast: mpsc::Receiver<()>,
    count: watch::Sender<usize>,
}

/// Single authority over the set of live connections.
///
/// All registry mutation happens inside the event loop run by [`Manager::start`];
/// everything else talks to it over channels. Cloning is cheap and every clone
/// addresses the same loop.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

struct Inner {
    settings: Settings,
    render: Arc<dyn Render>,
    register: mpsc::Sender<Registration>,
    unregister: mpsc::Sender<Arc<Connection>>,
    broadcast: mpsc::Sender<()>,
    count: watch::Receiver<usize>,
    // Shared by every pass and initial sync, bounds sends in flight.
    permits: Arc<Semaphore>,
    passes: AtomicU64,
    channels: Mutex<Option<LoopChannels>>,
}

impl Manager {
    pub fn new<R: Render>(settings: Settings, render: R) -> Self {
        let (register_tx, register_rx) = mpsc::channel(REGISTER_CAPACITY);
        let (unregister_tx, unregister_rx) = mpsc::channel(UNREGISTER_CAPACITY);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(settings.broadcast_capacity.max(1));
        let (count_tx, count_rx) = watch::channel(0);
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_sends.max(1)));

        Self {
            inner: Arc::new(Inner {
                settings,
                render: Arc::new(render),
                register: register_tx,
                unregister: unregister_tx,
                broadcast: broadcast_tx,
                count: count_rx,
                permits,
                passes: AtomicU64::new(0),
                channels: Mutex::new(Some(LoopChannels {
                    register: register_rx,
                    unregister: unregister_rx,
                    broadcast: broadcast_rx,
                    count: count_tx,
                })),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Runs the event loop until `shutdown` is cancelled, then force-closes every
    /// connection and aborts in-flight sends. May only be called once.
    pub async fn start(&self, shutdown: CancellationToken) -> Result<(), Error> {
        let LoopChannels {
            mut register,
            mut unregister,
            mut broadcast,
            count,
        } = self
            .inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| Error::manager(ManagerErrorKind::AlreadyStarted))?;

        let mut registry = Registry::new(count);
        let mut syncs: JoinSet<()> = JoinSet::new();
        // At most one broadcast pass runs; requests arriving meanwhile collapse
        // into a single follow-up pass over a fresh snapshot.
        let mut pass: JoinSet<()> = JoinSet::new();
        let mut follow_up = false;

        info!("Starting feed notification manager");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(Registration { connection, ack }) = register.recv() => {
                    registry.insert(Arc::clone(&connection));
                    if ack.send(()).is_err() {
                        // The registering caller went away before its pumps started.
                        registry.remove(&connection);
                        continue;
                    }
                    info!(
                        "Registered new connection {} for client {} ({} live)",
                        connection.id(),
                        connection.client_id(),
                        registry.len()
                    );
                    syncs.spawn(initial_sync(
                        Arc::clone(&self.inner.render),
                        connection,
                        self.inner.settings.send_timeout,
                        Arc::clone(&self.inner.permits),
                    ));
                }
                Some(connection) = unregister.recv() => {
                    if registry.remove(&connection) {
                        info!(
                            "Unregistered connection {} for client {} ({} live)",
                            connection.id(),
                            connection.client_id(),
                            registry.len()
                        );
                    }
                }
                Some(()) = broadcast.recv() => {
                    if pass.is_empty() {
                        self.spawn_pass(&registry, &mut pass);
                    } else if !follow_up {
                        debug!("Broadcast pass still running, scheduling one follow-up pass");
                        follow_up = true;
                    }
                }
                Some(joined) = pass.join_next(), if !pass.is_empty() => {
                    report_panic(joined);
                    if std::mem::take(&mut follow_up) {
                        self.spawn_pass(&registry, &mut pass);
                    }
                }
                Some(joined) = syncs.join_next(), if !syncs.is_empty() => {
                    report_panic(joined);
                }
            }
        }

        info!("Shutting down feed notification manager");
        let closed = registry.close_all();
        pass.shutdown().await;
        syncs.shutdown().await;
        info!("Closed all {closed} WebSocket connections");

        Ok(())
    }

    /// Starts a fan-out pass over the current registry.
    fn spawn_pass(&self, registry: &Registry, pass: &mut JoinSet<()>) {
        let snapshot = registry.snapshot();
        let number = self.inner.passes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Broadcasting feed counter update to {} connections (pass {number})",
            snapshot.len()
        );
        if !snapshot.is_empty() {
            pass.spawn(fan_out(
                Arc::clone(&self.inner.render),
                snapshot,
                self.inner.settings.send_timeout,
                self.inner.settings.max_concurrent_sends,
                Arc::clone(&self.inner.permits),
            ));
        }
    }

    /// Hands a freshly upgraded transport to the event loop and starts its pumps.
    ///
    /// Returns once the connection is in the registry. Fails with
    /// `ManagerErrorKind::Shutdown` if the event loop is no longer running.
    pub async fn register_connection<T: Transport>(
        &self,
        client_id: impl Into<ClientId>,
        last_marker: Marker,
        transport: T,
    ) -> Result<Arc<Connection>, Error> {
        let (connection, pumps) = Connection::new(
            client_id.into(),
            last_marker,
            transport,
            self.inner.settings.outbound_capacity,
        );
        debug!(
            "Registering new connection for client {} (last marker {last_marker})",
            connection.client_id()
        );

        let (ack, acked) = oneshot::channel();
        self.inner
            .register
            .send(Registration {
                connection: Arc::clone(&connection),
                ack,
            })
            .await
            .map_err(|_| Error::manager(ManagerErrorKind::Shutdown))?;
        acked
            .await
            .map_err(|_| Error::manager(ManagerErrorKind::Shutdown))?;

        pumps.spawn(self.clone(), &self.inner.settings);
        Ok(connection)
    }

    /// Asks the event loop to remove a connection. Removing a connection that is
    /// already gone does nothing.
    pub async fn unregister_connection(&self, connection: &Arc<Connection>) {
        debug!("Unregistering connection {}", connection.id());
        if self
            .inner
            .unregister
            .send(Arc::clone(connection))
            .await
            .is_err()
        {
            debug!(
                "Manager already stopped, connection {} was closed on shutdown",
                connection.id()
            );
        }
    }

    /// Requests a refresh for every live connection. Never blocks: if a refresh
    /// is already pending this call is absorbed by it.
    pub fn broadcast(&self) {
        match self.inner.broadcast.try_send(()) {
            Ok(()) => debug!("Feed update notification queued"),
            Err(TrySendError::Full(())) => {
                debug!("Feed update already pending, coalescing notification")
            }
            Err(TrySendError::Closed(())) => {
                warn!("Feed notification manager stopped, dropping notification")
            }
        }
    }

    /// Number of live connections, as last published by the event loop.
    pub fn connection_count(&self) -> usize {
        *self.inner.count.borrow()
    }

    /// A receiver that observes every change to the connection count.
    pub fn watch_count(&self) -> watch::Receiver<usize> {
        self.inner.count.clone()
    }

    /// Number of broadcast passes the event loop has run.
    pub fn broadcast_passes(&self) -> u64 {
        self.inner.passes.load(Ordering::Relaxed)
    }
}

async fn initial_sync(
    render: Arc<dyn Render>,
    connection: Arc<Connection>,
    send_timeout: Duration,
    permits: Arc<Semaphore>,
) {
    let Ok(_permit) = permits.acquire().await else {
        return;
    };
    connection.send_update(render.as_ref(), send_timeout).await;
}

/// Sends one update to each connection in the snapshot. Each send holds a
/// permit, so passes and initial syncs together never exceed the limit.
async fn fan_out(
    render: Arc<dyn Render>,
    connections: Vec<Arc<Connection>>,
    send_timeout: Duration,
    limit: usize,
    permits: Arc<Semaphore>,
) {
    stream::iter(connections)
        .for_each_concurrent(limit.max(1), |connection| {
            let render = Arc::clone(&render);
            let permits = Arc::clone(&permits);
            async move {
                let Ok(_permit) = permits.acquire().await else {
                    return;
                };
                connection.send_update(render.as_ref(), send_timeout).await;
            }
        })
        .await;
}

fn report_panic(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("Send task panicked: {e}");
        }
    }
}
