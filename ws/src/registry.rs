use crate::connection::{Connection, ConnectionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// The set of live connections.
///
/// Owned by the manager's event loop, which is the only code that mutates it.
/// Other tasks observe its size through the `watch` channel, which is updated
/// after each mutation completes.
pub(crate) struct Registry {
    connections: HashMap<ConnectionId, Arc<Connection>>,
    count: watch::Sender<usize>,
}

impl Registry {
    pub(crate) fn new(count: watch::Sender<usize>) -> Self {
        count.send_replace(0);
        Self {
            connections: HashMap::new(),
            count,
        }
    }

    pub(crate) fn insert(&mut self, connection: Arc<Connection>) {
        self.connections.insert(connection.id().clone(), connection);
        self.publish();
    }

    /// Removes the connection and then fires its done signal. Returns `false`
    /// when it was already gone, in which case nothing is touched.
    pub(crate) fn remove(&mut self, connection: &Connection) -> bool {
        match self.connections.remove(connection.id()) {
            Some(removed) => {
                self.publish();
                removed.close();
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.values().cloned().collect()
    }

    /// Empties the set and closes every connection that was in it.
    pub(crate) fn close_all(&mut self) -> usize {
        let drained: Vec<Arc<Connection>> =
            self.connections.drain().map(|(_, connection)| connection).collect();
        self.publish();

        for connection in &drained {
            connection.close();
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    fn publish(&self) {
        self.count.send_replace(self.connections.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Pumps;
    use crate::testing::{mock_transport, MockTransport, SinkMode};

    fn connection(client_id: &str) -> (Arc<Connection>, Pumps<MockTransport>) {
        let (transport, _peer) = mock_transport(SinkMode::Normal);
        Connection::new(client_id.to_string(), 0, transport, 4)
    }

    #[test]
    fn test_insert_and_remove_publish_count() {
        let (count_tx, count_rx) = watch::channel(0);
        let mut registry = Registry::new(count_tx);
        let (a, _a_pumps) = connection("a");
        let (b, _b_pumps) = connection("b");

        registry.insert(Arc::clone(&a));
        registry.insert(Arc::clone(&b));
        assert_eq!(*count_rx.borrow(), 2);

        assert!(registry.remove(&a));
        assert_eq!(*count_rx.borrow(), 1);
        assert_eq!(registry.len(), 1);
        assert!(a.is_closed());
        assert!(!b.is_closed());
    }

    #[test]
    fn test_remove_twice_is_a_noop() {
        let (count_tx, count_rx) = watch::channel(0);
        let mut registry = Registry::new(count_tx);
        let (a, _a_pumps) = connection("a");
        let (b, _b_pumps) = connection("b");
        registry.insert(Arc::clone(&a));
        registry.insert(Arc::clone(&b));

        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert_eq!(*count_rx.borrow(), 1);
        assert!(!b.is_closed());
    }

    #[test]
    fn test_unknown_connection_is_never_closed() {
        let (count_tx, _count_rx) = watch::channel(0);
        let mut registry = Registry::new(count_tx);
        let (stranger, _pumps) = connection("stranger");

        assert!(!registry.remove(&stranger));
        assert!(!stranger.is_closed());
    }

    #[test]
    fn test_close_all_empties_and_closes() {
        let (count_tx, count_rx) = watch::channel(0);
        let mut registry = Registry::new(count_tx);
        let held: Vec<_> = ["a", "b", "c"].iter().map(|id| connection(id)).collect();
        for (connection, _) in &held {
            registry.insert(Arc::clone(connection));
        }
        assert_eq!(registry.snapshot().len(), 3);

        assert_eq!(registry.close_all(), 3);
        assert_eq!(*count_rx.borrow(), 0);
        assert!(registry.snapshot().is_empty());
        assert!(held.iter().all(|(connection, _)| connection.is_closed()));
    }
}
