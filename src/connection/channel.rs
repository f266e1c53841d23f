//! Channel-backed connection adapter
//!
//! Bridges the cast dispatcher to a connection's writer task. Sends go into
//! an unbounded queue so the dispatcher never waits on a slow socket, and a
//! disconnect request is a `watch` flag the writer task observes.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::{ConnectionHandle, ConnectionId, Outgoing};

/// [`ConnectionHandle`] that forwards to the connection's writer task
pub struct ChannelConnection {
    id: ConnectionId,
    remote_addr: IpAddr,
    tx: mpsc::UnboundedSender<Outgoing>,
    closed: watch::Sender<bool>,
}

/// Receiving half held by the connection's writer task
pub struct ConnectionEvents {
    rx: mpsc::UnboundedReceiver<Outgoing>,
    closed: watch::Receiver<bool>,
}

impl ChannelConnection {
    /// Create a connection handle and the events its writer task consumes
    pub fn new(id: ConnectionId, remote_addr: IpAddr) -> (Arc<Self>, ConnectionEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (closed, closed_rx) = watch::channel(false);

        let conn = Arc::new(Self {
            id,
            remote_addr,
            tx,
            closed,
        });

        (
            conn,
            ConnectionEvents {
                rx,
                closed: closed_rx,
            },
        )
    }
}

impl ConnectionHandle for ChannelConnection {
    fn send(&self, message: Outgoing) {
        if *self.closed.borrow() {
            return;
        }

        if self.tx.send(message).is_err() {
            tracing::debug!(connection = %self.id, "Writer gone, message dropped");
        }
    }

    fn disconnect(&self) {
        if !self.closed.send_replace(true) {
            tracing::debug!(
                connection = %self.id,
                peer = %self.remote_addr,
                "Disconnect requested"
            );
        }
    }

    fn remote_addr(&self) -> IpAddr {
        self.remote_addr
    }

    fn identity(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        !*self.closed.borrow() && !self.tx.is_closed()
    }
}

impl ConnectionEvents {
    /// Wait for the next message to write
    ///
    /// Messages queued before a disconnect are still returned; after that the
    /// stream ends with `None`.
    pub async fn recv(&mut self) -> Option<Outgoing> {
        if let Ok(message) = self.rx.try_recv() {
            return Some(message);
        }
        if *self.closed.borrow() {
            return None;
        }

        tokio::select! {
            biased;
            message = self.rx.recv() => message,
            _ = self.closed.changed() => self.rx.try_recv().ok(),
        }
    }

    /// Take every message queued so far without waiting
    pub fn drain(&mut self) -> Vec<Outgoing> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Whether a disconnect was requested
    pub fn is_disconnected(&self) -> bool {
        *self.closed.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn test_send_and_drain() {
        let (conn, mut events) = ChannelConnection::new(ConnectionId(1), localhost());

        conn.send(Outgoing::status("hello"));
        conn.send(Outgoing::status("world"));

        let messages = events.drain();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), Some("hello"));
        assert!(conn.is_connected());
    }

    #[test]
    fn test_send_after_disconnect_is_dropped() {
        let (conn, mut events) = ChannelConnection::new(ConnectionId(1), localhost());

        conn.disconnect();
        conn.send(Outgoing::status("late"));

        assert!(events.drain().is_empty());
        assert!(events.is_disconnected());
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_dropped_events_marks_disconnected() {
        let (conn, events) = ChannelConnection::new(ConnectionId(1), localhost());
        drop(events);

        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn test_recv_flushes_then_ends() {
        let (conn, mut events) = ChannelConnection::new(ConnectionId(2), localhost());

        conn.send(Outgoing::status("bye"));
        conn.disconnect();

        assert_eq!(events.recv().await, Some(Outgoing::status("bye")));
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn test_recv_wakes_on_disconnect() {
        let (conn, mut events) = ChannelConnection::new(ConnectionId(3), localhost());

        let waiter = tokio::spawn(async move { events.recv().await });
        tokio::task::yield_now().await;
        conn.disconnect();

        assert_eq!(waiter.await.unwrap(), None);
    }
}
