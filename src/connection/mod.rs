//! Connection capability consumed by the cast layer
//!
//! The cast layer never touches sockets. Both the owner's game connection and
//! every viewer connection are reached through [`ConnectionHandle`], a small
//! capability that can queue an outgoing message, request a disconnect, and
//! report who is on the other end. Queuing must not block: the dispatcher
//! calls these methods while it owns all cast state.
//!
//! [`ChannelConnection`] is the adapter used by the I/O layer: a connection's
//! writer task drains its [`ConnectionEvents`] and encodes the messages in
//! whatever wire format the game protocol uses.

pub mod channel;

use std::fmt;
use std::net::IpAddr;

pub use channel::{ChannelConnection, ConnectionEvents};

/// Identity of an owning game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single network connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Chat channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u16);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Message queued for delivery to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Open a chat channel tab on the client
    OpenChannel { channel: ChannelId, name: String },

    /// Line spoken on a channel. An empty author marks a system notice.
    ChannelMessage {
        channel: ChannelId,
        author: String,
        text: String,
    },

    /// Private status line shown only to the recipient
    Status(String),
}

impl Outgoing {
    /// Create a system notice on a channel
    pub fn notice(channel: ChannelId, text: impl Into<String>) -> Self {
        Outgoing::ChannelMessage {
            channel,
            author: String::new(),
            text: text.into(),
        }
    }

    /// Create a private status line
    pub fn status(text: impl Into<String>) -> Self {
        Outgoing::Status(text.into())
    }

    /// Text carried by this message, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::OpenChannel { .. } => None,
            Outgoing::ChannelMessage { text, .. } | Outgoing::Status(text) => Some(text),
        }
    }
}

/// One network connection, as seen by the cast layer
///
/// Implementations are shared between the connection's own I/O task and the
/// cast session that lists it, so every method takes `&self`.
pub trait ConnectionHandle: Send + Sync {
    /// Queue a message for the client. Dropped silently once disconnected.
    fn send(&self, message: Outgoing);

    /// Ask the I/O layer to close the connection. Does not wait for it.
    fn disconnect(&self);

    /// Remote address of the peer
    fn remote_addr(&self) -> IpAddr;

    /// Connection identity
    fn identity(&self) -> ConnectionId;

    /// Whether the connection is still usable
    fn is_connected(&self) -> bool;
}
