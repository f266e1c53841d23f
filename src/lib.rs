//! Live-cast broadcast layer for MMO game servers
//!
//! A live cast lets one active game session (the *owner*) be watched by any
//! number of read-only viewer connections. The owner moderates the audience
//! with chat commands typed on a reserved cast channel, and a directory query
//! lets clients discover active casts, optionally filtered by password.
//!
//! # Architecture
//!
//! ```text
//!   owner / viewer I/O tasks               login / discovery protocol
//!            │                                        │
//!            │ CastHandle (mpsc)                       │ list_casts()
//!            ▼                                        ▼
//!   ┌──────────────────────── dispatcher task ────────────────────────┐
//!   │ CastHub                                                         │
//!   │   sessions: HashMap<OwnerId, CastSession>                       │
//!   │   registry: CastRegistry (active casts, capacity cap)           │
//!   │   directory: DirectoryQueryService                              │
//!   └───────────────┬─────────────────────────────────────────────────┘
//!                   │ upsert / delete (unbounded, never blocks)
//!                   ▼
//!          persistence worker task ──► CastStore
//! ```
//!
//! All cast state is mutated by the single dispatcher task, so the session
//! and registry types need no locks. Connection I/O tasks only submit work
//! through [`CastHandle`](server::CastHandle), and the persistence worker
//! consumes a fire-and-forget queue whose failures never reach the
//! dispatcher.
//!
//! # Example
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! use livecast_rs::connection::{ChannelConnection, ConnectionId, OwnerId};
//! use livecast_rs::persistence::MemoryCastStore;
//! use livecast_rs::{CastConfig, CastServer};
//!
//! # async fn example() -> livecast_rs::Result<()> {
//! let server = CastServer::start(CastConfig::default(), MemoryCastStore::new());
//! let casts = server.handle();
//!
//! let addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
//! let (owner_conn, _owner_events) = ChannelConnection::new(ConnectionId(1), addr);
//! casts.attach_owner(OwnerId(7), "Alice", owner_conn).await?;
//! casts.start_cast(OwnerId(7), None, "").await?;
//!
//! let (viewer_conn, _viewer_events) = ChannelConnection::new(ConnectionId(2), addr);
//! let viewer = casts.join("Alice", "", viewer_conn).await?;
//! println!("joined as {}", viewer.display_name());
//!
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod cast;
pub mod connection;
pub mod directory;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use cast::{CastSession, CastState, ModerationCommand, Viewer, ViewerId};
pub use connection::{ChannelId, ConnectionHandle, OwnerId};
pub use directory::{DirectoryEntry, DirectoryQueryService, DirectoryReply};
pub use error::{Error, Result};
pub use persistence::{CastRecord, CastStore, PersistenceSink};
pub use registry::CastRegistry;
pub use server::{CastConfig, CastHandle, CastHub, CastServer, SayOutcome};
