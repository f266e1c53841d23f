//! Cast metadata persistence
//!
//! Active casts are mirrored to an external store so that out-of-process
//! consumers (a website, a stats page) can show them. The mirror is best
//! effort: the in-memory registry is the only source of truth, requests are
//! fire-and-forget, and store failures are logged and dropped.
//!
//! ```text
//!   dispatcher ──send──► [unbounded queue] ──► worker task ──► CastStore
//!   (PersistenceSink)                            (logs errors)
//! ```

pub mod memory;
pub mod worker;

use std::future::Future;

use crate::connection::OwnerId;

pub use memory::MemoryCastStore;
pub use worker::{spawn_persistence_worker, PersistenceQueue};

/// Row mirrored for every active cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastRecord {
    /// Owning game session
    pub owner: OwnerId,
    /// Display name of the cast
    pub name: String,
    /// Whether joining requires a password
    pub password_protected: bool,
    /// Current number of viewers
    pub viewer_count: usize,
}

/// Request consumed by the persistence worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistRequest {
    /// Insert or update a cast row
    Upsert(CastRecord),
    /// Remove a cast row
    Delete(OwnerId),
    /// Remove every row (stale rows from a previous run)
    Clear,
}

/// Fire-and-forget sink used by cast sessions
///
/// Implementations must return immediately; nothing is reported back.
pub trait PersistenceSink: Send + Sync {
    /// Insert or update the row for a cast
    fn upsert_cast_record(&self, record: CastRecord);

    /// Delete the row for a cast
    fn delete_cast_record(&self, owner: OwnerId);
}

/// Error type for cast store backends
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached
    #[error("cast store unavailable: {0}")]
    Unavailable(String),
    /// Backend rejected the request
    #[error("cast store rejected request: {0}")]
    Rejected(String),
}

/// Storage backend driven by the persistence worker
pub trait CastStore: Send + Sync + 'static {
    /// Insert or update a cast row
    fn upsert(&self, record: &CastRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a cast row
    fn delete(&self, owner: OwnerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete every cast row
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
