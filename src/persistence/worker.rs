//! Persistence worker task
//!
//! Owns the store and applies queued requests one at a time, in submission
//! order.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connection::OwnerId;

use super::{CastRecord, CastStore, PersistRequest, PersistenceSink};

/// Sending half of the persistence queue
///
/// Submitting never waits and never drops a request while the worker runs,
/// so the last state of every cast always reaches the store.
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<PersistRequest>,
}

impl PersistenceQueue {
    /// Ask the store to drop every row
    pub fn clear_all(&self) {
        self.submit(PersistRequest::Clear);
    }

    fn submit(&self, request: PersistRequest) {
        if let Err(mpsc::error::SendError(request)) = self.tx.send(request) {
            tracing::debug!(request = ?request, "Persistence worker stopped, request dropped");
        }
    }
}

impl PersistenceSink for PersistenceQueue {
    fn upsert_cast_record(&self, record: CastRecord) {
        self.submit(PersistRequest::Upsert(record));
    }

    fn delete_cast_record(&self, owner: OwnerId) {
        self.submit(PersistRequest::Delete(owner));
    }
}

/// Spawn the persistence worker
///
/// The worker exits once every [`PersistenceQueue`] clone is dropped and the
/// remaining requests are applied.
pub fn spawn_persistence_worker<S: CastStore>(store: S) -> (PersistenceQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run(store, rx));

    (PersistenceQueue { tx }, handle)
}

async fn run<S: CastStore>(store: S, mut rx: mpsc::UnboundedReceiver<PersistRequest>) {
    while let Some(request) = rx.recv().await {
        let result = match &request {
            PersistRequest::Upsert(record) => store.upsert(record).await,
            PersistRequest::Delete(owner) => store.delete(*owner).await,
            PersistRequest::Clear => store.clear().await,
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, request = ?request, "Cast store request failed");
        }
    }

    tracing::debug!("Persistence worker stopped");
}
