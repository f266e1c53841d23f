//! In-memory cast store
//!
//! Keeps the mirrored rows plus the list of applied requests. Used when no
//! external database is configured, and by tests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::connection::OwnerId;

use super::{CastRecord, CastStore, PersistRequest, StoreError};

#[derive(Default)]
struct MemoryState {
    records: HashMap<OwnerId, CastRecord>,
    history: Vec<PersistRequest>,
}

/// [`CastStore`] backed by a shared in-process map
///
/// Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryCastStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCastStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rows, ordered by owner
    pub async fn records(&self) -> Vec<CastRecord> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state.records.values().cloned().collect();
        records.sort_by_key(|r| r.owner);
        records
    }

    /// Row for one owner
    pub async fn get(&self, owner: OwnerId) -> Option<CastRecord> {
        self.state.read().await.records.get(&owner).cloned()
    }

    /// Every request applied so far, oldest first
    pub async fn history(&self) -> Vec<PersistRequest> {
        self.state.read().await.history.clone()
    }
}

impl CastStore for MemoryCastStore {
    async fn upsert(&self, record: &CastRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.records.insert(record.owner, record.clone());
        state.history.push(PersistRequest::Upsert(record.clone()));
        Ok(())
    }

    async fn delete(&self, owner: OwnerId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.records.remove(&owner);
        state.history.push(PersistRequest::Delete(owner));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.records.clear();
        state.history.push(PersistRequest::Clear);
        Ok(())
    }
}
