//! Cast server
//!
//! [`CastServer`] wires the pieces together: it clears stale records from the
//! store, spawns the persistence worker and the dispatcher owning the
//! [`CastHub`], and hands out [`CastHandle`]s to the game and login
//! protocols.

pub mod config;
pub mod dispatcher;
pub mod hub;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::persistence::{spawn_persistence_worker, CastStore};

pub use config::CastConfig;
pub use dispatcher::CastHandle;
pub use hub::{CastHub, SayOutcome};

/// Running cast layer
pub struct CastServer {
    handle: CastHandle,
    dispatcher: JoinHandle<()>,
    persistence: JoinHandle<()>,
}

impl CastServer {
    /// Start the cast layer on the current tokio runtime
    ///
    /// Records left behind by a previous run are cleared before any new cast
    /// can be recorded.
    pub fn start<S: CastStore>(config: CastConfig, store: S) -> Self {
        let (queue, persistence) = spawn_persistence_worker(store);
        queue.clear_all();

        tracing::info!(
            enabled = config.enabled,
            max_casts = config.max_casts,
            channel = config.channel_id.0,
            "Cast server started"
        );

        let hub = CastHub::new(config, Arc::new(queue));
        let (handle, dispatcher) = dispatcher::spawn(hub);

        Self {
            handle,
            dispatcher,
            persistence,
        }
    }

    /// Handle for submitting requests
    pub fn handle(&self) -> CastHandle {
        self.handle.clone()
    }

    /// Stop every active cast and wait for pending store writes
    ///
    /// Returns how many casts were running.
    pub async fn shutdown(self) -> Result<usize> {
        let stopped = self.handle.shutdown().await?;
        drop(self.handle);

        if let Err(e) = self.dispatcher.await {
            tracing::error!(error = %e, "Cast dispatcher task failed");
        }
        // The hub held the last queue sender, so the worker ends once drained
        if let Err(e) = self.persistence.await {
            tracing::error!(error = %e, "Persistence task failed");
        }

        tracing::info!(casts = stopped, "Cast server stopped");
        Ok(stopped)
    }
}
