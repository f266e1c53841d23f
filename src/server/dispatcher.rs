//! Cast dispatcher
//!
//! The hub is owned by a single task. Connection tasks, the login protocol
//! and the persistence layer talk to it through a cloneable [`CastHandle`];
//! requests are applied one at a time in arrival order.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::cast::Viewer;
use crate::connection::{ChannelId, ConnectionHandle, OwnerId};
use crate::directory::DirectoryReply;
use crate::error::{Error, Result};

use super::hub::{CastHub, SayOutcome};

/// Request applied by the dispatcher
pub(crate) enum CastTask {
    AttachOwner {
        owner: OwnerId,
        name: String,
        connection: Arc<dyn ConnectionHandle>,
        reply: oneshot::Sender<bool>,
    },
    DetachOwner {
        owner: OwnerId,
        reply: oneshot::Sender<bool>,
    },
    StartCast {
        owner: OwnerId,
        name: Option<String>,
        password: String,
        reply: oneshot::Sender<Result<()>>,
    },
    StopCast {
        owner: OwnerId,
        reply: oneshot::Sender<Result<bool>>,
    },
    Join {
        cast_name: String,
        password: String,
        connection: Arc<dyn ConnectionHandle>,
        reply: oneshot::Sender<Result<Arc<Viewer>>>,
    },
    Leave {
        viewer: Arc<Viewer>,
    },
    OwnerSay {
        owner: OwnerId,
        channel: ChannelId,
        text: String,
        reply: oneshot::Sender<SayOutcome>,
    },
    ViewerSay {
        viewer: Arc<Viewer>,
        text: String,
        reply: oneshot::Sender<SayOutcome>,
    },
    CloseChannel {
        owner: OwnerId,
        channel: ChannelId,
        reply: oneshot::Sender<bool>,
    },
    ListCasts {
        password: Option<String>,
        reply: oneshot::Sender<DirectoryReply>,
    },
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the cast dispatcher
#[derive(Clone)]
pub struct CastHandle {
    tx: mpsc::UnboundedSender<CastTask>,
}

impl CastHandle {
    /// Attach a logged-in owner. `false` if already attached.
    pub async fn attach_owner(
        &self,
        owner: OwnerId,
        name: impl Into<String>,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<bool> {
        let name = name.into();
        self.request(|reply| CastTask::AttachOwner {
            owner,
            name,
            connection,
            reply,
        })
        .await
    }

    /// Detach an owner, stopping its cast
    pub async fn detach_owner(&self, owner: OwnerId) -> Result<bool> {
        self.request(|reply| CastTask::DetachOwner { owner, reply })
            .await
    }

    /// Start an owner's cast
    pub async fn start_cast(
        &self,
        owner: OwnerId,
        name: Option<String>,
        password: impl Into<String>,
    ) -> Result<()> {
        let password = password.into();
        self.request(|reply| CastTask::StartCast {
            owner,
            name,
            password,
            reply,
        })
        .await?
    }

    /// Stop an owner's cast
    pub async fn stop_cast(&self, owner: OwnerId) -> Result<bool> {
        self.request(|reply| CastTask::StopCast { owner, reply })
            .await?
    }

    /// Join a cast as a viewer
    pub async fn join(
        &self,
        cast_name: impl Into<String>,
        password: impl Into<String>,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<Arc<Viewer>> {
        let cast_name = cast_name.into();
        let password = password.into();
        self.request(|reply| CastTask::Join {
            cast_name,
            password,
            connection,
            reply,
        })
        .await?
    }

    /// Report that a viewer's connection went away
    ///
    /// Does not wait for the dispatcher.
    pub fn leave(&self, viewer: Arc<Viewer>) -> Result<()> {
        self.tx
            .send(CastTask::Leave { viewer })
            .map_err(|_| Error::DispatcherClosed)
    }

    /// Route a line the owner said
    pub async fn owner_say(
        &self,
        owner: OwnerId,
        channel: ChannelId,
        text: impl Into<String>,
    ) -> Result<SayOutcome> {
        let text = text.into();
        self.request(|reply| CastTask::OwnerSay {
            owner,
            channel,
            text,
            reply,
        })
        .await
    }

    /// Route a line a viewer said
    pub async fn viewer_say(&self, viewer: Arc<Viewer>, text: impl Into<String>) -> Result<SayOutcome> {
        let text = text.into();
        self.request(|reply| CastTask::ViewerSay { viewer, text, reply })
            .await
    }

    /// Owner closed a chat channel
    pub async fn close_channel(&self, owner: OwnerId, channel: ChannelId) -> Result<bool> {
        self.request(|reply| CastTask::CloseChannel {
            owner,
            channel,
            reply,
        })
        .await
    }

    /// Answer a directory request
    pub async fn list_casts(&self, password: Option<String>) -> Result<DirectoryReply> {
        self.request(|reply| CastTask::ListCasts { password, reply })
            .await
    }

    /// Drain active casts and stop the dispatcher
    pub(crate) async fn shutdown(&self) -> Result<usize> {
        self.request(|reply| CastTask::Shutdown { reply }).await
    }

    async fn request<T>(&self, task: impl FnOnce(oneshot::Sender<T>) -> CastTask) -> Result<T> {
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(task(reply))
            .map_err(|_| Error::DispatcherClosed)?;

        rx.await.map_err(|_| Error::DispatcherClosed)
    }
}

/// Spawn the dispatcher task owning `hub`
pub fn spawn(hub: CastHub) -> (CastHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(hub, rx));
    (CastHandle { tx }, task)
}

async fn run(mut hub: CastHub, mut rx: mpsc::UnboundedReceiver<CastTask>) {
    tracing::debug!("Cast dispatcher started");

    while let Some(task) = rx.recv().await {
        match task {
            CastTask::AttachOwner {
                owner,
                name,
                connection,
                reply,
            } => {
                let _ = reply.send(hub.attach_owner(owner, name, connection));
            }
            CastTask::DetachOwner { owner, reply } => {
                let _ = reply.send(hub.detach_owner(owner));
            }
            CastTask::StartCast {
                owner,
                name,
                password,
                reply,
            } => {
                let result = hub.start_cast(owner, name.as_deref(), &password);
                if let Err(e) = &result {
                    tracing::debug!(owner = %owner, error = %e, "Cast start refused");
                }
                let _ = reply.send(result);
            }
            CastTask::StopCast { owner, reply } => {
                let _ = reply.send(hub.stop_cast(owner));
            }
            CastTask::Join {
                cast_name,
                password,
                connection,
                reply,
            } => {
                let _ = reply.send(hub.join(&cast_name, &password, connection));
            }
            CastTask::Leave { viewer } => {
                hub.leave(&viewer);
            }
            CastTask::OwnerSay {
                owner,
                channel,
                text,
                reply,
            } => {
                let _ = reply.send(hub.owner_say(owner, channel, &text));
            }
            CastTask::ViewerSay { viewer, text, reply } => {
                let _ = reply.send(hub.viewer_say(&viewer, &text));
            }
            CastTask::CloseChannel {
                owner,
                channel,
                reply,
            } => {
                let _ = reply.send(hub.close_channel(owner, channel));
            }
            CastTask::ListCasts { password, reply } => {
                let _ = reply.send(hub.list_casts(password.as_deref()));
            }
            CastTask::Shutdown { reply } => {
                let _ = reply.send(hub.shutdown());
                tracing::debug!("Cast dispatcher stopped");
                return;
            }
        }
    }

    // Every handle dropped without an explicit shutdown
    hub.shutdown();
    tracing::debug!("Cast dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::CastConfig;
    use crate::test_support::{connection, RecordingSink};

    fn start(config: CastConfig) -> (CastHandle, JoinHandle<()>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let (handle, task) = spawn(CastHub::new(config, sink.clone()));
        (handle, task, sink)
    }

    #[tokio::test]
    async fn test_start_and_join() {
        let (casts, _task, _sink) = start(CastConfig::default());
        let (owner, _owner_events) = connection(1);

        assert!(casts.attach_owner(OwnerId(1), "Alice", owner).await.unwrap());
        casts.start_cast(OwnerId(1), None, "").await.unwrap();

        let (conn, _events) = connection(2);
        let viewer = casts.join("alice", "", conn).await.unwrap();
        assert_eq!(viewer.display_name(), "Spectator(1)");

        let reply = casts.list_casts(None).await.unwrap();
        assert_eq!(reply.entries()[0].viewer_count, 1);
    }

    #[tokio::test]
    async fn test_leave_is_applied_in_order() {
        let (casts, _task, _sink) = start(CastConfig::default());
        let (owner, _owner_events) = connection(1);
        casts.attach_owner(OwnerId(1), "Alice", owner).await.unwrap();
        casts.start_cast(OwnerId(1), None, "").await.unwrap();

        let (conn, _events) = connection(2);
        let viewer = casts.join("Alice", "", conn).await.unwrap();
        casts.leave(viewer).unwrap();

        let reply = casts.list_casts(None).await.unwrap();
        assert_eq!(reply.entries()[0].viewer_count, 0);
    }

    #[tokio::test]
    async fn test_errors_cross_the_channel() {
        let (casts, _task, _sink) = start(CastConfig::default());

        assert_eq!(
            casts.start_cast(OwnerId(9), None, "").await,
            Err(Error::OwnerNotAttached(OwnerId(9)))
        );

        let (conn, _events) = connection(2);
        assert_eq!(
            casts.join("nobody", "", conn).await.unwrap_err(),
            Error::CastNotFound("nobody".into())
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_dispatcher() {
        let (casts, task, sink) = start(CastConfig::default());
        let (owner, _owner_events) = connection(1);
        casts.attach_owner(OwnerId(1), "Alice", owner).await.unwrap();
        casts.start_cast(OwnerId(1), None, "").await.unwrap();
        let (conn, _events) = connection(2);
        let viewer = casts.join("Alice", "", conn).await.unwrap();

        assert_eq!(casts.shutdown().await, Ok(1));
        task.await.unwrap();

        assert_eq!(
            casts.list_casts(None).await.unwrap_err(),
            Error::DispatcherClosed
        );
        assert_eq!(casts.leave(viewer), Err(Error::DispatcherClosed));
        assert_eq!(
            sink.requests().last(),
            Some(&crate::persistence::PersistRequest::Delete(OwnerId(1)))
        );
    }

    #[tokio::test]
    async fn test_dropping_handles_drains_casts() {
        let (casts, task, sink) = start(CastConfig::default());
        let (owner, owner_events) = connection(1);
        casts.attach_owner(OwnerId(1), "Alice", owner).await.unwrap();
        casts.start_cast(OwnerId(1), None, "").await.unwrap();
        let (conn, events) = connection(2);
        casts.join("Alice", "", conn).await.unwrap();

        drop(casts);
        task.await.unwrap();

        assert!(events.is_disconnected());
        assert!(!owner_events.is_disconnected());
        assert_eq!(
            sink.requests().last(),
            Some(&crate::persistence::PersistRequest::Delete(OwnerId(1)))
        );
    }
}
