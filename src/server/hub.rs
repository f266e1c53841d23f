//! Cast hub
//!
//! All cast state in one place: every attached owner's session, the registry
//! of active casts, and the directory service reading them. The hub is owned
//! by the dispatcher task and each method runs to completion before the next
//! request is looked at, which is what makes viewer join/leave races and
//! cast teardown safe without locks.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cast::{CastSession, StartRejected, Viewer};
use crate::connection::{ChannelId, ConnectionHandle, OwnerId, Outgoing};
use crate::directory::{DirectoryQueryService, DirectoryReply};
use crate::error::{Error, Result};
use crate::persistence::PersistenceSink;
use crate::registry::CastRegistry;

use super::config::CastConfig;

/// What happened to a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SayOutcome {
    /// Not on the cast channel; route to the normal chat system
    NotCastChannel,
    /// Consumed as a moderation command
    Command,
    /// Broadcast to the cast
    Broadcast,
    /// Dropped (no active cast, too long, or speaker muted)
    Dropped,
}

/// Mutation-context state of the cast layer
pub struct CastHub {
    config: CastConfig,
    registry: CastRegistry,
    sessions: HashMap<OwnerId, CastSession>,
    directory: DirectoryQueryService,
    sink: Arc<dyn PersistenceSink>,
}

impl CastHub {
    /// Create a hub with no attached owners
    pub fn new(config: CastConfig, sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            registry: CastRegistry::new(config.max_casts),
            directory: DirectoryQueryService::new(config.enabled),
            sessions: HashMap::new(),
            sink,
            config,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &CastConfig {
        &self.config
    }

    /// Registry of active casts
    pub fn registry(&self) -> &CastRegistry {
        &self.registry
    }

    /// Session of an attached owner
    pub fn session(&self, owner: OwnerId) -> Option<&CastSession> {
        self.sessions.get(&owner)
    }

    /// Active casts in registry order
    pub fn active_casts(&self) -> impl Iterator<Item = &CastSession> + '_ {
        self.registry
            .snapshot()
            .filter_map(|owner| self.sessions.get(&owner))
    }

    /// Attach a logged-in game session as a potential cast owner
    ///
    /// Returns `false` if the owner is already attached.
    pub fn attach_owner(
        &mut self,
        owner: OwnerId,
        name: impl Into<String>,
        connection: Arc<dyn ConnectionHandle>,
    ) -> bool {
        if self.sessions.contains_key(&owner) {
            return false;
        }

        let session = CastSession::new(
            owner,
            name,
            connection,
            self.config.channel_id,
            self.config.channel_name.clone(),
        );
        self.sessions.insert(owner, session);
        tracing::debug!(owner = %owner, "Owner attached");
        true
    }

    /// Detach an owner on logout, stopping its cast first
    pub fn detach_owner(&mut self, owner: OwnerId) -> bool {
        match self.sessions.remove(&owner) {
            Some(mut session) => {
                session.stop(&mut self.registry, self.sink.as_ref());
                tracing::debug!(owner = %owner, "Owner detached");
                true
            }
            None => false,
        }
    }

    /// Start an owner's cast
    ///
    /// Viewers join by name, so the name must not match another active cast,
    /// ignoring case.
    pub fn start_cast(&mut self, owner: OwnerId, name: Option<&str>, password: &str) -> Result<()> {
        if !self.config.enabled {
            return Err(Error::Disabled);
        }

        let session = self
            .sessions
            .get(&owner)
            .ok_or(Error::OwnerNotAttached(owner))?;
        let cast_name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| session.owner_name());

        if let Some(holder) = self.find_cast(cast_name).filter(|&holder| holder != owner) {
            tracing::debug!(owner = %owner, holder = %holder, cast = %cast_name, "Cast name taken");
            return Err(Error::NameTaken(cast_name.to_owned()));
        }

        let session = self
            .sessions
            .get_mut(&owner)
            .ok_or(Error::OwnerNotAttached(owner))?;

        session
            .try_start(&mut self.registry, self.sink.as_ref(), name, password)
            .map_err(|e| match e {
                StartRejected::AlreadyActive => Error::AlreadyActive(owner),
                StartRejected::OwnerUnavailable => Error::OwnerUnavailable(owner),
                StartRejected::CapacityReached { max } => Error::CapacityReached { max },
            })
    }

    /// Stop an owner's cast
    ///
    /// `Ok(false)` if the cast was not running.
    pub fn stop_cast(&mut self, owner: OwnerId) -> Result<bool> {
        let session = self
            .sessions
            .get_mut(&owner)
            .ok_or(Error::OwnerNotAttached(owner))?;

        Ok(session.stop(&mut self.registry, self.sink.as_ref()))
    }

    /// Admit a viewer connection to the cast named `cast_name`
    pub fn join(
        &mut self,
        cast_name: &str,
        password: &str,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<Arc<Viewer>> {
        if !self.config.enabled {
            return Err(Error::Disabled);
        }

        let owner = self
            .find_cast(cast_name)
            .ok_or_else(|| Error::CastNotFound(cast_name.to_owned()))?;
        let session = self
            .sessions
            .get_mut(&owner)
            .ok_or_else(|| Error::CastNotFound(cast_name.to_owned()))?;

        if session.is_password_protected() && session.password() != password {
            tracing::warn!(
                owner = %owner,
                peer = %connection.remote_addr(),
                "Join rejected: wrong password"
            );
            return Err(Error::WrongPassword);
        }

        let addr = connection.remote_addr();
        if session.is_banned(&addr) {
            tracing::warn!(owner = %owner, peer = %addr, "Join rejected: banned");
            return Err(Error::Banned(addr));
        }

        session
            .add_viewer(connection, self.sink.as_ref())
            .ok_or_else(|| Error::CastNotFound(cast_name.to_owned()))
    }

    /// Remove a viewer whose connection went away
    ///
    /// A viewer that was already kicked, banned, or torn down by a stopped
    /// cast is ignored.
    pub fn leave(&mut self, viewer: &Arc<Viewer>) -> bool {
        let Some(owner) = viewer.cast() else {
            return false;
        };

        match self.sessions.get_mut(&owner) {
            Some(session) => session.remove_viewer(viewer, self.sink.as_ref()),
            None => false,
        }
    }

    /// Route a line the owner said on `channel`
    pub fn owner_say(&mut self, owner: OwnerId, channel: ChannelId, text: &str) -> SayOutcome {
        if channel != self.config.channel_id {
            return SayOutcome::NotCastChannel;
        }
        if text.len() > self.config.max_chat_len {
            return SayOutcome::Dropped;
        }

        let Some(session) = self.sessions.get_mut(&owner).filter(|s| s.is_active()) else {
            return SayOutcome::Dropped;
        };

        if session.dispatch_chat_command(text, self.sink.as_ref()) {
            return SayOutcome::Command;
        }

        session.broadcast(Outgoing::ChannelMessage {
            channel: self.config.channel_id,
            author: session.owner_name().to_owned(),
            text: text.to_owned(),
        });
        SayOutcome::Broadcast
    }

    /// Route a line a viewer said on the cast channel
    pub fn viewer_say(&mut self, viewer: &Arc<Viewer>, text: &str) -> SayOutcome {
        if text.len() > self.config.max_chat_len {
            return SayOutcome::Dropped;
        }

        let Some(session) = viewer.cast().and_then(|owner| self.sessions.get(&owner)) else {
            return SayOutcome::Dropped;
        };

        if session.is_muted(viewer.id()) {
            tracing::debug!(
                owner = %session.owner_id(),
                viewer = %viewer.display_name(),
                "Muted viewer speech dropped"
            );
            return SayOutcome::Dropped;
        }

        session.broadcast(Outgoing::ChannelMessage {
            channel: self.config.channel_id,
            author: viewer.display_name().to_owned(),
            text: text.to_owned(),
        });
        SayOutcome::Broadcast
    }

    /// Owner closed a chat channel
    ///
    /// Closing the cast channel stops the cast. Returns `false` for any other
    /// channel, which the caller routes to the normal chat system.
    pub fn close_channel(&mut self, owner: OwnerId, channel: ChannelId) -> bool {
        if channel != self.config.channel_id {
            return false;
        }

        if let Some(session) = self.sessions.get_mut(&owner) {
            session.stop(&mut self.registry, self.sink.as_ref());
            session.notify_owner("Cast has been closed.");
        }
        true
    }

    /// Answer a directory request
    pub fn list_casts(&self, password: Option<&str>) -> DirectoryReply {
        self.directory.query(self.active_casts(), password)
    }

    /// Stop every active cast. Returns how many were stopped.
    pub fn shutdown(&mut self) -> usize {
        let owners: Vec<OwnerId> = self.registry.snapshot().collect();

        let mut stopped = 0;
        for owner in owners {
            if let Some(session) = self.sessions.get_mut(&owner) {
                if session.stop(&mut self.registry, self.sink.as_ref()) {
                    stopped += 1;
                }
            }
        }

        if stopped > 0 {
            tracing::info!(casts = stopped, "Active casts drained");
        }
        stopped
    }

    fn find_cast(&self, name: &str) -> Option<OwnerId> {
        self.active_casts()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .map(|s| s.owner_id())
    }
}
