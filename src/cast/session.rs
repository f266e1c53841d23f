//! Cast session
//!
//! One [`CastSession`] exists per attached owner. It is created inactive,
//! becomes active on [`start`](CastSession::start), and tears down every
//! viewer on [`stop`](CastSession::stop).
//!
//! Every mutating method finishes updating the session before it queues any
//! message, so a send never observes half-applied state.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::connection::{ChannelId, ConnectionHandle, OwnerId, Outgoing};
use crate::persistence::{CastRecord, PersistenceSink};
use crate::registry::{CastRegistry, RegistryError};

use super::command::{self, Reply};
use super::viewer::{CastLink, Viewer, ViewerId};

/// Lifecycle state of a cast session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastState {
    /// Not casting
    Inactive,
    /// Casting, listed in the registry
    Active,
}

/// Reason a cast could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejected {
    /// The session is already casting
    AlreadyActive,
    /// The owner's connection is gone
    OwnerUnavailable,
    /// The registry is full
    CapacityReached { max: usize },
}

/// A single owner's cast: viewers, moderation state and password
pub struct CastSession {
    owner_id: OwnerId,
    owner_name: String,
    owner: Arc<dyn ConnectionHandle>,

    /// Reserved cast channel
    channel: ChannelId,
    channel_name: String,

    state: CastState,
    name: String,
    password: String,

    /// Listed viewers, in join order
    viewers: Vec<Arc<Viewer>>,

    /// Next viewer id to hand out
    next_viewer_id: ViewerId,

    muted: HashSet<ViewerId>,

    /// Banned remote address -> lowercased display name
    banned: HashMap<IpAddr, String>,

    /// Present while active; viewers hold a weak reference to it
    link: Option<Arc<CastLink>>,

    started_at: Option<Instant>,
}

impl CastSession {
    /// Create an inactive session for an owner
    pub fn new(
        owner_id: OwnerId,
        owner_name: impl Into<String>,
        owner: Arc<dyn ConnectionHandle>,
        channel: ChannelId,
        channel_name: impl Into<String>,
    ) -> Self {
        let owner_name = owner_name.into();

        Self {
            owner_id,
            name: owner_name.clone(),
            owner_name,
            owner,
            channel,
            channel_name: channel_name.into(),
            state: CastState::Inactive,
            password: String::new(),
            viewers: Vec::new(),
            next_viewer_id: 1,
            muted: HashSet::new(),
            banned: HashMap::new(),
            link: None,
            started_at: None,
        }
    }

    /// Start casting
    ///
    /// Leaves the session untouched if it is already active, the owner is
    /// disconnected, or the registry is full. `name` defaults to the owner's
    /// display name; an empty `password` leaves the cast open.
    pub fn try_start(
        &mut self,
        registry: &mut CastRegistry,
        sink: &dyn PersistenceSink,
        name: Option<&str>,
        password: &str,
    ) -> Result<(), StartRejected> {
        if self.state == CastState::Active {
            return Err(StartRejected::AlreadyActive);
        }
        if !self.owner.is_connected() {
            return Err(StartRejected::OwnerUnavailable);
        }

        registry.try_register(self.owner_id).map_err(|e| match e {
            RegistryError::AlreadyRegistered(_) => StartRejected::AlreadyActive,
            RegistryError::CapacityReached { max } => StartRejected::CapacityReached { max },
        })?;

        self.viewers.clear();
        self.muted.clear();
        self.banned.clear();
        self.next_viewer_id = 1;
        self.name = match name {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => self.owner_name.clone(),
        };
        self.password = password.to_owned();
        self.link = Some(Arc::new(CastLink::new(self.owner_id)));
        self.started_at = Some(Instant::now());
        self.state = CastState::Active;

        tracing::info!(
            owner = %self.owner_id,
            cast = %self.name,
            protected = self.is_password_protected(),
            "Cast started"
        );

        sink.upsert_cast_record(self.record());
        self.owner.send(Outgoing::OpenChannel {
            channel: self.channel,
            name: self.channel_name.clone(),
        });

        Ok(())
    }

    /// Start casting, returning whether the cast is now active
    pub fn start(
        &mut self,
        registry: &mut CastRegistry,
        sink: &dyn PersistenceSink,
        name: Option<&str>,
        password: &str,
    ) -> bool {
        self.try_start(registry, sink, name, password).is_ok()
    }

    /// Stop casting and disconnect every viewer
    ///
    /// Returns `false` if the session was not active.
    pub fn stop(&mut self, registry: &mut CastRegistry, sink: &dyn PersistenceSink) -> bool {
        if self.state == CastState::Inactive {
            return false;
        }

        let viewers = std::mem::take(&mut self.viewers);
        self.state = CastState::Inactive;
        registry.unregister(self.owner_id);
        self.link = None;

        let viewer_count = viewers.len();
        for viewer in viewers {
            viewer.detach();
            viewer.connection().disconnect();
        }

        self.muted.clear();
        self.banned.clear();

        tracing::info!(
            owner = %self.owner_id,
            cast = %self.name,
            viewers = viewer_count,
            duration_secs = self.duration().map(|d| d.as_secs()).unwrap_or(0),
            "Cast stopped"
        );
        self.started_at = None;

        sink.delete_cast_record(self.owner_id);
        true
    }

    /// Add a viewer to an active cast
    ///
    /// Returns `None` if the session is not active. The caller keeps the
    /// returned handle for the life of the viewer's connection.
    pub fn add_viewer(
        &mut self,
        connection: Arc<dyn ConnectionHandle>,
        sink: &dyn PersistenceSink,
    ) -> Option<Arc<Viewer>> {
        let link = self.link.as_ref()?;

        let id = self.next_viewer_id;
        self.next_viewer_id += 1;

        let viewer = Arc::new(Viewer::new(id, connection, link));
        self.viewers.push(Arc::clone(&viewer));

        tracing::info!(
            owner = %self.owner_id,
            viewer = %viewer.display_name(),
            peer = %viewer.remote_addr(),
            viewers = self.viewers.len(),
            "Viewer joined"
        );

        sink.upsert_cast_record(self.record());
        Some(viewer)
    }

    /// Remove a viewer. Removing a viewer that is not listed is a no-op.
    pub fn remove_viewer(&mut self, viewer: &Arc<Viewer>, sink: &dyn PersistenceSink) -> bool {
        let Some(index) = self.viewers.iter().position(|v| Arc::ptr_eq(v, viewer)) else {
            return false;
        };

        let removed = self.viewers.remove(index);
        removed.detach();
        self.muted.remove(&removed.id());

        tracing::info!(
            owner = %self.owner_id,
            viewer = %removed.display_name(),
            viewers = self.viewers.len(),
            "Viewer left"
        );

        sink.upsert_cast_record(self.record());
        true
    }

    /// Find a listed viewer by display name, ignoring case
    pub fn find_viewer_by_name(&self, name: &str) -> Option<Arc<Viewer>> {
        self.viewers
            .iter()
            .find(|v| v.display_name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Handle a line the owner typed on the cast channel
    ///
    /// Returns `true` if the line was a moderation command (including an
    /// invalid one), `false` if it should be treated as normal chat.
    pub fn dispatch_chat_command(&mut self, text: &str, sink: &dyn PersistenceSink) -> bool {
        let Some(parsed) = command::parse(text) else {
            return false;
        };

        let reply = match parsed {
            Ok(cmd) => {
                tracing::debug!(owner = %self.owner_id, command = ?cmd, "Moderation command");
                cmd.apply(self, sink)
            }
            Err(e) => Reply::Private(e.to_string()),
        };

        self.deliver(reply);
        true
    }

    /// Queue a message to the owner and every viewer
    pub fn broadcast(&self, message: Outgoing) {
        self.owner.send(message.clone());
        for viewer in &self.viewers {
            viewer.connection().send(message.clone());
        }
    }

    /// Queue a private status line to the owner
    pub fn notify_owner(&self, text: impl Into<String>) {
        self.owner.send(Outgoing::status(text));
    }

    pub(crate) fn deliver(&self, reply: Reply) {
        match reply {
            Reply::Broadcast(text) => self.broadcast(Outgoing::notice(self.channel, text)),
            Reply::Private(text) => self.notify_owner(text),
        }
    }

    pub(crate) fn mute(&mut self, id: ViewerId) -> bool {
        self.muted.insert(id)
    }

    pub(crate) fn unmute(&mut self, id: ViewerId) -> bool {
        self.muted.remove(&id)
    }

    /// Ban a listed viewer by address, then remove and disconnect it
    pub(crate) fn ban(&mut self, viewer: &Arc<Viewer>, sink: &dyn PersistenceSink) {
        // First name banned from an address stays the unban key
        self.banned
            .entry(viewer.remote_addr())
            .or_insert_with(|| viewer.display_name().to_lowercase());
        self.kick(viewer, sink);
    }

    /// Drop the ban recorded under `name`. Returns whether one was found.
    pub(crate) fn unban(&mut self, name: &str) -> bool {
        let name = name.to_lowercase();
        let addr = self
            .banned
            .iter()
            .find(|(_, banned)| **banned == name)
            .map(|(addr, _)| *addr);

        match addr {
            Some(addr) => {
                self.banned.remove(&addr);
                true
            }
            None => false,
        }
    }

    /// Remove and disconnect a listed viewer
    pub(crate) fn kick(&mut self, viewer: &Arc<Viewer>, sink: &dyn PersistenceSink) {
        if self.remove_viewer(viewer, sink) {
            viewer.connection().disconnect();
        }
    }

    pub(crate) fn set_password(&mut self, password: &str, sink: &dyn PersistenceSink) {
        self.password = password.to_owned();
        sink.upsert_cast_record(self.record());
    }

    /// Row mirrored to the persistence store
    pub fn record(&self) -> CastRecord {
        CastRecord {
            owner: self.owner_id,
            name: self.name.clone(),
            password_protected: self.is_password_protected(),
            viewer_count: self.viewers.len(),
        }
    }

    /// Owning game session
    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Owner's display name
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Reserved cast channel
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Current state
    pub fn state(&self) -> CastState {
        self.state
    }

    /// Check if the session is casting
    pub fn is_active(&self) -> bool {
        self.state == CastState::Active
    }

    /// Cast display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cast password, empty when open
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Check if joining requires a password
    pub fn is_password_protected(&self) -> bool {
        !self.password.is_empty()
    }

    /// Listed viewers in join order
    pub fn viewers(&self) -> &[Arc<Viewer>] {
        &self.viewers
    }

    /// Number of listed viewers
    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Check if a viewer is muted
    pub fn is_muted(&self, id: ViewerId) -> bool {
        self.muted.contains(&id)
    }

    /// Check if an address is banned
    pub fn is_banned(&self, addr: &IpAddr) -> bool {
        self.banned.contains_key(addr)
    }

    /// Banned addresses and the names they were banned under
    pub fn banned(&self) -> &HashMap<IpAddr, String> {
        &self.banned
    }

    /// Time since the cast started
    pub fn duration(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }
}
