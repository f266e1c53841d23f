//! Viewer connections
//!
//! A [`Viewer`] is shared between two owners: the cast session lists it, and
//! the viewer's own I/O task holds it for the life of the connection. Both
//! hold an `Arc`; whichever lets go last frees it.
//!
//! The viewer's link back to its cast is a `Weak` that the session clears when
//! the viewer is removed, and that dies on its own when the cast stops. A
//! disconnect racing with teardown therefore finds no cast to leave instead of
//! reaching into stale state.

use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, Weak};

use crate::connection::{ConnectionHandle, OwnerId};

/// Sequential viewer id, unique within one cast
pub type ViewerId = u32;

/// Token identifying one activation of a cast
///
/// A new token is created each time a cast starts and dropped when it stops.
#[derive(Debug)]
pub(crate) struct CastLink {
    owner: OwnerId,
}

impl CastLink {
    pub(crate) fn new(owner: OwnerId) -> Self {
        Self { owner }
    }
}

/// A read-only connection watching a cast
pub struct Viewer {
    id: ViewerId,
    display_name: String,
    connection: Arc<dyn ConnectionHandle>,
    cast: Mutex<Weak<CastLink>>,
}

impl Viewer {
    pub(crate) fn new(id: ViewerId, connection: Arc<dyn ConnectionHandle>, cast: &Arc<CastLink>) -> Self {
        Self {
            id,
            display_name: Self::display_name_for(id),
            connection,
            cast: Mutex::new(Arc::downgrade(cast)),
        }
    }

    /// Display name derived from a viewer id
    pub fn display_name_for(id: ViewerId) -> String {
        format!("Spectator({})", id)
    }

    /// Viewer id
    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// Generated display name
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Underlying connection
    pub fn connection(&self) -> &Arc<dyn ConnectionHandle> {
        &self.connection
    }

    /// Remote address of the viewer's connection
    pub fn remote_addr(&self) -> IpAddr {
        self.connection.remote_addr()
    }

    /// Owner of the cast this viewer is still listed in
    ///
    /// `None` once the viewer was removed or the cast stopped.
    pub fn cast(&self) -> Option<OwnerId> {
        self.link().upgrade().map(|link| link.owner)
    }

    /// Check whether the viewer is still listed in a running cast
    pub fn is_attached(&self) -> bool {
        self.link().strong_count() > 0
    }

    /// Clear the back-reference without following it
    pub(crate) fn detach(&self) {
        *self.cast.lock().unwrap_or_else(|e| e.into_inner()) = Weak::new();
    }

    fn link(&self) -> Weak<CastLink> {
        self.cast.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl fmt::Debug for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewer")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("connection", &self.connection.identity())
            .field("cast", &self.cast())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::connection;

    #[test]
    fn test_display_name() {
        assert_eq!(Viewer::display_name_for(7), "Spectator(7)");
    }

    #[test]
    fn test_back_reference_cleared() {
        let link = Arc::new(CastLink::new(OwnerId(4)));
        let (conn, _events) = connection(1);
        let viewer = Viewer::new(1, conn, &link);

        assert_eq!(viewer.cast(), Some(OwnerId(4)));
        viewer.detach();
        assert_eq!(viewer.cast(), None);
        assert!(!viewer.is_attached());
    }

    #[test]
    fn test_back_reference_dies_with_cast() {
        let link = Arc::new(CastLink::new(OwnerId(4)));
        let (conn, _events) = connection(1);
        let viewer = Viewer::new(1, conn, &link);

        drop(link);
        assert_eq!(viewer.cast(), None);
    }
}
