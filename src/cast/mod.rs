//! Cast sessions, viewers and moderation
//!
//! A cast is one owner's game session mirrored to any number of viewers.
//!
//! ```text
//!               CastSession (owner 7, "Alice")
//!        ┌─────────────────────────────────────────┐
//!        │ viewers: [Arc<Viewer> 1, Arc<Viewer> 2] │◄── /mute /kick /ban ...
//!        │ muted:   {1}                            │    (owner, cast channel)
//!        │ banned:  {10.0.0.9 -> "spectator(3)"}   │
//!        └──────────┬──────────────────────────────┘
//!                   │ Arc                ▲ Weak (cleared on removal)
//!                   ▼                    │
//!               Viewer ◄──── Arc ──── viewer I/O task
//! ```

pub mod command;
pub mod session;
pub mod viewer;

pub use command::{CommandError, CommandKind, ModerationCommand, Reply, COMMAND_PREFIX};
pub use session::{CastSession, CastState, StartRejected};
pub use viewer::{Viewer, ViewerId};
