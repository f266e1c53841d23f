//! Cast discovery
//!
//! Clients find casts through the login server: a login request with an
//! empty account name is a directory request, and its password (possibly
//! empty) filters the listing. This module answers such requests from the
//! live sessions and encodes the reply.

pub mod query;
pub mod wire;

pub use query::{DirectoryEntry, DirectoryQueryService, DirectoryReply};
pub use wire::{encode_cast_list, viewer_count_label, ConnectInfo};
