//! Error types
//!
//! Failures reported by the cast dispatcher to the protocol layer. The core
//! never builds user-facing text for these; the caller decides what to show.

use std::net::IpAddr;

use crate::connection::OwnerId;

/// Result type used by the cast handle and hub
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cast operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Live casting is switched off in the configuration
    #[error("live casting is disabled")]
    Disabled,

    /// No game session is attached for this owner
    #[error("owner {0} is not attached")]
    OwnerNotAttached(OwnerId),

    /// The owner already has an active cast
    #[error("cast for owner {0} is already active")]
    AlreadyActive(OwnerId),

    /// The owner's connection is gone
    #[error("owner {0} has no live connection")]
    OwnerUnavailable(OwnerId),

    /// The configured number of concurrent casts is reached
    #[error("cast limit of {max} reached")]
    CapacityReached { max: usize },

    /// Another active cast already uses this name
    #[error("cast name already in use: {0}")]
    NameTaken(String),

    /// No active cast with this name
    #[error("cast not found: {0}")]
    CastNotFound(String),

    /// The cast is password protected and the password did not match
    #[error("wrong cast password")]
    WrongPassword,

    /// The viewer's address was banned by the cast owner
    #[error("address {0} is banned from this cast")]
    Banned(IpAddr),

    /// The dispatcher task has stopped
    #[error("cast dispatcher is closed")]
    DispatcherClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::AlreadyActive(OwnerId(3)).to_string(),
            "cast for owner 3 is already active"
        );
        assert_eq!(
            Error::CapacityReached { max: 2 }.to_string(),
            "cast limit of 2 reached"
        );
        assert_eq!(
            Error::Banned(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))).to_string(),
            "address 10.0.0.1 is banned from this cast"
        );
    }
}
