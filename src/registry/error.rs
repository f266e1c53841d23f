//! Registry error types
//!
//! Error types for cast registry operations.

use crate::connection::OwnerId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Owner already has a registered cast
    #[error("cast already registered for owner {0}")]
    AlreadyRegistered(OwnerId),
    /// Registry holds the maximum number of casts
    #[error("cast registry full ({max} casts)")]
    CapacityReached { max: usize },
}
