//! Cast registry implementation
//!
//! Tracks which owners are casting, in the order they registered.

use crate::connection::OwnerId;

use super::error::RegistryError;

/// Set of active casts, bounded by a configured cap
///
/// Enumeration order is registration order, which makes directory listings
/// reproducible when several casts have the same viewer count.
#[derive(Debug, Clone)]
pub struct CastRegistry {
    /// Owners with an active cast, oldest first
    casts: Vec<OwnerId>,

    /// Maximum number of concurrent casts
    max_casts: usize,
}

impl CastRegistry {
    /// Create an empty registry holding at most `max_casts` casts
    pub fn new(max_casts: usize) -> Self {
        Self {
            casts: Vec::new(),
            max_casts,
        }
    }

    /// Register an owner's cast
    ///
    /// Fails if the owner is already registered or the registry is full.
    pub fn try_register(&mut self, owner: OwnerId) -> Result<(), RegistryError> {
        if self.contains(owner) {
            return Err(RegistryError::AlreadyRegistered(owner));
        }
        if self.is_full() {
            tracing::debug!(
                owner = %owner,
                max_casts = self.max_casts,
                "Cast rejected: registry full"
            );
            return Err(RegistryError::CapacityReached {
                max: self.max_casts,
            });
        }

        self.casts.push(owner);
        Ok(())
    }

    /// Register an owner's cast, returning whether it was inserted
    pub fn register(&mut self, owner: OwnerId) -> bool {
        self.try_register(owner).is_ok()
    }

    /// Remove an owner's cast. Removing an absent owner is a no-op.
    pub fn unregister(&mut self, owner: OwnerId) -> bool {
        match self.casts.iter().position(|&o| o == owner) {
            Some(index) => {
                self.casts.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check whether an owner is registered
    pub fn contains(&self, owner: OwnerId) -> bool {
        self.casts.contains(&owner)
    }

    /// Registered owners in enumeration order
    pub fn snapshot(&self) -> impl Iterator<Item = OwnerId> + '_ {
        self.casts.iter().copied()
    }

    /// Number of registered casts
    pub fn len(&self) -> usize {
        self.casts.len()
    }

    /// Check if no cast is registered
    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }

    /// Check if another cast can be registered
    pub fn is_full(&self) -> bool {
        self.casts.len() >= self.max_casts
    }

    /// Configured cap
    pub fn max_casts(&self) -> usize {
        self.max_casts
    }
}
