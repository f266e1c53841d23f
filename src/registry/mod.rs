//! Directory of active casts
//!
//! The registry is the process-wide set of casts that are currently live,
//! keyed by the owning game session. It enforces the two global invariants
//! of the cast layer: at most one active cast per owner, and never more
//! active casts than the configured cap.
//!
//! ```text
//!            CastRegistry
//!     ┌──────────────────────────┐
//!     │ casts: [owner 7,         │  registration order
//!     │         owner 3,         │
//!     │         owner 12]        │
//!     │ max_casts: 64            │
//!     └────────────┬─────────────┘
//!                  │ snapshot()
//!                  ▼
//!        DirectoryQueryService
//! ```
//!
//! The registry is owned by the dispatcher task and mutated only from there,
//! so it carries no locks.

pub mod error;
pub mod store;

pub use error::RegistryError;
pub use store::CastRegistry;
