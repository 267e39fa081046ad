//! Rename-resolution and tree-mutation engine
//!
//! Consumers submit batches of profile rename requests plus still-pending
//! property edits against a tree reachable through a
//! [`cfgmove_store::ConfigStore`]. The engine computes the storage mutations
//! to apply and, with the same transformation rules, a preview of the result
//! without applying anything.
//!
//! # Core Concepts
//!
//! - [`resolver::resolve_batch`]: consolidates a raw rename batch into a list
//!   that is safe to apply in order.
//! - [`guard`]: decides whether a rename would nest a profile under itself,
//!   and whether it wraps a leaf in a new parent of the same name.
//! - [`mover`]: move/nest primitives including secret-list migration.
//! - [`defaults`]: repairs default-profile pointers after a rename.
//! - [`pending`]: rewrites queued property edits to target post-rename
//!   locations.
//! - [`orchestrator`]: drives the whole batch in commit or simulate mode;
//!   the two modes share one per-rename step and cannot drift.
//! - [`redact`]: masks secret values before a merged view leaves the trust
//!   boundary.

// Engine modules
pub mod defaults;
pub mod guard;
pub mod mover;
pub mod orchestrator;
pub mod pending;
pub mod redact;
pub mod resolver;

mod error;
mod types;

// Re-exports
pub use error::MoveError;
pub use orchestrator::{commit, simulate, Simulation};
pub use redact::{redact, redacted_view, REDACTION_MARKER};
pub use resolver::{remove_duplicate_renames, resolve_batch};
pub use types::{
    MoveReport, PendingChange, RenameMap, RenameRequest, RenameTarget, SkippedRename,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
