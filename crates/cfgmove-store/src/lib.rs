//! Profile tree data model and store abstraction
//!
//! # Core Concepts
//!
//! - [`ProfileNode`]: one entry in the configuration tree, optionally typed,
//!   with properties, a secret list, and nested child profiles.
//! - [`ConfigLayer`]: the root of one configuration file's tree, addressed
//!   through [`cfgmove_path::StoragePath`] values.
//! - [`ConfigStore`]: the seam between the rename engine and whatever owns
//!   the layers. [`MemoryStore`] backs the commit path, [`EphemeralStore`]
//!   backs live preview; mutating an ephemeral snapshot is never observable
//!   through the store it was cloned from.
//! - [`LayerContext`]: explicit caller context (active layer identity, home
//!   directory) passed into every engine entry point.

// Data model
mod context;
mod layer;
mod node;
mod store;

// Re-exports
pub use context::LayerContext;
pub use layer::ConfigLayer;
pub use node::ProfileNode;
pub use store::{validate_store, ConfigStore, EphemeralStore, MemoryStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
