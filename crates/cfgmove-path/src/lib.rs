//! Profile addressing for configuration-profile trees
//!
//! Two coordinate systems address the same node and must never be confused:
//!
//! - [`ProfileId`]: dot-joined profile names only (`"a.b"`), the form rename
//!   requests and callers speak.
//! - [`StoragePath`]: the same location with a literal `profiles` segment
//!   interleaved before every name (`"profiles.a.profiles.b"`), the form the
//!   backing store speaks.
//!
//! Converting identifier to path is purely mechanical; the codec never drops
//! or doubles the `profiles` segment, and round-trips losslessly:
//!
//! ```
//! use cfgmove_path::{ProfileId, StoragePath};
//!
//! let id: ProfileId = "a.b".parse().unwrap();
//! let path = StoragePath::from(&id);
//! assert_eq!(path.to_string(), "profiles.a.profiles.b");
//! assert_eq!(path.profile_id().unwrap(), id);
//! ```

// Core types
mod id;
mod storage;

// Re-exports
pub use id::{PathError, ProfileId};
pub use storage::{StoragePath, PROFILES_SEGMENT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
