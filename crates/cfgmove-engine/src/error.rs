//! Error types for the rename engine
//!
//! One taxonomy covers the whole batch lifecycle. Errors are classified as
//! critical (abort the whole batch, surface to the caller) or skippable
//! (log, continue with the remaining renames); already-applied renames are
//! never rolled back.

use cfgmove_path::PathError;
use cfgmove_store::StoreError;

/// Rename engine error
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// A rename request carries a key that is not a valid identifier
    #[error("invalid profile key: {0}")]
    InvalidProfileKey(#[from] PathError),

    /// The profile to move does not exist in the layer
    #[error("source profile not found at '{0}'")]
    SourceNotFound(String),

    /// A profile already exists at the rename target
    #[error("target profile already exists at '{0}'")]
    TargetAlreadyExists(String),

    /// Applying the rename would nest the profile under itself
    #[error("renaming '{original}' to '{renamed}' would create a circular reference")]
    CircularReference {
        /// Key before the rename
        original: String,
        /// Key after the rename
        renamed: String,
    },

    /// Error surfacing from the store boundary
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MoveError {
    /// Whether this error aborts the whole batch
    ///
    /// Critical: [`MoveError::TargetAlreadyExists`],
    /// [`MoveError::CircularReference`], and any store error whose message
    /// matches the "already exists" / "circular reference" patterns
    /// surfacing from deeper layers. Everything else is skippable.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        match self {
            Self::TargetAlreadyExists(_) | Self::CircularReference { .. } => true,
            Self::Store(err) => {
                let message = err.to_string().to_lowercase();
                message.contains("already exists") || message.contains("circular reference")
            }
            Self::InvalidProfileKey(_) | Self::SourceNotFound(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_exists_and_circular_are_critical() {
        assert!(MoveError::TargetAlreadyExists("profiles.a".into()).is_critical());
        assert!(MoveError::CircularReference {
            original: "a".into(),
            renamed: "a.a".into(),
        }
        .is_critical());
    }

    #[test]
    fn invalid_key_and_missing_source_are_skippable() {
        assert!(!MoveError::InvalidProfileKey(PathError::EmptyKey).is_critical());
        assert!(!MoveError::SourceNotFound("profiles.a".into()).is_critical());
    }

    #[test]
    fn store_errors_are_skippable_unless_message_matches() {
        let not_found = MoveError::Store(StoreError::LayerNotFound("/cfg".into()));
        assert!(!not_found.is_critical());

        let deeper = MoveError::Store(StoreError::PersistFailed {
            config_path: "/cfg".into(),
            reason: "node already exists downstream".into(),
        });
        assert!(deeper.is_critical());
    }

    #[test]
    fn error_messages_name_the_paths() {
        let err = MoveError::SourceNotFound("profiles.a".into());
        assert!(err.to_string().contains("profiles.a"));
    }
}
