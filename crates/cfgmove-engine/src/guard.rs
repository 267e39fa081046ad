//! Circular-reference guard
//!
//! Decides, before any mutation runs, whether applying a rename would nest a
//! profile under itself, and whether a rename wraps a leaf in a new parent
//! of the same name rather than moving it.

use cfgmove_path::ProfileId;

/// Check whether a rename would nest the profile under itself
///
/// A rename is circular iff `renamed` is a strict dotted descendant of
/// `original` and the remaining segments contain the original key as one of
/// them, directly or after further nesting:
///
/// - `parent` → `parent.parent` — circular
/// - `parent` → `parent.child.parent` — circular
/// - `parent` → `parent.child` — not circular (legitimate nesting)
/// - `parent` → `sibling` — not circular (reparenting)
#[must_use]
pub fn would_create_circular_reference(original: &ProfileId, renamed: &ProfileId) -> bool {
    if !original.is_ancestor_of(renamed) {
        return false;
    }
    let original_key = original.to_string();
    renamed.segments()[original.depth()..]
        .iter()
        .any(|segment| *segment == original_key)
}

/// Check whether a rename wraps a leaf in a new parent of the same name
///
/// True iff `original` is single-level and `renamed` is a descendant of it.
/// This distinguishes nesting (`a` → `a.b`: `a` becomes the parent of a new
/// child carrying its payload) from an ordinary move.
#[inline]
#[must_use]
pub fn is_nested_profile_creation(original: &ProfileId, renamed: &ProfileId) -> bool {
    original.is_root_level() && original.is_ancestor_of(renamed)
}
