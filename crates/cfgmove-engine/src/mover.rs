//! Profile move and nest primitives
//!
//! Moves a single profile node within a layer, migrates secret references
//! rooted under the moved subtree, and wraps leaves in new parents of the
//! same name. Operations are not transactional across steps; callers needing
//! batch atomicity run guard checks before any step of any rename executes.

use crate::error::MoveError;
use crate::guard;
use cfgmove_path::{ProfileId, StoragePath};
use cfgmove_store::{ConfigLayer, ProfileNode};
use indexmap::IndexMap;

/// Move the node at `source` to `target`
///
/// Writes the target before deleting the source, then rewrites every secret
/// reference in the layer that is rooted under the moved subtree.
///
/// # Errors
/// - [`MoveError::SourceNotFound`] when `source` addresses nothing
/// - [`MoveError::TargetAlreadyExists`] when `target` is occupied
pub fn move_profile(
    layer: &mut ConfigLayer,
    source: &StoragePath,
    target: &StoragePath,
) -> Result<(), MoveError> {
    let node = layer
        .node(source)
        .cloned()
        .ok_or_else(|| MoveError::SourceNotFound(source.to_string()))?;
    if layer.node(target).is_some() {
        return Err(MoveError::TargetAlreadyExists(target.to_string()));
    }
    layer.set_node(target, node);
    layer.delete_node(source);
    migrate_secure_references(layer, source, target);
    Ok(())
}

/// Move the node at `source` to `target`, patching both parent contexts
///
/// Same contract as [`move_profile`], but detaches from the source parent's
/// child map before attaching under the target parent. This supports moving
/// between different parents, from root into a parent, and from a parent to
/// root, leaving no dangling empty `profiles` maps with stray keys.
///
/// # Errors
/// - [`MoveError::SourceNotFound`] when `source` addresses nothing
/// - [`MoveError::TargetAlreadyExists`] when `target` is occupied
pub fn move_profile_in_place(
    layer: &mut ConfigLayer,
    source: &StoragePath,
    target: &StoragePath,
) -> Result<(), MoveError> {
    let node = layer
        .node(source)
        .cloned()
        .ok_or_else(|| MoveError::SourceNotFound(source.to_string()))?;
    if layer.node(target).is_some() {
        return Err(MoveError::TargetAlreadyExists(target.to_string()));
    }
    layer.delete_node(source);
    layer.set_node(target, node);
    migrate_secure_references(layer, source, target);
    Ok(())
}

/// Delete the node at `path` and, first, all of its descendants depth-first
///
/// Used when a move target must clear a whole subtree. Deleting a missing
/// node is a no-op.
pub fn delete_recursively(layer: &mut ConfigLayer, path: &StoragePath) {
    if let Some(node) = layer.node_mut(path) {
        clear_descendants(node);
    }
    layer.delete_node(path);
}

fn clear_descendants(node: &mut ProfileNode) {
    for child in node.profiles.values_mut() {
        clear_descendants(child);
    }
    node.profiles.clear();
}

/// Wrap the leaf at `original` in a new parent of the same name
///
/// Given leaf `N` being renamed `a` → `a.<child>`, the node at `a` keeps all
/// of `N`'s attributes except `profiles`, which becomes `{ child: N }`; the
/// child is `N` minus its own children. Secret entries then move wholesale
/// from the new parent to the new child — they described leaf-level secrets,
/// which after wrapping belong to the leaf. A failure in that secondary step
/// is logged but does not fail the nest: the structural move already
/// succeeded and must stand.
///
/// # Errors
/// - [`MoveError::SourceNotFound`] when `original` addresses nothing
pub fn create_nested_profile_structure(
    layer: &mut ConfigLayer,
    original: &ProfileId,
    renamed: &ProfileId,
) -> Result<(), MoveError> {
    debug_assert!(guard::is_nested_profile_creation(original, renamed));

    let source = StoragePath::from(original);
    let node = layer
        .node(&source)
        .cloned()
        .ok_or_else(|| MoveError::SourceNotFound(source.to_string()))?;

    let child_name = renamed.name().to_string();
    let child = node.without_children();
    let mut parent = node;
    parent.profiles = IndexMap::from([(child_name, child)]);
    layer.set_node(&source, parent);

    if let Err(err) = move_nested_secure_entries(layer, original, renamed) {
        tracing::warn!(
            original = %original,
            renamed = %renamed,
            error = %err,
            "secret migration failed during nesting; structural move stands"
        );
    }
    Ok(())
}

/// Move the new parent's secret entries down to the new child
fn move_nested_secure_entries(
    layer: &mut ConfigLayer,
    original: &ProfileId,
    renamed: &ProfileId,
) -> Result<(), MoveError> {
    let parent_path = StoragePath::from(original);
    let child_path = StoragePath::from(renamed);

    let entries = {
        let parent = layer
            .node_mut(&parent_path)
            .ok_or_else(|| MoveError::SourceNotFound(parent_path.to_string()))?;
        std::mem::take(&mut parent.secure)
    };
    let child = layer
        .node_mut(&child_path)
        .ok_or_else(|| MoveError::SourceNotFound(child_path.to_string()))?;
    child.secure = entries;
    Ok(())
}

/// Rewrite secret references rooted under a moved subtree
///
/// Secret-entry lists are attributes of whichever node owns them; after a
/// subtree moves, any node in the entire layer whose `secure` list holds a
/// reference rooted under `source` gets that reference rewritten to the new
/// location. Every profile node is visited exactly once — secrets do not
/// necessarily live on the moved node itself. Entries that are bare property
/// names rather than storage-path references never match and pass through.
pub fn migrate_secure_references(
    layer: &mut ConfigLayer,
    source: &StoragePath,
    target: &StoragePath,
) {
    let from = source.to_string();
    let to = target.to_string();
    let subtree_prefix = format!("{from}.");

    layer.for_each_node_mut(&mut |node| {
        for entry in &mut node.secure {
            if *entry == from {
                entry.clone_from(&to);
            } else if let Some(rest) = entry.strip_prefix(&subtree_prefix) {
                *entry = format!("{to}.{rest}");
            }
        }
    });
}
