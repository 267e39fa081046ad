//! Pending-change rewriting
//!
//! Queued, uncommitted property edits and deletions address profiles by
//! their pre-rename locations. After a batch resolves, every pending change
//! is rewritten so it targets the post-rename location, then replayed
//! against the store (commit) or the ephemeral copy (simulate).
//!
//! Change keys are parsed once at ingestion into an identifier plus a typed
//! suffix instead of being re-split at every rewrite step.

use crate::types::{PendingChange, RenameMap};
use cfgmove_path::{ProfileId, StoragePath, PROFILES_SEGMENT};
use cfgmove_store::ConfigLayer;
use serde_json::Value;

/// What follows the profile identifier inside a change key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSuffix {
    /// The key addresses the profile node itself
    ProfileOnly,

    /// `...<profile>.type`
    Type,

    /// `...<profile>.secure`
    Secure,

    /// `...<profile>.properties.<rest>` (at least one trailing segment)
    Property(Vec<String>),
}

/// A change key split into its embedded identifier and trailing suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChangeKey {
    /// Embedded profile identifier (dotted, no `profiles` tokens)
    pub identifier: String,

    /// What the key addresses within that profile
    pub suffix: ChangeSuffix,
}

impl ParsedChangeKey {
    /// Reassemble a storage key for this location
    #[must_use]
    pub fn to_key(&self) -> String {
        let mut key = String::new();
        for name in self.identifier.split('.') {
            if !key.is_empty() {
                key.push('.');
            }
            key.push_str(PROFILES_SEGMENT);
            key.push('.');
            key.push_str(name);
        }
        match &self.suffix {
            ChangeSuffix::ProfileOnly => {}
            ChangeSuffix::Type => {
                key.push_str(".type");
            }
            ChangeSuffix::Secure => {
                key.push_str(".secure");
            }
            ChangeSuffix::Property(rest) => {
                key.push_str(".properties");
                for segment in rest {
                    key.push('.');
                    key.push_str(segment);
                }
            }
        }
        key
    }
}

/// Parse a change key of the form `profiles.<a>[.profiles.<b>...][suffix]`
///
/// Returns `None` for keys that do not follow the storage encoding; such
/// changes pass through every rewrite unmodified.
#[must_use]
pub fn parse_change_key(key: &str) -> Option<ParsedChangeKey> {
    let segments: Vec<&str> = key.split('.').collect();
    parse_segments(&segments).map(|(_, parsed)| parsed)
}

/// Parse the array form of a change key
///
/// Segments are taken as-is, so a property name containing a dot stays one
/// segment; the dotted string form cannot represent that distinction.
#[must_use]
pub fn parse_change_path(path: &[String]) -> Option<ParsedChangeKey> {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    parse_segments(&segments).map(|(_, parsed)| parsed)
}

/// Shared walk; returns the segment count consumed by the identifier pairs
fn parse_segments(segments: &[&str]) -> Option<(usize, ParsedChangeKey)> {
    let mut names: Vec<&str> = Vec::new();
    let mut index = 0;

    loop {
        if index + 1 >= segments.len() || segments[index] != PROFILES_SEGMENT {
            return None;
        }
        names.push(segments[index + 1]);
        index += 2;

        if index == segments.len() {
            return Some((
                index,
                ParsedChangeKey {
                    identifier: names.join("."),
                    suffix: ChangeSuffix::ProfileOnly,
                },
            ));
        }
        match segments[index] {
            PROFILES_SEGMENT => {}
            "type" if index + 1 == segments.len() => {
                return Some((
                    index,
                    ParsedChangeKey {
                        identifier: names.join("."),
                        suffix: ChangeSuffix::Type,
                    },
                ));
            }
            "secure" if index + 1 == segments.len() => {
                return Some((
                    index,
                    ParsedChangeKey {
                        identifier: names.join("."),
                        suffix: ChangeSuffix::Secure,
                    },
                ));
            }
            "properties" if index + 1 < segments.len() => {
                return Some((
                    index,
                    ParsedChangeKey {
                        identifier: names.join("."),
                        suffix: ChangeSuffix::Property(
                            segments[index + 1..].iter().map(|s| (*s).to_string()).collect(),
                        ),
                    },
                ));
            }
            _ => return None,
        }
    }
}

/// Rewrite a change key for a resolved rename batch
///
/// The embedded identifier is resolved longest-prefix-first against the
/// batch, scoped to `config_path`; the resolved identifier is spliced back
/// in front of whatever suffix followed. Keys with no matching rename pass
/// through unchanged.
#[must_use]
pub fn rewrite_key(key: &str, config_path: &str, renames: &RenameMap) -> String {
    let Some(mut parsed) = parse_change_key(key) else {
        return key.to_string();
    };
    let Some(resolved) = renames.resolve(&parsed.identifier, config_path) else {
        return key.to_string();
    };
    parsed.identifier = resolved;
    parsed.to_key()
}

/// Rewrite the array form of a change key
///
/// The leading `profiles.<name>` pairs are replaced with the resolved
/// identifier spliced back in as pairs; trailing segments are carried over
/// untouched, so a property name containing a dot survives intact.
#[must_use]
pub fn rewrite_path(path: &[String], config_path: &str, renames: &RenameMap) -> Vec<String> {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    let Some((consumed, parsed)) = parse_segments(&segments) else {
        return path.to_vec();
    };
    let Some(resolved) = renames.resolve(&parsed.identifier, config_path) else {
        return path.to_vec();
    };
    let mut rewritten = Vec::with_capacity(path.len());
    for name in resolved.split('.') {
        rewritten.push(PROFILES_SEGMENT.to_string());
        rewritten.push(name.to_string());
    }
    rewritten.extend(path[consumed..].iter().cloned());
    rewritten
}

/// Rewrite a whole pending change, leaving every other field untouched
///
/// `key` and `path` are rewritten independently through their own parsers,
/// so the array form's segment boundaries are preserved.
#[must_use]
pub fn rewrite_change(change: &PendingChange, renames: &RenameMap) -> PendingChange {
    let mut rewritten = change.clone();
    rewritten.key = rewrite_key(&change.key, &change.config_path, renames);
    rewritten.path = if change.path.is_empty() {
        rewritten.key.split('.').map(str::to_string).collect()
    } else {
        rewrite_path(&change.path, &change.config_path, renames)
    };
    if let Some(profile) = &change.profile {
        if let Some(resolved) = renames.resolve(profile, &change.config_path) {
            rewritten.profile = Some(resolved);
        }
    }
    rewritten
}

/// Replay one pending edit against a layer
///
/// Profiles referenced by still-pending creations may not exist yet, so
/// missing nodes are created on demand. Changes with unparseable keys are
/// skipped with a log line.
pub fn apply_change(layer: &mut ConfigLayer, change: &PendingChange) {
    let Some((parsed, storage)) = locate(change) else {
        return;
    };
    let Some(node) = layer.ensure_node(&storage) else {
        return;
    };
    match &parsed.suffix {
        ChangeSuffix::ProfileOnly => {
            if let Some(value) = &change.value {
                if let Ok(replacement) = serde_json::from_value(value.clone()) {
                    *node = replacement;
                }
            }
        }
        ChangeSuffix::Type => {
            node.profile_type = change.value.as_ref().and_then(Value::as_str).map(str::to_string);
        }
        ChangeSuffix::Secure => {
            if let Some(value) = &change.value {
                if let Ok(entries) = serde_json::from_value::<Vec<String>>(value.clone()) {
                    node.secure = entries;
                }
            }
        }
        ChangeSuffix::Property(rest) => {
            let Some(value) = &change.value else {
                return;
            };
            set_property(&mut node.properties, rest, value.clone());
            if change.secure {
                let name = rest.join(".");
                if !node.secure.contains(&name) {
                    node.secure.push(name);
                }
            }
        }
    }
}

/// Replay one pending deletion against a layer
///
/// Deleting from a profile that does not exist is a no-op.
pub fn apply_deletion(layer: &mut ConfigLayer, change: &PendingChange) {
    let Some((parsed, storage)) = locate(change) else {
        return;
    };
    if let ChangeSuffix::ProfileOnly = parsed.suffix {
        layer.delete_node(&storage);
        return;
    }
    let Some(node) = layer.node_mut(&storage) else {
        return;
    };
    match &parsed.suffix {
        ChangeSuffix::ProfileOnly => {}
        ChangeSuffix::Type => {
            node.profile_type = None;
        }
        ChangeSuffix::Secure => {
            node.secure.clear();
        }
        ChangeSuffix::Property(rest) => {
            remove_property(&mut node.properties, rest);
            let name = rest.join(".");
            node.secure.retain(|entry| *entry != name);
        }
    }
}

fn locate(change: &PendingChange) -> Option<(ParsedChangeKey, StoragePath)> {
    // The array form is authoritative when present: it keeps dotted
    // property names as single segments.
    let parsed = if change.path.is_empty() {
        parse_change_key(&change.key)?
    } else {
        parse_change_path(&change.path)?
    };
    let id: ProfileId = match parsed.identifier.parse() {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!(key = %change.key, error = %err, "skipping change with invalid profile key");
            return None;
        }
    };
    let storage = StoragePath::from(&id);
    Some((parsed, storage))
}

fn set_property(
    properties: &mut indexmap::IndexMap<String, Value>,
    segments: &[String],
    value: Value,
) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        properties.insert(first.clone(), value);
        return;
    }
    let slot = properties
        .entry(first.clone())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(serde_json::Map::new());
    }
    let mut current = slot;
    for (position, segment) in rest.iter().enumerate() {
        let map = match current.as_object_mut() {
            Some(map) => map,
            None => return,
        };
        if position + 1 == rest.len() {
            map.insert(segment.clone(), value);
            return;
        }
        let next = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !next.is_object() {
            *next = Value::Object(serde_json::Map::new());
        }
        current = next;
    }
}

fn remove_property(properties: &mut indexmap::IndexMap<String, Value>, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        properties.shift_remove(first);
        return;
    }
    let Some(mut current) = properties.get_mut(first) else {
        return;
    };
    for (position, segment) in rest.iter().enumerate() {
        let Some(map) = current.as_object_mut() else {
            return;
        };
        if position + 1 == rest.len() {
            map.remove(segment);
            return;
        }
        let Some(next) = map.get_mut(segment) else {
            return;
        };
        current = next;
    }
}
