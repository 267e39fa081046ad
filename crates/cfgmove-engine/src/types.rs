//! Request and result value objects
//!
//! Rename requests and pending changes are created by the caller and
//! consumed entirely within one orchestration pass; they are never
//! persisted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One requested profile rename
///
/// Keys are profile identifiers (`"a.b"`), not storage paths. `config_path`
/// scopes the request to one configuration layer; requests from different
/// layers are never cross-consolidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    /// Identifier before the rename
    pub original_key: String,

    /// Identifier after the rename
    pub new_key: String,

    /// Layer this request applies to
    pub config_path: String,
}

impl RenameRequest {
    /// Create a rename request
    #[inline]
    #[must_use]
    pub fn new(
        original_key: impl Into<String>,
        new_key: impl Into<String>,
        config_path: impl Into<String>,
    ) -> Self {
        Self {
            original_key: original_key.into(),
            new_key: new_key.into(),
            config_path: config_path.into(),
        }
    }

    /// True when the request renames nothing
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.original_key == self.new_key
    }
}

/// Where a renamed profile ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTarget {
    /// Identifier after the rename
    pub new_key: String,

    /// Layer the rename applies to
    pub config_path: String,
}

/// Resolved original-identifier to target mapping for one batch
///
/// Keyed by the identifier a profile had before the batch ran. Lookups are
/// scoped by layer: an entry only matches a query with the same
/// `config_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap(IndexMap<String, RenameTarget>);

impl RenameMap {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from a resolved batch
    #[must_use]
    pub fn from_resolved(resolved: &[RenameRequest]) -> Self {
        let mut map = IndexMap::new();
        for request in resolved {
            map.insert(
                request.original_key.clone(),
                RenameTarget {
                    new_key: request.new_key.clone(),
                    config_path: request.config_path.clone(),
                },
            );
        }
        Self(map)
    }

    /// Number of renames in the map
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no renames were resolved
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact-key lookup scoped to a layer
    #[must_use]
    pub fn get(&self, original_key: &str, config_path: &str) -> Option<&RenameTarget> {
        self.0
            .get(original_key)
            .filter(|target| target.config_path == config_path)
    }

    /// Resolve an identifier against the batch, longest prefix first
    ///
    /// Scans from the longest matching prefix of `identifier` down to the
    /// shortest and applies the first rename found, so a rename of a deep
    /// ancestor takes precedence over a shallower coincidental match.
    /// Resolution follows chains: a resolved batch may rename an ancestor
    /// and then the already-moved child, so the map is re-applied until no
    /// unused entry matches. Each entry applies at most once along a chain,
    /// which keeps self-prefixed renames (`a` → `a.inner`) and cyclic
    /// batches from looping. Returns `None` when no prefix of `identifier`
    /// matches within the given layer.
    #[must_use]
    pub fn resolve(&self, identifier: &str, config_path: &str) -> Option<String> {
        let mut used: Vec<&str> = Vec::new();
        let mut current = identifier.to_string();
        let mut resolved_any = false;
        while let Some((entry, next)) = self.resolve_once(&current, config_path, &used) {
            used.push(entry);
            current = next;
            resolved_any = true;
        }
        resolved_any.then_some(current)
    }

    fn resolve_once<'a>(
        &'a self,
        identifier: &str,
        config_path: &str,
        used: &[&str],
    ) -> Option<(&'a str, String)> {
        let segments: Vec<&str> = identifier.split('.').collect();
        for prefix_len in (1..=segments.len()).rev() {
            let prefix = segments[..prefix_len].join(".");
            let Some((entry, target)) = self.0.get_key_value(&prefix) else {
                continue;
            };
            if target.config_path != config_path || used.contains(&entry.as_str()) {
                continue;
            }
            let mut resolved = target.new_key.clone();
            for rest in &segments[prefix_len..] {
                resolved.push('.');
                resolved.push_str(rest);
            }
            return Some((entry.as_str(), resolved));
        }
        None
    }
}

/// One queued, uncommitted property edit or deletion
///
/// `key` and `path` encode the same location (dotted string and array form);
/// `profile` optionally names the profile the edit belongs to. The engine
/// parses these once at ingestion and keeps every other field untouched when
/// rewriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    /// Dotted storage location, e.g. `profiles.a.properties.host`
    pub key: String,

    /// Same location in array form
    #[serde(default)]
    pub path: Vec<String>,

    /// Profile identifier the edit belongs to, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Layer this change applies to
    pub config_path: String,

    /// New value (absent for deletions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Whether the edited property is secret
    #[serde(default)]
    pub secure: bool,
}

impl PendingChange {
    /// Create a change from its dotted key
    #[must_use]
    pub fn new(key: impl Into<String>, config_path: impl Into<String>) -> Self {
        let key = key.into();
        let path = key.split('.').map(str::to_string).collect();
        Self {
            key,
            path,
            profile: None,
            config_path: config_path.into(),
            value: None,
            secure: false,
        }
    }

    /// Attach a value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach the owning profile identifier
    #[inline]
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Mark the edited property secret
    #[inline]
    #[must_use]
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

/// One rename the orchestrator skipped, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRename {
    /// The resolved request that was skipped
    pub request: RenameRequest,

    /// Why it was skipped
    pub reason: String,
}

/// Outcome of one orchestration pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveReport {
    /// Renames applied, in order
    pub applied: Vec<RenameRequest>,

    /// Renames skipped, with reasons
    pub skipped: Vec<SkippedRename>,

    /// Pending edits replayed after rewriting
    pub changes_applied: usize,

    /// Pending deletions replayed after rewriting
    pub deletions_applied: usize,
}

impl MoveReport {
    /// True when nothing was applied or skipped
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
            && self.skipped.is_empty()
            && self.changes_applied == 0
            && self.deletions_applied == 0
    }
}
