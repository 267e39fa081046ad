//! Configuration layers
//!
//! Provides [`ConfigLayer`], the root of one configuration file's profile
//! tree, and node addressing by [`StoragePath`].

use crate::node::ProfileNode;
use crate::store::StoreError;
use cfgmove_path::{StoragePath, PROFILES_SEGMENT};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One configuration layer
///
/// A layer is identified by its on-disk path and owns the root `profiles`
/// map plus the per-type `defaults` pointers. All node addressing goes
/// through [`StoragePath`] values; a malformed path addresses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigLayer {
    /// On-disk identity of this layer
    #[serde(skip)]
    pub config_path: String,

    /// Default-profile pointers, keyed by profile type
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub defaults: IndexMap<String, Value>,

    /// Root profiles of this layer
    #[serde(default)]
    pub profiles: IndexMap<String, ProfileNode>,
}

impl ConfigLayer {
    /// Create an empty layer
    #[inline]
    #[must_use]
    pub fn new(config_path: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            defaults: IndexMap::new(),
            profiles: IndexMap::new(),
        }
    }

    /// Ingest a layer from its raw JSON root
    ///
    /// # Errors
    /// Returns [`StoreError::ContractViolation`] when the root is not an
    /// object or lacks a `profiles` object.
    pub fn from_value(config_path: impl Into<String>, root: &Value) -> Result<Self, StoreError> {
        let config_path = config_path.into();
        let Some(object) = root.as_object() else {
            return Err(StoreError::ContractViolation(format!(
                "layer '{config_path}' root is not an object"
            )));
        };
        if !object.get(PROFILES_SEGMENT).is_some_and(Value::is_object) {
            return Err(StoreError::ContractViolation(format!(
                "layer '{config_path}' has no 'profiles' map"
            )));
        }
        let mut layer: Self = serde_json::from_value(root.clone()).map_err(|err| {
            StoreError::ContractViolation(format!("layer '{config_path}' is malformed: {err}"))
        })?;
        layer.config_path = config_path;
        Ok(layer)
    }

    /// Render the layer back to its JSON root
    ///
    /// # Panics
    /// Never panics: the layer shape is always representable as JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Read the node at `path`
    #[must_use]
    pub fn node(&self, path: &StoragePath) -> Option<&ProfileNode> {
        let segments = path.segments();
        if segments.len() < 2 || segments.len() % 2 != 0 {
            return None;
        }
        let mut map = &self.profiles;
        let mut found = None;
        for pair in segments.chunks(2) {
            if pair[0] != PROFILES_SEGMENT {
                return None;
            }
            let node = map.get(&pair[1])?;
            map = &node.profiles;
            found = Some(node);
        }
        found
    }

    /// Read the node at `path` mutably
    pub fn node_mut(&mut self, path: &StoragePath) -> Option<&mut ProfileNode> {
        let segments = path.segments();
        if segments.len() < 2 || segments.len() % 2 != 0 {
            return None;
        }
        let mut map = &mut self.profiles;
        let last = segments.len() - 2;
        for (index, pair) in segments.chunks(2).enumerate() {
            if pair[0] != PROFILES_SEGMENT {
                return None;
            }
            let node = map.get_mut(&pair[1])?;
            if index * 2 == last {
                return Some(node);
            }
            map = &mut node.profiles;
        }
        None
    }

    /// Write `node` at `path`, creating empty intermediate parents as needed
    ///
    /// An existing node at `path` is replaced wholesale.
    pub fn set_node(&mut self, path: &StoragePath, node: ProfileNode) {
        if let Some(slot) = self.ensure_node(path) {
            *slot = node;
        }
    }

    /// Get the node at `path` mutably, creating empty intermediates as needed
    ///
    /// Returns `None` only for a malformed path.
    pub fn ensure_node(&mut self, path: &StoragePath) -> Option<&mut ProfileNode> {
        let segments = path.segments();
        if segments.len() < 2 || segments.len() % 2 != 0 {
            return None;
        }
        let mut map = &mut self.profiles;
        let last = segments.len() - 2;
        for (index, pair) in segments.chunks(2).enumerate() {
            if pair[0] != PROFILES_SEGMENT {
                return None;
            }
            let node = map.entry(pair[1].clone()).or_default();
            if index * 2 == last {
                return Some(node);
            }
            map = &mut node.profiles;
        }
        None
    }

    /// Delete the node at `path`, returning whether anything was removed
    pub fn delete_node(&mut self, path: &StoragePath) -> bool {
        let Some(name) = path.names().last().map(str::to_string) else {
            return false;
        };
        match path.parent() {
            Some(parent) => self
                .node_mut(&parent)
                .is_some_and(|node| node.profiles.shift_remove(&name).is_some()),
            None => self.profiles.shift_remove(&name).is_some(),
        }
    }

    /// Visit every profile node in the layer, depth-first, exactly once
    pub fn for_each_node_mut(&mut self, visit: &mut dyn FnMut(&mut ProfileNode)) {
        for node in self.profiles.values_mut() {
            node.for_each_mut(visit);
        }
    }
}
