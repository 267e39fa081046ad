//! Profile nodes
//!
//! Provides [`ProfileNode`], one entry in the configuration-profile tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in the configuration tree
///
/// A node optionally carries a type, a map of typed properties, an ordered
/// list of secret references, and nested child profiles. The `secure` list
/// names entries the producer considers sensitive; the engine treats its
/// contents as opaque logical references and never validates them against
/// `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileNode {
    /// Profile type (e.g. `zosmf`, `base`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,

    /// Typed properties of this profile
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,

    /// Ordered secret references owned by this node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure: Vec<String>,

    /// Nested child profiles
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, ProfileNode>,
}

impl ProfileNode {
    /// Create an empty untyped node
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty node with a type
    #[inline]
    #[must_use]
    pub fn typed(profile_type: impl Into<String>) -> Self {
        Self {
            profile_type: Some(profile_type.into()),
            ..Self::default()
        }
    }

    /// Copy of this node without its children
    #[must_use]
    pub fn without_children(&self) -> Self {
        Self {
            profile_type: self.profile_type.clone(),
            properties: self.properties.clone(),
            secure: self.secure.clone(),
            profiles: IndexMap::new(),
        }
    }

    /// True when the node carries nothing at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profile_type.is_none()
            && self.properties.is_empty()
            && self.secure.is_empty()
            && self.profiles.is_empty()
    }

    /// Visit this node and every descendant, depth-first, exactly once
    pub fn for_each_mut(&mut self, visit: &mut dyn FnMut(&mut ProfileNode)) {
        visit(self);
        for child in self.profiles.values_mut() {
            child.for_each_mut(visit);
        }
    }
}
