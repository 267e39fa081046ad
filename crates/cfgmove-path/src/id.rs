//! Profile identifiers
//!
//! Provides [`ProfileId`] for addressing a node by dot-joined profile names,
//! independent of the storage encoding.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dot-joined profile identifier
///
/// Locates a node in the profile tree by its chain of profile names.
/// Segments are non-empty and never whitespace-only; the identifier as a
/// whole is never empty.
///
/// # Examples
/// - `["a"]` → `a` (root-level profile)
/// - `["a", "b"]` → `a.b` (child `b` nested under `a`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(Vec<String>);

impl ProfileId {
    /// Create an identifier from segments
    ///
    /// # Errors
    /// Returns [`PathError`] when `segments` is empty or contains an empty or
    /// whitespace-only segment.
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::EmptyKey);
        }
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(PathError::BlankSegment(segments.join(".")));
        }
        Ok(Self(segments))
    }

    /// Identifier segments, root first
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Profile name (last segment)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        // Invariant: segments are never empty
        self.0.last().map_or("", String::as_str)
    }

    /// Root profile name (first segment)
    #[inline]
    #[must_use]
    pub fn root(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// True for a single-level (root) profile
    #[inline]
    #[must_use]
    pub fn is_root_level(&self) -> bool {
        self.0.len() == 1
    }

    /// Parent identifier, if any
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment, returning a new identifier
    ///
    /// # Errors
    /// Returns [`PathError::BlankSegment`] when `segment` is empty or
    /// whitespace-only.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = segment.into();
        if segment.trim().is_empty() {
            return Err(PathError::BlankSegment(format!("{self}.{segment}")));
        }
        let mut segments = self.0.clone();
        segments.push(segment);
        Ok(Self(segments))
    }

    /// Check whether this identifier is a prefix of another
    ///
    /// A prefix may equal the whole identifier.
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check whether this identifier is a strict dotted ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Segments of `self` below `ancestor`
    ///
    /// Returns `None` when `ancestor` is not a prefix of `self`.
    #[must_use]
    pub fn relative_to(&self, ancestor: &Self) -> Option<&[String]> {
        if ancestor.is_prefix_of(self) {
            Some(&self.0[ancestor.0.len()..])
        } else {
            None
        }
    }

    /// Rewrite the leading `from` segments to `to`, keeping the remainder
    ///
    /// Returns `None` when `from` is not a prefix of `self`.
    #[must_use]
    pub fn replace_prefix(&self, from: &Self, to: &Self) -> Option<Self> {
        let rest = self.relative_to(from)?;
        let mut segments = to.0.clone();
        segments.extend(rest.iter().cloned());
        Some(Self(segments))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for ProfileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for ProfileId {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PathError::EmptyKey);
        }
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        Self::new(segments)
    }
}

impl TryFrom<String> for ProfileId {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.to_string()
    }
}

/// Errors for profile identifiers and storage paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Identifier is empty or blank
    #[error("invalid profile key: key is empty")]
    EmptyKey,

    /// Identifier contains an empty or whitespace-only segment
    #[error("invalid profile key '{0}': empty or blank segment")]
    BlankSegment(String),

    /// Storage path does not follow the `profiles.<name>` interleaving
    #[error("malformed storage path '{0}': expected alternating 'profiles' segments")]
    MalformedStoragePath(String),
}
