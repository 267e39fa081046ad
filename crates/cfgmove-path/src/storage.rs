//! Storage paths
//!
//! Provides [`StoragePath`], the store-facing encoding of a profile location:
//! the identifier's segments with a literal `profiles` segment interleaved
//! before every name.

use crate::id::{PathError, ProfileId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Literal segment interleaved before every profile name
pub const PROFILES_SEGMENT: &str = "profiles";

/// Store-facing address of a profile node
///
/// Segments strictly alternate `profiles`, name, `profiles`, name, ... so a
/// path always has even length and decodes back to the [`ProfileId`] it was
/// built from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath(Vec<String>);

impl StoragePath {
    /// Raw segments, including the interleaved `profiles` tokens
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Profile names only, in order (every odd segment)
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().skip(1).step_by(2).map(String::as_str)
    }

    /// Number of profile names addressed by this path
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len() / 2
    }

    /// Decode back to the profile identifier
    ///
    /// # Errors
    /// Returns [`PathError::MalformedStoragePath`] when the segments do not
    /// alternate `profiles`/name, and [`PathError`] validation errors when a
    /// decoded name is blank.
    pub fn profile_id(&self) -> Result<ProfileId, PathError> {
        if self.0.is_empty() || self.0.len() % 2 != 0 {
            return Err(PathError::MalformedStoragePath(self.to_string()));
        }
        for token in self.0.iter().step_by(2) {
            if token != PROFILES_SEGMENT {
                return Err(PathError::MalformedStoragePath(self.to_string()));
            }
        }
        ProfileId::new(self.names().map(str::to_string).collect())
    }

    /// Parent path (the containing profile), if any
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 2 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 2].to_vec()))
        }
    }

    /// Check whether this path addresses a node inside (or at) `other`
    #[inline]
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        other.0.len() <= self.0.len() && other.0 == self.0[..other.0.len()]
    }
}

impl From<&ProfileId> for StoragePath {
    fn from(id: &ProfileId) -> Self {
        let mut segments = Vec::with_capacity(id.depth() * 2);
        for name in id.iter() {
            segments.push(PROFILES_SEGMENT.to_string());
            segments.push(name.to_string());
        }
        Self(segments)
    }
}

impl Display for StoragePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for StoragePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::MalformedStoragePath(s.to_string()));
        }
        let path = Self(s.split('.').map(str::to_string).collect());
        // Decoding validates the alternation and the embedded names
        path.profile_id()?;
        Ok(path)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.to_string()
    }
}
