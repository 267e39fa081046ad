//! Layer context
//!
//! Provides [`LayerContext`], the explicit caller context handed into every
//! engine entry point instead of ambient configuration.

use serde::{Deserialize, Serialize};

/// Caller context for one orchestration pass
///
/// Carries the active layer's on-disk identity and the home directory used
/// to expand `~`-prefixed config paths, so requests scoped with either
/// spelling land on the same layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerContext {
    /// On-disk identity of the active layer
    pub config_path: String,

    /// Home directory for `~` expansion, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_dir: Option<String>,
}

impl LayerContext {
    /// Create a context for the given active layer
    #[inline]
    #[must_use]
    pub fn new(config_path: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            home_dir: None,
        }
    }

    /// Attach a home directory for `~` expansion
    #[inline]
    #[must_use]
    pub fn with_home_dir(mut self, home_dir: impl Into<String>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    /// Normalize a config path for layer-identity comparison
    ///
    /// Expands a leading `~` against the context's home directory. Paths
    /// without a `~` prefix, and contexts without a home directory, pass
    /// through unchanged.
    #[must_use]
    pub fn resolve(&self, config_path: &str) -> String {
        match (&self.home_dir, config_path.strip_prefix('~')) {
            (Some(home), Some(rest)) => format!("{home}{rest}"),
            _ => config_path.to_string(),
        }
    }

    /// Check whether `config_path` names the context's active layer
    #[inline]
    #[must_use]
    pub fn is_active(&self, config_path: &str) -> bool {
        self.resolve(config_path) == self.resolve(&self.config_path)
    }
}
