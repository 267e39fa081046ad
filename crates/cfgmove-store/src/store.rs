//! Store abstraction
//!
//! Provides [`ConfigStore`], the seam between the rename engine and whatever
//! owns the configuration layers, plus the two implementations the engine's
//! execution modes run against: [`MemoryStore`] (commit) and
//! [`EphemeralStore`] (simulate).

use crate::layer::ConfigLayer;
use indexmap::IndexMap;

/// Errors raised at the store boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No layer registered under the given config path
    #[error("configuration layer not found: {0}")]
    LayerNotFound(String),

    /// The store or a layer does not satisfy the engine's contract
    #[error("config move API contract violation: {0}")]
    ContractViolation(String),

    /// Persisting a layer failed
    #[error("failed to persist layer '{config_path}': {reason}")]
    PersistFailed {
        /// Layer that failed to persist
        config_path: String,
        /// Underlying reason
        reason: String,
    },
}

/// Access to configuration layers by their on-disk identity
///
/// The engine owns the tree exclusively for the duration of one orchestration
/// call; implementations need no internal synchronization. `persist` must
/// complete before the engine re-reads state for the next rename in a batch,
/// because later guard checks depend on the mutated result of earlier ones.
pub trait ConfigStore: std::fmt::Debug {
    /// Read the layer registered under `config_path`
    ///
    /// # Errors
    /// Returns [`StoreError::LayerNotFound`] when no such layer exists.
    fn layer(&self, config_path: &str) -> Result<&ConfigLayer, StoreError>;

    /// Read the layer registered under `config_path` mutably
    ///
    /// # Errors
    /// Returns [`StoreError::LayerNotFound`] when no such layer exists.
    fn layer_mut(&mut self, config_path: &str) -> Result<&mut ConfigLayer, StoreError>;

    /// Persist the layer registered under `config_path`
    ///
    /// # Errors
    /// Returns [`StoreError`] when the layer is missing or cannot be saved.
    fn persist(&mut self, config_path: &str) -> Result<(), StoreError>;
}

/// Precondition check before a batch runs against a store
///
/// An unreachable layer at batch entry is a broken caller contract, not a
/// per-rename miss, so it surfaces as the contract-violation class.
///
/// # Errors
/// Returns [`StoreError::ContractViolation`] when the layer is not
/// reachable through the store.
pub fn validate_store(store: &dyn ConfigStore, config_path: &str) -> Result<(), StoreError> {
    match store.layer(config_path) {
        Ok(_) => Ok(()),
        Err(_) => Err(StoreError::ContractViolation(format!(
            "layer '{config_path}' is not reachable through the store"
        ))),
    }
}

/// In-memory commit-mode store
///
/// `persist` snapshots the current layer state; tests observe the snapshot
/// through [`MemoryStore::saved_layer`] to assert what would have been
/// written to disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    layers: IndexMap<String, ConfigLayer>,
    saved: IndexMap<String, ConfigLayer>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer under its own config path
    pub fn insert_layer(&mut self, layer: ConfigLayer) {
        self.layers.insert(layer.config_path.clone(), layer);
    }

    /// Last persisted state of a layer, if it was ever persisted
    #[inline]
    #[must_use]
    pub fn saved_layer(&self, config_path: &str) -> Option<&ConfigLayer> {
        self.saved.get(config_path)
    }

    /// Config paths of all registered layers
    #[inline]
    pub fn config_paths(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}

impl ConfigStore for MemoryStore {
    fn layer(&self, config_path: &str) -> Result<&ConfigLayer, StoreError> {
        self.layers
            .get(config_path)
            .ok_or_else(|| StoreError::LayerNotFound(config_path.to_string()))
    }

    fn layer_mut(&mut self, config_path: &str) -> Result<&mut ConfigLayer, StoreError> {
        self.layers
            .get_mut(config_path)
            .ok_or_else(|| StoreError::LayerNotFound(config_path.to_string()))
    }

    fn persist(&mut self, config_path: &str) -> Result<(), StoreError> {
        let layer = self
            .layers
            .get(config_path)
            .ok_or_else(|| StoreError::LayerNotFound(config_path.to_string()))?;
        self.saved.insert(config_path.to_string(), layer.clone());
        Ok(())
    }
}

/// Ephemeral simulate-mode store
///
/// Holds deep clones of the layers a preview touches. Mutations are never
/// observable through the store the snapshot was taken from, and `persist`
/// is a no-op.
#[derive(Debug, Clone, Default)]
pub struct EphemeralStore {
    layers: IndexMap<String, ConfigLayer>,
}

impl EphemeralStore {
    /// Create an empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deep-cloned layer to the snapshot
    pub fn insert_layer(&mut self, layer: ConfigLayer) {
        self.layers.insert(layer.config_path.clone(), layer);
    }

    /// Snapshot the named layers out of another store
    ///
    /// Layers that do not exist in `source` are silently omitted; the preview
    /// is best-effort.
    #[must_use]
    pub fn snapshot<'a>(
        source: &dyn ConfigStore,
        config_paths: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut snapshot = Self::new();
        for config_path in config_paths {
            if let Ok(layer) = source.layer(config_path) {
                snapshot.insert_layer(layer.clone());
            }
        }
        snapshot
    }

    /// Config paths captured by this snapshot
    #[inline]
    pub fn config_paths(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}

impl ConfigStore for EphemeralStore {
    fn layer(&self, config_path: &str) -> Result<&ConfigLayer, StoreError> {
        self.layers
            .get(config_path)
            .ok_or_else(|| StoreError::LayerNotFound(config_path.to_string()))
    }

    fn layer_mut(&mut self, config_path: &str) -> Result<&mut ConfigLayer, StoreError> {
        self.layers
            .get_mut(config_path)
            .ok_or_else(|| StoreError::LayerNotFound(config_path.to_string()))
    }

    fn persist(&mut self, _config_path: &str) -> Result<(), StoreError> {
        // Previews never touch persistent storage
        Ok(())
    }
}
