//! Plugin registry: the manager's table of plugin entries and the
//! registrations each plugin owns.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::definition::PluginDefinition;
use crate::error::{PluginError, PluginResult};
use crate::events::bus::SubscriptionId;
use crate::store::middleware::MiddlewareId;

/// Lifecycle state of a plugin entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Entry created, no callback has run yet.
    Unloaded,
    /// `install` completed.
    Installed,
    /// `activate` completed and assets are registered.
    Activated,
    /// A lifecycle callback or asset registration failed.
    Error,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::Installed => write!(f, "installed"),
            Self::Activated => write!(f, "activated"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Everything a plugin has registered, swept on unload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationLedger {
    /// Extension ids.
    pub extensions: Vec<String>,
    /// Reducer slice names.
    pub reducers: Vec<String>,
    /// Middleware ids.
    pub middleware: Vec<MiddlewareId>,
    /// Service names.
    pub services: Vec<String>,
    /// Component names.
    pub components: Vec<String>,
    /// Screen names.
    pub screens: Vec<String>,
    /// Event subscriptions.
    pub subscriptions: Vec<SubscriptionId>,
}

impl RegistrationLedger {
    /// Returns whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of recorded registrations.
    pub fn len(&self) -> usize {
        self.extensions.len()
            + self.reducers.len()
            + self.middleware.len()
            + self.services.len()
            + self.components.len()
            + self.screens.len()
            + self.subscriptions.len()
    }
}

/// Ledger shared between a plugin entry and the plugin's context.
pub type SharedLedger = Arc<Mutex<RegistrationLedger>>;

/// A plugin known to the manager.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    /// The definition it was loaded from.
    pub definition: Arc<PluginDefinition>,
    /// Current lifecycle state.
    pub state: PluginState,
    /// Most recent lifecycle failure.
    pub last_error: Option<PluginError>,
    /// Whether `install` completed, so `uninstall` is owed on unload.
    pub installed: bool,
    /// Load order, increasing.
    pub sequence: u64,
    /// When loading started.
    pub loaded_at: DateTime<Utc>,
    /// Registrations owned by the plugin.
    pub ledger: SharedLedger,
}

impl PluginEntry {
    /// Plugin id.
    pub fn id(&self) -> &str {
        &self.definition.manifest.id
    }

    /// Public view of the entry.
    pub fn summary(&self) -> LoadedPlugin {
        let manifest = &self.definition.manifest;
        LoadedPlugin {
            id: manifest.id.clone(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            state: self.state,
            loaded_at: self.loaded_at,
        }
    }
}

/// Public view of a plugin entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPlugin {
    /// Plugin id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Lifecycle state.
    pub state: PluginState,
    /// When loading started.
    pub loaded_at: DateTime<Utc>,
}

/// Table of plugin entries keyed by id.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Plugin ID → entry.
    plugins: RwLock<HashMap<String, PluginEntry>>,
    /// Next load sequence number.
    next_sequence: Mutex<u64>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entry in the `Unloaded` state.
    pub async fn insert(&self, definition: Arc<PluginDefinition>) -> PluginResult<PluginEntry> {
        let id = definition.manifest.id.clone();
        let mut plugins = self.plugins.write().await;

        if plugins.contains_key(&id) {
            return Err(PluginError::DuplicateId(id));
        }

        let sequence = {
            let mut next = self.next_sequence.lock().await;
            *next += 1;
            *next
        };

        let entry = PluginEntry {
            definition,
            state: PluginState::Unloaded,
            last_error: None,
            installed: false,
            sequence,
            loaded_at: Utc::now(),
            ledger: SharedLedger::default(),
        };

        info!(
            plugin_id = %id,
            name = %entry.definition.manifest.name,
            version = %entry.definition.manifest.version,
            "Registering plugin"
        );

        plugins.insert(id, entry.clone());
        Ok(entry)
    }

    /// Removes an entry.
    pub async fn remove(&self, plugin_id: &str) -> Option<PluginEntry> {
        self.plugins.write().await.remove(plugin_id)
    }

    /// Returns a snapshot of an entry.
    pub async fn get(&self, plugin_id: &str) -> Option<PluginEntry> {
        self.plugins.read().await.get(plugin_id).cloned()
    }

    /// Returns whether an entry exists.
    pub async fn contains(&self, plugin_id: &str) -> bool {
        self.plugins.read().await.contains_key(plugin_id)
    }

    /// Returns the state of an entry.
    pub async fn state(&self, plugin_id: &str) -> Option<PluginState> {
        self.plugins.read().await.get(plugin_id).map(|e| e.state)
    }

    /// Moves an entry to a new state.
    pub async fn set_state(&self, plugin_id: &str, state: PluginState) {
        if let Some(entry) = self.plugins.write().await.get_mut(plugin_id) {
            if state == PluginState::Installed {
                entry.installed = true;
            }
            entry.state = state;
        }
    }

    /// Moves an entry to `Error` and records the failure.
    pub async fn set_error(&self, plugin_id: &str, error: PluginError) {
        if let Some(entry) = self.plugins.write().await.get_mut(plugin_id) {
            entry.state = PluginState::Error;
            entry.last_error = Some(error);
        }
    }

    /// Entries in load order.
    pub async fn list(&self) -> Vec<PluginEntry> {
        let plugins = self.plugins.read().await;
        let mut entries: Vec<PluginEntry> = plugins.values().cloned().collect();
        entries.sort_by_key(|e| e.sequence);
        entries
    }

    /// Ids of entries whose manifest lists `plugin_id` as a conflict.
    pub async fn conflicting_with(&self, plugin_id: &str) -> Vec<String> {
        self.plugins
            .read()
            .await
            .values()
            .filter(|e| e.definition.manifest.conflicts.iter().any(|c| c == plugin_id))
            .map(|e| e.id().to_string())
            .collect()
    }

    /// Ids of activated entries that require `plugin_id`, in load order.
    pub async fn dependents_of(&self, plugin_id: &str) -> Vec<String> {
        self.list()
            .await
            .into_iter()
            .filter(|e| e.state == PluginState::Activated)
            .filter(|e| {
                e.definition
                    .manifest
                    .dependencies
                    .iter()
                    .any(|d| d == plugin_id)
            })
            .map(|e| e.id().to_string())
            .collect()
    }

    /// Number of entries.
    pub async fn count(&self) -> usize {
        self.plugins.read().await.len()
    }
}
