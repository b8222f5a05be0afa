//! Per-plugin configuration: manifest defaults overlaid with persisted
//! values, checked against the manifest's schema.

pub mod schema;
pub mod source;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::manifest::PluginManifest;

use self::schema::ConfigSchema;
use self::source::ConfigSource;

/// Shallow-merges `overlay` into `base`.
///
/// Object keys in `overlay` replace the same keys in `base`; any other
/// combination replaces `base` entirely.
pub fn merge_config(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Effective configuration of every loaded plugin.
#[derive(Debug)]
pub struct PluginConfigs {
    /// Persisted configuration collaborator.
    source: Arc<dyn ConfigSource>,
    /// Plugin ID → effective configuration.
    values: RwLock<HashMap<String, Value>>,
    /// Plugin ID → schema the configuration must satisfy.
    schemas: RwLock<HashMap<String, ConfigSchema>>,
}

impl PluginConfigs {
    /// Creates an empty configuration table backed by `source`.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            values: RwLock::new(HashMap::new()),
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Computes the effective configuration for a manifest without storing it.
    pub async fn resolve(&self, manifest: &PluginManifest) -> PluginResult<Value> {
        let persisted = self
            .source
            .load(&manifest.id)
            .await
            .map_err(|source| PluginError::ConfigStorage {
                plugin_id: manifest.id.clone(),
                source,
            })?;

        let effective = match persisted {
            Some(persisted) => merge_config(&manifest.default_config, &persisted),
            None => manifest.default_config.clone(),
        };

        if let Some(schema) = &manifest.config_schema {
            schema
                .validate(&effective)
                .map_err(|reason| PluginError::InvalidConfig {
                    plugin_id: manifest.id.clone(),
                    reason,
                })?;
        }

        Ok(effective)
    }

    /// Stores the effective configuration of a plugin being loaded.
    pub async fn insert(&self, plugin_id: &str, config: Value, schema: Option<ConfigSchema>) {
        self.values.write().await.insert(plugin_id.to_string(), config);
        if let Some(schema) = schema {
            self.schemas
                .write()
                .await
                .insert(plugin_id.to_string(), schema);
        }
    }

    /// Returns the effective configuration of a plugin.
    pub async fn get(&self, plugin_id: &str) -> Option<Value> {
        self.values.read().await.get(plugin_id).cloned()
    }

    /// Merges `patch` into a plugin's configuration, validates and persists it.
    ///
    /// Nothing changes if validation or persistence fails.
    pub async fn update(&self, plugin_id: &str, patch: &Value) -> PluginResult<Value> {
        let current = self.get(plugin_id).await.unwrap_or(Value::Null);
        let merged = merge_config(&current, patch);

        if let Some(schema) = self.schemas.read().await.get(plugin_id) {
            schema
                .validate(&merged)
                .map_err(|reason| PluginError::InvalidConfig {
                    plugin_id: plugin_id.to_string(),
                    reason,
                })?;
        }

        self.source
            .save(plugin_id, &merged)
            .await
            .map_err(|source| PluginError::ConfigStorage {
                plugin_id: plugin_id.to_string(),
                source,
            })?;

        self.values
            .write()
            .await
            .insert(plugin_id.to_string(), merged.clone());

        debug!(plugin_id = %plugin_id, "Plugin config updated");
        Ok(merged)
    }

    /// Forgets a plugin's effective configuration. Persisted values stay.
    pub async fn remove(&self, plugin_id: &str) {
        self.values.write().await.remove(plugin_id);
        self.schemas.write().await.remove(plugin_id);
    }
}
