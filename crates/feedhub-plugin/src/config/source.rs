//! Persisted plugin configuration sources.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;

/// Loads and persists per-plugin configuration objects.
///
/// This is the host's persisted-configuration collaborator; the plugin
/// system never decides where configuration lives.
#[async_trait]
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Loads the persisted configuration for a plugin, if any.
    async fn load(&self, plugin_id: &str) -> AppResult<Option<Value>>;

    /// Persists the configuration for a plugin.
    async fn save(&self, plugin_id: &str, config: &Value) -> AppResult<()>;
}

/// Configuration source kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    /// Plugin ID → persisted configuration.
    values: DashMap<String, Value>,
}

impl MemoryConfigSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source pre-seeded with configuration for one plugin.
    pub fn with_value(self, plugin_id: impl Into<String>, config: Value) -> Self {
        self.values.insert(plugin_id.into(), config);
        self
    }
}

#[async_trait]
impl ConfigSource for MemoryConfigSource {
    async fn load(&self, plugin_id: &str) -> AppResult<Option<Value>> {
        Ok(self.values.get(plugin_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, plugin_id: &str, config: &Value) -> AppResult<()> {
        self.values.insert(plugin_id.to_string(), config.clone());
        Ok(())
    }
}

/// Configuration source storing one JSON file per plugin (`{dir}/{id}.json`).
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    /// Directory holding the configuration files.
    directory: PathBuf,
}

impl FileConfigSource {
    /// Creates a source rooted at `directory`. The directory is created on
    /// first save.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the configuration directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, plugin_id: &str) -> PathBuf {
        self.directory.join(format!("{plugin_id}.json"))
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn load(&self, plugin_id: &str) -> AppResult<Option<Value>> {
        let path = self.path_for(plugin_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::with_source(
                    feedhub_core::error::ErrorKind::Io,
                    format!("Failed to read '{}'", path.display()),
                    e,
                ));
            }
        };

        debug!(plugin_id = %plugin_id, path = %path.display(), "Loaded persisted plugin config");
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn save(&self, plugin_id: &str, config: &Value) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.path_for(plugin_id);
        let raw = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&path, raw).await?;
        debug!(plugin_id = %plugin_id, path = %path.display(), "Persisted plugin config");
        Ok(())
    }
}
