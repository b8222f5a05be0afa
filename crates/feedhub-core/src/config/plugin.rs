//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSystemConfig {
    /// Directory holding persisted per-plugin configuration (`{id}.json`).
    #[serde(default = "default_config_directory")]
    pub config_directory: String,
    /// Plugin ids that must not be loaded even if the host ships them.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Keep loading the remaining plugins when one fails to load.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

impl Default for PluginSystemConfig {
    fn default() -> Self {
        Self {
            config_directory: default_config_directory(),
            disabled: Vec::new(),
            continue_on_error: true,
        }
    }
}

impl PluginSystemConfig {
    /// Returns whether the given plugin id is disabled by configuration.
    pub fn is_disabled(&self, plugin_id: &str) -> bool {
        self.disabled.iter().any(|id| id == plugin_id)
    }
}

fn default_config_directory() -> String {
    "data/plugins".to_string()
}

fn default_true() -> bool {
    true
}
