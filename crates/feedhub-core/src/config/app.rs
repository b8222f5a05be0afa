//! Host application identity.

use serde::{Deserialize, Serialize};

/// Host application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Display name of the host application.
    #[serde(default = "default_name")]
    pub name: String,
    /// Deployment environment label (`development`, `staging`, `production`).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            environment: default_environment(),
        }
    }
}

fn default_name() -> String {
    "FeedHub".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}
