//! Event bus configuration.

use serde::{Deserialize, Serialize};

/// Event bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Number of recently emitted events kept for diagnostics.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
        }
    }
}

fn default_history_size() -> usize {
    100
}
