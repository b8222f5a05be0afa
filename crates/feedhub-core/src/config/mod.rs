//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section has defaults, so an empty source yields a
//! usable configuration.

pub mod app;
pub mod events;
pub mod logging;
pub mod plugin;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::app::HostConfig;
use self::events::EventsConfig;
use self::logging::LoggingConfig;
use self::plugin::PluginSystemConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host application identity.
    #[serde(default)]
    pub app: HostConfig,
    /// Plugin system settings.
    #[serde(default)]
    pub plugins: PluginSystemConfig,
    /// Event bus settings.
    #[serde(default)]
    pub events: EventsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the `config/` directory.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from(Path::new("config"), env)
    }

    /// Load configuration from TOML files in `dir`.
    ///
    /// Merges `{dir}/default.toml` with an environment-specific overlay
    /// `{dir}/{env}.toml` and environment variables prefixed with `FEEDHUB`
    /// (sections separated by `__`, e.g. `FEEDHUB__LOGGING__LEVEL`).
    pub fn load_from(dir: &Path, env: &str) -> Result<Self, AppError> {
        let default_path = dir.join("default");
        let env_path = dir.join(env);

        let config = config::Config::builder()
            .add_source(config::File::from(default_path).required(false))
            .add_source(config::File::from(env_path).required(false))
            .add_source(
                config::Environment::with_prefix("FEEDHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
