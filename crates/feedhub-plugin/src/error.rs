//! Plugin system error taxonomy.
//!
//! Validation errors (`DuplicateId`, `DependencyMissing`, `Conflict`,
//! `InvalidManifest`, `InvalidConfig`) are raised before the manager mutates
//! anything. `Lifecycle` wraps whatever a plugin callback returned.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use feedhub_core::error::{AppError, ErrorKind};

/// Kind of named asset a registration collision refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    /// A shared service.
    Service,
    /// A state slice reducer.
    Reducer,
    /// A named component.
    Component,
    /// A named screen.
    Screen,
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Reducer => write!(f, "reducer"),
            Self::Component => write!(f, "component"),
            Self::Screen => write!(f, "screen"),
        }
    }
}

/// Step of the plugin lifecycle during which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// The `install` callback.
    Install,
    /// The `activate` callback.
    Activate,
    /// Registration of the definition's declared assets.
    RegisterAssets,
    /// The `deactivate` callback.
    Deactivate,
    /// The `uninstall` callback.
    Uninstall,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Activate => write!(f, "activate"),
            Self::RegisterAssets => write!(f, "asset registration"),
            Self::Deactivate => write!(f, "deactivate"),
            Self::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// Errors raised by the plugin manager and its registries.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// A plugin with this id is already present in the plugin table.
    #[error("Plugin '{0}' is already loaded")]
    DuplicateId(String),

    /// A required dependency is absent or not yet activated.
    #[error("Plugin '{plugin_id}' requires '{dependency}', which is not activated")]
    DependencyMissing {
        /// Plugin being loaded.
        plugin_id: String,
        /// Missing dependency id.
        dependency: String,
    },

    /// Two mutually exclusive plugins would coexist.
    #[error("Plugin '{plugin_id}' conflicts with loaded plugin '{other}'")]
    Conflict {
        /// Plugin being loaded.
        plugin_id: String,
        /// The already loaded plugin it conflicts with.
        other: String,
    },

    /// Reducer or middleware registration attempted before a store was bound.
    #[error("No state store is bound to the plugin manager")]
    StoreUnavailable,

    /// A named asset is already registered.
    #[error("{kind} '{name}' is already registered")]
    AlreadyRegistered {
        /// Asset kind.
        kind: RegistrationKind,
        /// Asset name.
        name: String,
    },

    /// A service declares a dependency that is not registered.
    #[error("Service '{service}' depends on '{dependency}', which is not registered")]
    DependencyNotFound {
        /// Service being resolved.
        service: String,
        /// Missing dependency name.
        dependency: String,
    },

    /// The requested service is not registered.
    #[error("Service '{0}' is not registered")]
    ServiceNotFound(String),

    /// The plugin manifest failed validation.
    #[error("Invalid manifest for plugin '{plugin_id}': {reason}")]
    InvalidManifest {
        /// Offending plugin id.
        plugin_id: String,
        /// Validation failure.
        reason: String,
    },

    /// The plugin configuration does not satisfy its schema.
    #[error("Invalid configuration for plugin '{plugin_id}': {reason}")]
    InvalidConfig {
        /// Offending plugin id.
        plugin_id: String,
        /// Validation failure.
        reason: String,
    },

    /// The configuration source could not load or persist a value.
    #[error("Configuration storage failed for plugin '{plugin_id}': {source}")]
    ConfigStorage {
        /// Plugin whose configuration was accessed.
        plugin_id: String,
        /// Underlying failure.
        #[source]
        source: AppError,
    },

    /// A plugin lifecycle callback failed.
    #[error("Plugin '{plugin_id}' failed during {phase}: {source}")]
    Lifecycle {
        /// Failing plugin.
        plugin_id: String,
        /// Phase that failed.
        phase: LifecyclePhase,
        /// Error returned by the plugin.
        #[source]
        source: AppError,
    },
}

impl PluginError {
    /// Maps the error to the application-wide error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateId(_) | Self::Conflict { .. } | Self::AlreadyRegistered { .. } => {
                ErrorKind::Conflict
            }
            Self::DependencyMissing { .. }
            | Self::DependencyNotFound { .. }
            | Self::ServiceNotFound(_) => ErrorKind::NotFound,
            Self::StoreUnavailable => ErrorKind::ServiceUnavailable,
            Self::InvalidManifest { .. } | Self::InvalidConfig { .. } => ErrorKind::Validation,
            Self::ConfigStorage { .. } => ErrorKind::Configuration,
            Self::Lifecycle { .. } => ErrorKind::Plugin,
        }
    }
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        let kind = err.kind();
        AppError::with_source(kind, err.to_string(), err)
    }
}

/// Result alias for plugin system operations.
pub type PluginResult<T> = Result<T, PluginError>;
