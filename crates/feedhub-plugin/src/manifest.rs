//! Plugin manifest: identity, dependency declarations and configuration
//! defaults.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::config::schema::ConfigSchema;
use crate::error::{PluginError, PluginResult};

/// Semantic plugin version (`MAJOR.MINOR.PATCH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl PluginVersion {
    /// Creates a version from its components.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `"1.2.3"`. Pre-release and build suffixes are not accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Author-supplied, immutable plugin descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PluginManifest {
    /// Unique plugin identifier.
    #[validate(
        length(min = 1, max = 128, message = "Plugin id must be 1-128 characters"),
        custom(function = "validate_plugin_id")
    )]
    pub id: String,
    /// Human-readable plugin name.
    #[validate(length(min = 1, message = "Plugin name is required"))]
    pub name: String,
    /// Semantic version string.
    #[validate(custom(function = "validate_version"))]
    pub version: String,
    /// Plugin description.
    #[serde(default)]
    pub description: String,
    /// Author or maintainer.
    #[serde(default)]
    pub author: String,
    /// Plugin ids that must be activated before this one loads.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Plugin ids this one works alongside. Advisory only, never enforced.
    #[serde(default)]
    pub peer_dependencies: Vec<String>,
    /// Plugin ids that may not be loaded at the same time as this one.
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Default configuration object.
    #[serde(default = "empty_object")]
    pub default_config: Value,
    /// Optional schema the effective configuration must satisfy.
    #[serde(default)]
    pub config_schema: Option<ConfigSchema>,
}

impl PluginManifest {
    /// Creates a manifest with no declarations and an empty default config.
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            author: String::new(),
            dependencies: Vec::new(),
            peer_dependencies: Vec::new(),
            conflicts: Vec::new(),
            default_config: empty_object(),
            config_schema: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Declares a required dependency.
    pub fn depends_on(mut self, plugin_id: impl Into<String>) -> Self {
        self.dependencies.push(plugin_id.into());
        self
    }

    /// Declares an advisory peer dependency.
    pub fn with_peer(mut self, plugin_id: impl Into<String>) -> Self {
        self.peer_dependencies.push(plugin_id.into());
        self
    }

    /// Declares a conflicting plugin.
    pub fn conflicts_with(mut self, plugin_id: impl Into<String>) -> Self {
        self.conflicts.push(plugin_id.into());
        self
    }

    /// Sets the default configuration.
    pub fn with_default_config(mut self, config: Value) -> Self {
        self.default_config = config;
        self
    }

    /// Sets the configuration schema.
    pub fn with_config_schema(mut self, schema: ConfigSchema) -> Self {
        self.config_schema = Some(schema);
        self
    }

    /// Parsed version. Only `None` if the manifest was never validated.
    pub fn parsed_version(&self) -> Option<PluginVersion> {
        PluginVersion::parse(&self.version)
    }

    /// Validates field constraints and the consistency of the declarations.
    pub fn check(&self) -> PluginResult<()> {
        let invalid = |reason: String| PluginError::InvalidManifest {
            plugin_id: self.id.clone(),
            reason,
        };

        self.validate().map_err(|e| invalid(e.to_string()))?;

        let mut declared = self
            .dependencies
            .iter()
            .chain(&self.peer_dependencies)
            .chain(&self.conflicts);
        if declared.any(|id| id == &self.id) {
            return Err(invalid("a plugin cannot declare itself".to_string()));
        }

        if let Some(id) = self.dependencies.iter().find(|d| self.conflicts.contains(*d)) {
            return Err(invalid(format!(
                "'{id}' is declared as both a dependency and a conflict"
            )));
        }

        Ok(())
    }
}

/// Ids name per-plugin config files, so they are limited to `[a-z0-9._-]`
/// with no `..` segment.
fn validate_plugin_id(id: &str) -> Result<(), ValidationError> {
    let charset_ok = id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    if charset_ok && !id.contains("..") {
        Ok(())
    } else {
        Err(ValidationError::new("plugin_id")
            .with_message("Plugin id may only contain a-z, 0-9, '.', '_' and '-', and no '..'".into()))
    }
}

fn validate_version(version: &str) -> Result<(), ValidationError> {
    if PluginVersion::parse(version).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("semver")
            .with_message("Version must be MAJOR.MINOR.PATCH".into()))
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
