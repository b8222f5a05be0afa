//! Renderable contributions and the registry of named components and screens.
//!
//! The plugin system never interprets what a component renders. A component
//! turns props into a host-agnostic view description (`serde_json::Value`)
//! that the host's UI layer resolves.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use feedhub_core::result::AppResult;

use crate::error::{PluginError, PluginResult, RegistrationKind};

/// A renderable contribution.
pub trait Component: Send + Sync + std::fmt::Debug {
    /// Renders the component for the given props.
    fn render(&self, props: &Value) -> AppResult<Value>;
}

/// Opaque handle to a renderable contribution.
pub type ComponentHandle = Arc<dyn Component>;

/// Whether a named renderable is a component or a full screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// A reusable component.
    Component,
    /// A navigable screen.
    Screen,
}

impl ComponentKind {
    fn registration_kind(self) -> RegistrationKind {
        match self {
            Self::Component => RegistrationKind::Component,
            Self::Screen => RegistrationKind::Screen,
        }
    }
}

/// Metadata about a registered component or screen.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    /// Registered name.
    pub name: String,
    /// Component or screen.
    pub kind: ComponentKind,
    /// Owning plugin.
    pub plugin_id: String,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

/// Entry in the component registry.
#[derive(Debug, Clone)]
struct ComponentEntry {
    /// The renderable.
    component: ComponentHandle,
    /// Plugin that registered it.
    plugin_id: String,
    /// Registration time.
    registered_at: DateTime<Utc>,
}

/// Registry of named components and screens.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// (kind, name) → entry.
    entries: RwLock<HashMap<(ComponentKind, String), ComponentEntry>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named component or screen.
    pub async fn register(
        &self,
        kind: ComponentKind,
        name: &str,
        component: ComponentHandle,
        plugin_id: &str,
    ) -> PluginResult<()> {
        let mut entries = self.entries.write().await;
        let key = (kind, name.to_string());

        if entries.contains_key(&key) {
            return Err(PluginError::AlreadyRegistered {
                kind: kind.registration_kind(),
                name: name.to_string(),
            });
        }

        entries.insert(
            key,
            ComponentEntry {
                component,
                plugin_id: plugin_id.to_string(),
                registered_at: Utc::now(),
            },
        );

        info!(
            kind = ?kind,
            name = %name,
            plugin_id = %plugin_id,
            "Component registered"
        );
        Ok(())
    }

    /// Removes a named component or screen.
    pub async fn unregister(&self, kind: ComponentKind, name: &str) -> bool {
        self.entries
            .write()
            .await
            .remove(&(kind, name.to_string()))
            .is_some()
    }

    /// Looks up a named component or screen.
    pub async fn get(&self, kind: ComponentKind, name: &str) -> Option<ComponentHandle> {
        self.entries
            .read()
            .await
            .get(&(kind, name.to_string()))
            .map(|entry| entry.component.clone())
    }

    /// Lists registered components or screens, sorted by name.
    pub async fn list(&self, kind: ComponentKind) -> Vec<ComponentInfo> {
        let entries = self.entries.read().await;
        let mut infos: Vec<ComponentInfo> = entries
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((k, name), entry)| ComponentInfo {
                name: name.clone(),
                kind: *k,
                plugin_id: entry.plugin_id.clone(),
                registered_at: entry.registered_at,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}
