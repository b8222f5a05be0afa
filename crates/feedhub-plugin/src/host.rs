//! Registries shared by the manager and every plugin context.

use std::sync::Arc;

use crate::components::ComponentRegistry;
use crate::config::PluginConfigs;
use crate::config::source::{ConfigSource, MemoryConfigSource};
use crate::events::bus::EventBus;
use crate::extensions::registry::ExtensionRegistry;
use crate::services::registry::ServiceRegistry;

/// The registries owned by one plugin manager.
#[derive(Debug, Clone)]
pub struct HostRegistries {
    /// Extension point contributions.
    pub extensions: Arc<ExtensionRegistry>,
    /// Shared services.
    pub services: Arc<ServiceRegistry>,
    /// Named components and screens.
    pub components: Arc<ComponentRegistry>,
    /// Cross-plugin events.
    pub events: Arc<EventBus>,
    /// Per-plugin configuration.
    pub configs: Arc<PluginConfigs>,
}

impl HostRegistries {
    /// Creates empty registries with persisted configuration from `source`.
    pub fn new(source: Arc<dyn ConfigSource>, history_size: usize) -> Self {
        Self {
            extensions: Arc::new(ExtensionRegistry::new()),
            services: Arc::new(ServiceRegistry::new()),
            components: Arc::new(ComponentRegistry::new()),
            events: Arc::new(EventBus::with_history(history_size)),
            configs: Arc::new(PluginConfigs::new(source)),
        }
    }

    /// Creates empty registries backed by in-memory configuration.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfigSource::new()), 100)
    }
}

impl Default for HostRegistries {
    fn default() -> Self {
        Self::in_memory()
    }
}
