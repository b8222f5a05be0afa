//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;
use feedhub_plugin::config::source::MemoryConfigSource;
use feedhub_plugin::definition::PluginDefinition;
use feedhub_plugin::error::PluginResult;
use feedhub_plugin::host::HostRegistries;
use feedhub_plugin::manager::{ManagerSummary, PluginManager};
use feedhub_plugin::store::Store;
use feedhub_plugin_sdk::builder::PluginBuilder;

/// A plugin manager with a bound store over in-memory registries.
pub struct TestHost {
    pub manager: PluginManager,
    pub store: Arc<Store>,
}

impl TestHost {
    /// Create a host with no persisted plugin configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryConfigSource::new())
    }

    /// Create a host whose configuration source holds the given values.
    pub fn with_config(source: MemoryConfigSource) -> Self {
        let store = Arc::new(Store::new());
        let registries = HostRegistries::new(Arc::new(source), 50);
        let manager = PluginManager::with_store(registries, Arc::clone(&store));
        Self { manager, store }
    }

    /// Load a plugin definition.
    pub async fn load(&self, definition: PluginDefinition) -> PluginResult<()> {
        self.manager.load_plugin(definition).await
    }

    /// Priorities at a point, in returned order.
    pub async fn priorities(&self, point: &str) -> Vec<i32> {
        self.manager
            .get_extensions(point)
            .await
            .iter()
            .map(|e| e.priority)
            .collect()
    }

    /// Contributing plugin ids at a point, in returned order.
    pub async fn contributors(&self, point: &str) -> Vec<String> {
        self.manager
            .get_extensions(point)
            .await
            .into_iter()
            .map(|e| e.plugin_id)
            .collect()
    }

    /// Snapshot of everything observable through the manager.
    pub async fn snapshot(&self) -> (ManagerSummary, Vec<String>, Value) {
        let ids = self
            .manager
            .get_loaded_plugins()
            .await
            .into_iter()
            .map(|p| format!("{}:{}", p.id, p.state))
            .collect();
        (self.manager.summary().await, ids, self.store.state().await)
    }
}

/// Start a plugin definition with a fixed version.
pub fn plugin(id: &str) -> PluginBuilder {
    PluginBuilder::new(id, id, "1.0.0")
}

/// Render closure producing a labelled view.
pub fn label(text: &'static str) -> impl Fn(&Value) -> AppResult<Value> + Send + Sync + 'static {
    move |_| Ok(json!({ "label": text }))
}

/// A plugin that registers an extension during `activate` and then fails.
pub fn failing_activate(id: &str, point: &'static str) -> PluginDefinition {
    plugin(id)
        .on_activate(move |ctx| async move {
            let component = Arc::new(feedhub_plugin::traits::FnComponent::new(
                "doomed",
                |_| Ok(json!({ "label": "doomed" })),
            ));
            ctx.register_extension(point, component, 10).await;
            Err(AppError::plugin("activation failed"))
        })
        .build()
}
