//! Plugin context: the capability object handed to every lifecycle callback.
//!
//! Everything a plugin registers goes through its context, which records the
//! registration in the plugin's ledger so the manager can sweep it on unload.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::components::{ComponentHandle, ComponentKind};
use crate::error::{PluginError, PluginResult};
use crate::events::bus::{AppEvent, SubscriptionId};
use crate::extensions::registry::ExtensionOptions;
use crate::host::HostRegistries;
use crate::registry::SharedLedger;
use crate::services::registry::{ServiceInstance, ServiceOptions, ServiceProvider};
use crate::store::Store;
use crate::store::middleware::{Middleware, MiddlewareId};
use crate::store::reducer::Reducer;

/// The manager's store binding, shared with every context.
pub type StoreSlot = Arc<RwLock<Option<Arc<Store>>>>;

/// Capabilities available to one plugin.
#[derive(Clone)]
pub struct PluginContext {
    /// Plugin this context acts for.
    plugin_id: String,
    /// Host registries.
    registries: HostRegistries,
    /// State container, if bound.
    store: StoreSlot,
    /// Registrations made through this context.
    ledger: SharedLedger,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin_id", &self.plugin_id)
            .finish()
    }
}

impl PluginContext {
    /// Creates a context for a plugin.
    pub(crate) fn new(
        plugin_id: &str,
        registries: HostRegistries,
        store: StoreSlot,
        ledger: SharedLedger,
    ) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            registries,
            store,
            ledger,
        }
    }

    /// The plugin this context acts for.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Registers a named component.
    pub async fn register_component(
        &self,
        name: &str,
        component: ComponentHandle,
    ) -> PluginResult<()> {
        self.registries
            .components
            .register(ComponentKind::Component, name, component, &self.plugin_id)
            .await?;
        self.ledger.lock().await.components.push(name.to_string());
        Ok(())
    }

    /// Registers a named screen.
    pub async fn register_screen(&self, name: &str, screen: ComponentHandle) -> PluginResult<()> {
        self.registries
            .components
            .register(ComponentKind::Screen, name, screen, &self.plugin_id)
            .await?;
        self.ledger.lock().await.screens.push(name.to_string());
        Ok(())
    }

    /// Contributes a component to an extension point. Returns the extension id.
    pub async fn register_extension(
        &self,
        point: &str,
        component: ComponentHandle,
        priority: i32,
    ) -> String {
        self.register_extension_with(point, component, ExtensionOptions::with_priority(priority))
            .await
    }

    /// Contributes a component to an extension point with full options.
    pub async fn register_extension_with(
        &self,
        point: &str,
        component: ComponentHandle,
        options: ExtensionOptions,
    ) -> String {
        let id = self
            .registries
            .extensions
            .register(&self.plugin_id, point, component, options)
            .await;
        self.ledger.lock().await.extensions.push(id.clone());
        id
    }

    /// Adds a state slice.
    pub async fn register_reducer(
        &self,
        name: &str,
        reducer: Arc<dyn Reducer>,
    ) -> PluginResult<()> {
        let store = self.get_store().await?;
        store.register_reducer(name, reducer, &self.plugin_id).await?;
        self.ledger.lock().await.reducers.push(name.to_string());
        Ok(())
    }

    /// Appends middleware to the dispatch chain.
    pub async fn register_middleware(
        &self,
        middleware: Arc<dyn Middleware>,
    ) -> PluginResult<MiddlewareId> {
        let store = self.get_store().await?;
        let id = store.add_middleware(middleware, Some(&self.plugin_id)).await;
        self.ledger.lock().await.middleware.push(id);
        Ok(id)
    }

    /// Registers a shared service.
    pub async fn register_service(
        &self,
        name: &str,
        provider: ServiceProvider,
        options: ServiceOptions,
    ) -> PluginResult<()> {
        self.registries
            .services
            .register(name, provider, &self.plugin_id, options)
            .await?;
        self.ledger.lock().await.services.push(name.to_string());
        Ok(())
    }

    /// Looks up a service by name.
    pub async fn get_service(&self, name: &str) -> Option<ServiceInstance> {
        self.registries.services.get(name).await
    }

    /// Looks up a service and downcasts it.
    pub async fn get_service_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.registries.services.get_as::<T>(name).await
    }

    /// Effective configuration of this plugin, or of another one.
    pub async fn get_plugin_config(&self, plugin_id: Option<&str>) -> Option<Value> {
        self.registries
            .configs
            .get(plugin_id.unwrap_or(self.plugin_id.as_str()))
            .await
    }

    /// Merges a patch into this plugin's configuration and persists it.
    pub async fn update_plugin_config(&self, patch: Value) -> PluginResult<Value> {
        self.registries
            .configs
            .update(&self.plugin_id, &patch)
            .await
    }

    /// Subscribes to an event. The subscription ends when the plugin unloads.
    pub async fn subscribe_to_event<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = self
            .registries
            .events
            .subscribe(event, Some(&self.plugin_id), handler)
            .await;
        self.ledger.lock().await.subscriptions.push(id);
        id
    }

    /// Ends a subscription early.
    pub async fn unsubscribe_from_event(&self, id: SubscriptionId) -> bool {
        self.ledger.lock().await.subscriptions.retain(|s| *s != id);
        self.registries.events.unsubscribe(id).await
    }

    /// Emits an event with this plugin as the source.
    pub async fn emit_event(&self, event: &str, data: Value) -> usize {
        debug!(plugin_id = %self.plugin_id, event = %event, "Plugin emitting event");
        self.registries
            .events
            .emit(event, data, &self.plugin_id)
            .await
    }

    /// The bound state container.
    pub async fn get_store(&self) -> PluginResult<Arc<Store>> {
        self.store
            .read()
            .await
            .clone()
            .ok_or(PluginError::StoreUnavailable)
    }
}
