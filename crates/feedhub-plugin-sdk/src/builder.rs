//! Builder for assembling plugin definitions incrementally.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use feedhub_core::result::AppResult;
use feedhub_plugin::api::context::PluginContext;
use feedhub_plugin::components::ComponentHandle;
use feedhub_plugin::config::schema::ConfigSchema;
use feedhub_plugin::definition::{PluginDefinition, PluginLifecycle};
use feedhub_plugin::extensions::registry::ExtensionOptions;
use feedhub_plugin::manifest::PluginManifest;
use feedhub_plugin::services::registry::{ServiceOptions, ServiceProvider};
use feedhub_plugin::store::action::Action;
use feedhub_plugin::store::middleware::MiddlewareAction;
use feedhub_plugin::traits::{FnComponent, FnMiddleware, FnReducer};

use crate::lifecycle::ClosureLifecycle;

/// Builds a [`PluginDefinition`].
///
/// Closure callbacks set with `on_*` are combined into a
/// [`ClosureLifecycle`]. A lifecycle set with [`PluginBuilder::lifecycle`]
/// replaces them.
#[derive(Debug)]
pub struct PluginBuilder {
    /// Definition under construction.
    definition: PluginDefinition,
    /// Accumulated closure callbacks.
    callbacks: ClosureLifecycle,
    /// Explicit lifecycle, if any.
    lifecycle: Option<Arc<dyn PluginLifecycle>>,
}

impl PluginBuilder {
    /// Starts a plugin with the given identity.
    pub fn new(id: &str, name: &str, version: &str) -> Self {
        Self::from_manifest(PluginManifest::new(id, name, version))
    }

    /// Starts from an existing manifest.
    pub fn from_manifest(manifest: PluginManifest) -> Self {
        Self {
            definition: PluginDefinition::new(manifest),
            callbacks: ClosureLifecycle::new(),
            lifecycle: None,
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: &str) -> Self {
        self.definition.manifest.description = description.to_string();
        self
    }

    /// Sets the author.
    pub fn author(mut self, author: &str) -> Self {
        self.definition.manifest.author = author.to_string();
        self
    }

    /// Requires another plugin to be activated first.
    pub fn depends_on(mut self, plugin_id: &str) -> Self {
        self.definition.manifest.dependencies.push(plugin_id.to_string());
        self
    }

    /// Declares an optional peer plugin.
    pub fn peer(mut self, plugin_id: &str) -> Self {
        self.definition
            .manifest
            .peer_dependencies
            .push(plugin_id.to_string());
        self
    }

    /// Declares a plugin that must not be loaded alongside this one.
    pub fn conflicts_with(mut self, plugin_id: &str) -> Self {
        self.definition.manifest.conflicts.push(plugin_id.to_string());
        self
    }

    /// Sets the default configuration.
    pub fn default_config(mut self, config: Value) -> Self {
        self.definition.manifest.default_config = config;
        self
    }

    /// Sets the configuration schema.
    pub fn config_schema(mut self, schema: ConfigSchema) -> Self {
        self.definition.manifest.config_schema = Some(schema);
        self
    }

    /// Adds a named component rendered by a closure.
    pub fn component<F>(mut self, name: &str, render: F) -> Self
    where
        F: Fn(&Value) -> AppResult<Value> + Send + Sync + 'static,
    {
        self.definition = self
            .definition
            .with_component(name, Arc::new(FnComponent::new(name, render)));
        self
    }

    /// Adds a named screen rendered by a closure.
    pub fn screen<F>(mut self, name: &str, render: F) -> Self
    where
        F: Fn(&Value) -> AppResult<Value> + Send + Sync + 'static,
    {
        self.definition = self
            .definition
            .with_screen(name, Arc::new(FnComponent::new(name, render)));
        self
    }

    /// Contributes a closure-rendered component to an extension point.
    pub fn extension<F>(self, point: &str, priority: i32, render: F) -> Self
    where
        F: Fn(&Value) -> AppResult<Value> + Send + Sync + 'static,
    {
        self.extension_with(point, ExtensionOptions::with_priority(priority), render)
    }

    /// Contributes a closure-rendered component with full options.
    pub fn extension_with<F>(mut self, point: &str, options: ExtensionOptions, render: F) -> Self
    where
        F: Fn(&Value) -> AppResult<Value> + Send + Sync + 'static,
    {
        let name = format!("{}:{point}", self.definition.manifest.id);
        let component: ComponentHandle = Arc::new(FnComponent::new(name, render));
        self.definition = self.definition.with_extension(point, component, options);
        self
    }

    /// Adds a reducer closure for a state slice.
    pub fn reducer<F>(mut self, name: &str, reduce: F) -> Self
    where
        F: Fn(Option<&Value>, &Action) -> Value + Send + Sync + 'static,
    {
        self.definition = self
            .definition
            .with_reducer(name, Arc::new(FnReducer::new(reduce)));
        self
    }

    /// Adds a middleware closure.
    pub fn middleware<F>(mut self, handle: F) -> Self
    where
        F: Fn(&Value, &Action) -> MiddlewareAction + Send + Sync + 'static,
    {
        self.definition = self
            .definition
            .with_middleware(Arc::new(FnMiddleware::new(handle)));
        self
    }

    /// Adds a service.
    pub fn service(mut self, name: &str, provider: ServiceProvider, options: ServiceOptions) -> Self {
        self.definition = self.definition.with_service(name, provider, options);
        self
    }

    /// Sets the `install` callback.
    pub fn on_install<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.callbacks = self.callbacks.on_install(callback);
        self
    }

    /// Sets the `activate` callback.
    pub fn on_activate<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.callbacks = self.callbacks.on_activate(callback);
        self
    }

    /// Sets the `deactivate` callback.
    pub fn on_deactivate<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.callbacks = self.callbacks.on_deactivate(callback);
        self
    }

    /// Sets the `uninstall` callback.
    pub fn on_uninstall<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.callbacks = self.callbacks.on_uninstall(callback);
        self
    }

    /// Uses a hand-written lifecycle instead of closures.
    pub fn lifecycle(mut self, lifecycle: impl PluginLifecycle + 'static) -> Self {
        self.lifecycle = Some(Arc::new(lifecycle));
        self
    }

    /// Builds the final definition.
    pub fn build(self) -> PluginDefinition {
        let mut definition = self.definition;
        if let Some(lifecycle) = self.lifecycle {
            definition.lifecycle = lifecycle;
        } else if !self.callbacks.is_empty() {
            definition.lifecycle = Arc::new(self.callbacks);
        }

        debug!(
            plugin_id = %definition.manifest.id,
            components = definition.components.len(),
            extensions = definition.extensions.len(),
            services = definition.services.len(),
            "Plugin definition built"
        );
        definition
    }
}
