//! Plugin definitions: a manifest, the assets the plugin contributes and its
//! lifecycle callbacks.

use std::sync::Arc;

use async_trait::async_trait;

use feedhub_core::result::AppResult;

use crate::api::context::PluginContext;
use crate::components::ComponentHandle;
use crate::extensions::registry::ExtensionOptions;
use crate::manifest::PluginManifest;
use crate::services::registry::{ServiceOptions, ServiceProvider};
use crate::store::middleware::Middleware;
use crate::store::reducer::Reducer;

/// Lifecycle callbacks of a plugin.
///
/// Every callback receives the plugin's capability object. All default to
/// doing nothing.
#[async_trait]
pub trait PluginLifecycle: Send + Sync + std::fmt::Debug {
    /// Called once before activation.
    async fn install(&self, _ctx: &PluginContext) -> AppResult<()> {
        Ok(())
    }

    /// Called after `install`; declared assets are registered right after.
    async fn activate(&self, _ctx: &PluginContext) -> AppResult<()> {
        Ok(())
    }

    /// Called on unload while the plugin is activated.
    async fn deactivate(&self, _ctx: &PluginContext) -> AppResult<()> {
        Ok(())
    }

    /// Called on unload if `install` had completed.
    async fn uninstall(&self, _ctx: &PluginContext) -> AppResult<()> {
        Ok(())
    }
}

/// Lifecycle that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLifecycle;

#[async_trait]
impl PluginLifecycle for NoopLifecycle {}

/// A service the plugin contributes.
#[derive(Debug, Clone)]
pub struct ServiceDeclaration {
    /// Service name.
    pub name: String,
    /// Instance or factory.
    pub provider: ServiceProvider,
    /// Registration options.
    pub options: ServiceOptions,
}

/// A contribution to an extension point.
#[derive(Debug, Clone)]
pub struct ExtensionDeclaration {
    /// Extension point name.
    pub point: String,
    /// What to render.
    pub component: ComponentHandle,
    /// Priority and metadata.
    pub options: ExtensionOptions,
}

/// Everything the manager needs to load a plugin.
#[derive(Debug, Clone)]
pub struct PluginDefinition {
    /// Identity and declarations.
    pub manifest: PluginManifest,
    /// Named components.
    pub components: Vec<(String, ComponentHandle)>,
    /// Named screens.
    pub screens: Vec<(String, ComponentHandle)>,
    /// Extension point contributions.
    pub extensions: Vec<ExtensionDeclaration>,
    /// Named reducers.
    pub reducers: Vec<(String, Arc<dyn Reducer>)>,
    /// Middleware.
    pub middleware: Vec<Arc<dyn Middleware>>,
    /// Services.
    pub services: Vec<ServiceDeclaration>,
    /// Lifecycle callbacks.
    pub lifecycle: Arc<dyn PluginLifecycle>,
}

impl PluginDefinition {
    /// A definition with no assets and no-op callbacks.
    pub fn new(manifest: PluginManifest) -> Self {
        Self {
            manifest,
            components: Vec::new(),
            screens: Vec::new(),
            extensions: Vec::new(),
            reducers: Vec::new(),
            middleware: Vec::new(),
            services: Vec::new(),
            lifecycle: Arc::new(NoopLifecycle),
        }
    }

    /// Plugin id.
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    /// Sets the lifecycle callbacks.
    pub fn with_lifecycle(mut self, lifecycle: impl PluginLifecycle + 'static) -> Self {
        self.lifecycle = Arc::new(lifecycle);
        self
    }

    /// Adds a named component.
    pub fn with_component(mut self, name: impl Into<String>, component: ComponentHandle) -> Self {
        self.components.push((name.into(), component));
        self
    }

    /// Adds a named screen.
    pub fn with_screen(mut self, name: impl Into<String>, screen: ComponentHandle) -> Self {
        self.screens.push((name.into(), screen));
        self
    }

    /// Adds an extension point contribution.
    pub fn with_extension(
        mut self,
        point: impl Into<String>,
        component: ComponentHandle,
        options: ExtensionOptions,
    ) -> Self {
        self.extensions.push(ExtensionDeclaration {
            point: point.into(),
            component,
            options,
        });
        self
    }

    /// Adds a named reducer.
    pub fn with_reducer(mut self, name: impl Into<String>, reducer: Arc<dyn Reducer>) -> Self {
        self.reducers.push((name.into(), reducer));
        self
    }

    /// Adds middleware.
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Adds a service.
    pub fn with_service(
        mut self,
        name: impl Into<String>,
        provider: ServiceProvider,
        options: ServiceOptions,
    ) -> Self {
        self.services.push(ServiceDeclaration {
            name: name.into(),
            provider,
            options,
        });
        self
    }
}
