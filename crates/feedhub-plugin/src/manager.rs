//! Plugin manager: lifecycle orchestration for all plugins.
//!
//! Loading validates the manifest, duplicate ids, dependencies, conflicts and
//! configuration before anything is mutated. A plugin then runs `install`,
//! `activate` and has its declared assets registered. Any failure after that
//! point leaves the entry in `error` with all of its registrations swept.
//!
//! Every load and unload holds the lifecycle guard, so transitions never
//! interleave. No registry lock is held while a plugin callback runs.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use feedhub_core::config::plugin::PluginSystemConfig;
use feedhub_core::error::AppError;

use crate::api::context::{PluginContext, StoreSlot};
use crate::components::ComponentKind;
use crate::definition::PluginDefinition;
use crate::error::{LifecyclePhase, PluginError, PluginResult};
use crate::events::{PLUGIN_ACTIVATED, PLUGIN_ERROR, PLUGIN_UNLOADED};
use crate::extensions::registry::ExtensionRegistration;
use crate::extensions::renderer::ExtensionPointRenderer;
use crate::host::HostRegistries;
use crate::registry::{LoadedPlugin, PluginEntry, PluginRegistry, PluginState, SharedLedger};
use crate::services::registry::{ServiceInfo, ServiceInstance};
use crate::store::Store;

/// Event source used for lifecycle events.
const MANAGER_SOURCE: &str = "plugin-manager";

/// Outcome of [`PluginManager::load_all`].
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Plugins that reached `activated`, in load order.
    pub loaded: Vec<String>,
    /// Plugins skipped because configuration disables them.
    pub skipped: Vec<String>,
    /// Plugins that failed to load.
    pub failed: Vec<(String, PluginError)>,
}

impl LoadReport {
    /// Returns whether every attempted plugin loaded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Counts describing the manager's current contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerSummary {
    /// Plugin entries in any state.
    pub plugins: usize,
    /// Entries in `activated`.
    pub activated: usize,
    /// Entries in `error`.
    pub errored: usize,
    /// Registered services.
    pub services: usize,
    /// Contributions across all extension points.
    pub extensions: usize,
    /// Extension points with at least one contribution.
    pub extension_points: Vec<String>,
    /// Whether a store is bound.
    pub store_bound: bool,
}

/// Manages the full lifecycle of plugins: load, activate, unload.
#[derive(Debug)]
pub struct PluginManager {
    /// Registries shared with plugin contexts.
    registries: HostRegistries,
    /// Plugin entries.
    plugins: Arc<PluginRegistry>,
    /// Bound state container.
    store: StoreSlot,
    /// Plugin system settings.
    settings: PluginSystemConfig,
    /// Serializes lifecycle transitions.
    lifecycle_guard: Mutex<()>,
}

impl PluginManager {
    /// Creates a manager over the given registries, with no store bound.
    pub fn new(registries: HostRegistries) -> Self {
        Self {
            registries,
            plugins: Arc::new(PluginRegistry::new()),
            store: Arc::new(RwLock::new(None)),
            settings: PluginSystemConfig::default(),
            lifecycle_guard: Mutex::new(()),
        }
    }

    /// Creates a manager bound to a store.
    pub fn with_store(registries: HostRegistries, store: Arc<Store>) -> Self {
        Self {
            store: Arc::new(RwLock::new(Some(store))),
            ..Self::new(registries)
        }
    }

    /// Applies plugin system settings.
    pub fn with_settings(mut self, settings: PluginSystemConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Binds the state container used for reducer and middleware registration.
    pub async fn bind_store(&self, store: Arc<Store>) {
        *self.store.write().await = Some(store);
        info!("State store bound to plugin manager");
    }

    /// Loads a plugin and drives it to `activated`.
    pub async fn load_plugin(&self, definition: PluginDefinition) -> PluginResult<()> {
        let _guard = self.lifecycle_guard.lock().await;
        self.load_locked(Arc::new(definition)).await
    }

    /// Loads plugins in order, honoring the disabled list.
    ///
    /// Stops at the first failure unless `continue_on_error` is set.
    pub async fn load_all(&self, definitions: Vec<PluginDefinition>) -> PluginResult<LoadReport> {
        let mut report = LoadReport::default();

        for definition in definitions {
            let plugin_id = definition.id().to_string();

            if self.settings.is_disabled(&plugin_id) {
                info!(plugin_id = %plugin_id, "Plugin disabled by configuration, skipping");
                report.skipped.push(plugin_id);
                continue;
            }

            match self.load_plugin(definition).await {
                Ok(()) => report.loaded.push(plugin_id),
                Err(e) if self.settings.continue_on_error => {
                    error!(plugin_id = %plugin_id, error = %e, "Plugin failed to load");
                    report.failed.push((plugin_id, e));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Plugin loading complete"
        );
        Ok(report)
    }

    /// Deactivates, uninstalls and removes a plugin. Unknown ids are a no-op.
    ///
    /// Callback failures never stop the teardown: registrations are swept
    /// and the entry is removed regardless. The first failure is returned
    /// afterwards.
    pub async fn unload_plugin(&self, plugin_id: &str) -> PluginResult<()> {
        let _guard = self.lifecycle_guard.lock().await;
        self.unload_locked(plugin_id).await
    }

    /// Unloads every plugin in reverse load order.
    pub async fn unload_all(&self) {
        let _guard = self.lifecycle_guard.lock().await;
        let entries = self.plugins.list().await;

        for entry in entries.iter().rev() {
            if let Err(e) = self.unload_locked(entry.id()).await {
                error!(plugin_id = %entry.id(), error = %e, "Error unloading plugin");
            }
        }

        info!("All plugins unloaded");
    }

    /// Unloads a plugin and loads its definition again.
    ///
    /// Returns `false` for unknown ids.
    pub async fn reload_plugin(&self, plugin_id: &str) -> PluginResult<bool> {
        let _guard = self.lifecycle_guard.lock().await;

        let Some(entry) = self.plugins.get(plugin_id).await else {
            return Ok(false);
        };

        if let Err(e) = self.unload_locked(plugin_id).await {
            warn!(plugin_id = %plugin_id, error = %e, "Teardown failed during reload");
        }
        self.load_locked(entry.definition).await?;

        info!(plugin_id = %plugin_id, "Plugin reloaded");
        Ok(true)
    }

    async fn load_locked(&self, definition: Arc<PluginDefinition>) -> PluginResult<()> {
        let manifest = &definition.manifest;
        let plugin_id = manifest.id.clone();

        manifest.check()?;
        self.validate(&definition).await?;
        let config = self.registries.configs.resolve(manifest).await?;

        let entry = self.plugins.insert(definition.clone()).await?;
        self.registries
            .configs
            .insert(&plugin_id, config, manifest.config_schema.clone())
            .await;

        let ctx = self.context_for(&entry);
        let lifecycle = definition.lifecycle.clone();

        if let Err(e) = lifecycle.install(&ctx).await {
            return Err(self.fail(&entry, LifecyclePhase::Install, e).await);
        }
        self.plugins
            .set_state(&plugin_id, PluginState::Installed)
            .await;
        debug!(plugin_id = %plugin_id, "Plugin installed");

        if let Err(e) = lifecycle.activate(&ctx).await {
            return Err(self.fail(&entry, LifecyclePhase::Activate, e).await);
        }

        if let Err(e) = register_assets(&ctx, &definition).await {
            return Err(self
                .fail(&entry, LifecyclePhase::RegisterAssets, e.into())
                .await);
        }

        self.plugins
            .set_state(&plugin_id, PluginState::Activated)
            .await;

        let registrations = entry.ledger.lock().await.len();
        info!(
            plugin_id = %plugin_id,
            name = %manifest.name,
            version = %manifest.version,
            registrations = registrations,
            "Plugin loaded and activated"
        );

        self.registries
            .events
            .emit(
                PLUGIN_ACTIVATED,
                json!({ "plugin_id": plugin_id, "version": manifest.version }),
                MANAGER_SOURCE,
            )
            .await;
        Ok(())
    }

    /// Checks duplicates, dependencies and conflicts without mutating anything.
    async fn validate(&self, definition: &PluginDefinition) -> PluginResult<()> {
        let manifest = &definition.manifest;
        let plugin_id = &manifest.id;

        if self.plugins.contains(plugin_id).await {
            return Err(PluginError::DuplicateId(plugin_id.clone()));
        }

        for dependency in &manifest.dependencies {
            if self.plugins.state(dependency).await != Some(PluginState::Activated) {
                return Err(PluginError::DependencyMissing {
                    plugin_id: plugin_id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        for other in &manifest.conflicts {
            if self.plugins.contains(other).await {
                return Err(PluginError::Conflict {
                    plugin_id: plugin_id.clone(),
                    other: other.clone(),
                });
            }
        }
        if let Some(other) = self.plugins.conflicting_with(plugin_id).await.into_iter().next() {
            return Err(PluginError::Conflict {
                plugin_id: plugin_id.clone(),
                other,
            });
        }

        for peer in &manifest.peer_dependencies {
            if self.plugins.state(peer).await != Some(PluginState::Activated) {
                debug!(plugin_id = %plugin_id, peer = %peer, "Optional peer plugin not active");
            }
        }

        Ok(())
    }

    /// Records a lifecycle failure: sweeps registrations and moves the entry
    /// to `error`.
    async fn fail(&self, entry: &PluginEntry, phase: LifecyclePhase, source: AppError) -> PluginError {
        let plugin_id = entry.id().to_string();
        let err = PluginError::Lifecycle {
            plugin_id: plugin_id.clone(),
            phase,
            source,
        };

        error!(plugin_id = %plugin_id, phase = %phase, error = %err, "Plugin lifecycle failed");

        let swept = self.sweep(&plugin_id, &entry.ledger).await;
        if swept > 0 {
            debug!(plugin_id = %plugin_id, swept = swept, "Registrations swept after failure");
        }
        self.plugins.set_error(&plugin_id, err.clone()).await;

        self.registries
            .events
            .emit(
                PLUGIN_ERROR,
                json!({
                    "plugin_id": plugin_id,
                    "phase": phase.to_string(),
                    "error": err.to_string(),
                }),
                MANAGER_SOURCE,
            )
            .await;
        err
    }

    async fn unload_locked(&self, plugin_id: &str) -> PluginResult<()> {
        let Some(entry) = self.plugins.get(plugin_id).await else {
            debug!(plugin_id = %plugin_id, "Unload requested for unknown plugin");
            return Ok(());
        };

        let dependents = self.plugins.dependents_of(plugin_id).await;
        if !dependents.is_empty() {
            warn!(
                plugin_id = %plugin_id,
                dependents = ?dependents,
                "Unloading a plugin that activated plugins depend on"
            );
        }

        let ctx = self.context_for(&entry);
        let lifecycle = entry.definition.lifecycle.clone();
        let mut first_error = None;

        if entry.state == PluginState::Activated {
            if let Err(e) = lifecycle.deactivate(&ctx).await {
                warn!(plugin_id = %plugin_id, error = %e, "Plugin deactivate returned error");
                first_error.get_or_insert(PluginError::Lifecycle {
                    plugin_id: plugin_id.to_string(),
                    phase: LifecyclePhase::Deactivate,
                    source: e,
                });
            }
        }

        if entry.installed {
            if let Err(e) = lifecycle.uninstall(&ctx).await {
                warn!(plugin_id = %plugin_id, error = %e, "Plugin uninstall returned error");
                first_error.get_or_insert(PluginError::Lifecycle {
                    plugin_id: plugin_id.to_string(),
                    phase: LifecyclePhase::Uninstall,
                    source: e,
                });
            }
        }

        let swept = self.sweep(plugin_id, &entry.ledger).await;
        self.plugins.remove(plugin_id).await;
        self.registries.configs.remove(plugin_id).await;

        info!(plugin_id = %plugin_id, swept = swept, "Plugin unloaded");

        self.registries
            .events
            .emit(PLUGIN_UNLOADED, json!({ "plugin_id": plugin_id }), MANAGER_SOURCE)
            .await;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Removes every registration recorded in a ledger. Returns how many
    /// were removed.
    async fn sweep(&self, plugin_id: &str, ledger: &SharedLedger) -> usize {
        let ledger = std::mem::take(&mut *ledger.lock().await);
        let store = self.store.read().await.clone();
        let mut removed = 0;

        for id in &ledger.extensions {
            removed += usize::from(self.registries.extensions.unregister(id).await);
        }
        let stray = self.registries.extensions.unregister_plugin(plugin_id).await;
        if stray > 0 {
            debug!(
                plugin_id = %plugin_id,
                stray = stray,
                "Swept extensions registered outside the plugin context"
            );
        }
        removed += stray;
        for id in &ledger.subscriptions {
            removed += usize::from(self.registries.events.unsubscribe(*id).await);
        }
        for name in &ledger.services {
            removed += usize::from(self.registries.services.unregister(name).await);
        }
        for name in &ledger.components {
            removed += usize::from(
                self.registries
                    .components
                    .unregister(ComponentKind::Component, name)
                    .await,
            );
        }
        for name in &ledger.screens {
            removed += usize::from(
                self.registries
                    .components
                    .unregister(ComponentKind::Screen, name)
                    .await,
            );
        }

        match store {
            Some(store) => {
                for id in &ledger.middleware {
                    removed += usize::from(store.remove_middleware(*id).await);
                }
                for name in &ledger.reducers {
                    removed += usize::from(store.unregister_reducer(name).await);
                }
            }
            None if !ledger.middleware.is_empty() || !ledger.reducers.is_empty() => {
                warn!(plugin_id = %plugin_id, "Store unbound, state registrations not swept");
            }
            None => {}
        }

        removed
    }

    fn context_for(&self, entry: &PluginEntry) -> PluginContext {
        PluginContext::new(
            entry.id(),
            self.registries.clone(),
            self.store.clone(),
            entry.ledger.clone(),
        )
    }

    /// Contributions for an extension point, highest priority first.
    pub async fn get_extensions(&self, point: &str) -> Vec<ExtensionRegistration> {
        self.registries.extensions.get(point).await
    }

    /// Looks up a service.
    pub async fn get_service(&self, name: &str) -> Option<ServiceInstance> {
        self.registries.services.get(name).await
    }

    /// Public view of a plugin entry.
    pub async fn get_plugin(&self, plugin_id: &str) -> Option<LoadedPlugin> {
        self.plugins.get(plugin_id).await.map(|e| e.summary())
    }

    /// Lifecycle state of a plugin.
    pub async fn get_plugin_state(&self, plugin_id: &str) -> Option<PluginState> {
        self.plugins.state(plugin_id).await
    }

    /// Most recent lifecycle failure of a plugin.
    pub async fn get_plugin_error(&self, plugin_id: &str) -> Option<PluginError> {
        self.plugins.get(plugin_id).await?.last_error
    }

    /// Every plugin entry in load order.
    pub async fn get_loaded_plugins(&self) -> Vec<LoadedPlugin> {
        self.plugins
            .list()
            .await
            .iter()
            .map(PluginEntry::summary)
            .collect()
    }

    /// Metadata for every registered service.
    pub async fn get_all_services(&self) -> Vec<ServiceInfo> {
        self.registries.services.list().await
    }

    /// Renderer over this manager's extension registry.
    pub fn renderer(&self) -> ExtensionPointRenderer {
        ExtensionPointRenderer::new(self.registries.extensions.clone())
    }

    /// The registries shared with plugin contexts.
    pub fn registries(&self) -> &HostRegistries {
        &self.registries
    }

    /// The bound store.
    pub async fn store(&self) -> Option<Arc<Store>> {
        self.store.read().await.clone()
    }

    /// Counts describing the manager's current contents.
    pub async fn summary(&self) -> ManagerSummary {
        let entries = self.plugins.list().await;
        let count_state =
            |state: PluginState| entries.iter().filter(|e| e.state == state).count();

        ManagerSummary {
            plugins: entries.len(),
            activated: count_state(PluginState::Activated),
            errored: count_state(PluginState::Error),
            services: self.registries.services.count().await,
            extensions: self.registries.extensions.total().await,
            extension_points: self.registries.extensions.points().await,
            store_bound: self.store.read().await.is_some(),
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new(HostRegistries::in_memory())
    }
}

/// Registers a definition's declared assets through its context.
async fn register_assets(ctx: &PluginContext, definition: &PluginDefinition) -> PluginResult<()> {
    for (name, component) in &definition.components {
        ctx.register_component(name, component.clone()).await?;
    }
    for (name, screen) in &definition.screens {
        ctx.register_screen(name, screen.clone()).await?;
    }
    for service in &definition.services {
        ctx.register_service(&service.name, service.provider.clone(), service.options.clone())
            .await?;
    }
    for (name, reducer) in &definition.reducers {
        ctx.register_reducer(name, reducer.clone()).await?;
    }
    for middleware in &definition.middleware {
        ctx.register_middleware(middleware.clone()).await?;
    }
    for extension in &definition.extensions {
        ctx.register_extension_with(
            &extension.point,
            extension.component.clone(),
            extension.options.clone(),
        )
        .await;
    }
    Ok(())
}
