//! Closure-based lifecycle callbacks.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use feedhub_core::result::AppResult;
use feedhub_plugin::api::context::PluginContext;
use feedhub_plugin::definition::PluginLifecycle;

/// A lifecycle callback taking an owned context.
type Callback = Arc<dyn Fn(PluginContext) -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

/// Lifecycle built from optional closures, one per phase.
///
/// Closures receive an owned clone of the context so their futures can be
/// `'static`. Phases without a closure succeed immediately.
#[derive(Clone, Default)]
pub struct ClosureLifecycle {
    install: Option<Callback>,
    activate: Option<Callback>,
    deactivate: Option<Callback>,
    uninstall: Option<Callback>,
}

impl std::fmt::Debug for ClosureLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureLifecycle")
            .field("install", &self.install.is_some())
            .field("activate", &self.activate.is_some())
            .field("deactivate", &self.deactivate.is_some())
            .field("uninstall", &self.uninstall.is_some())
            .finish()
    }
}

fn wrap<F, Fut>(callback: F) -> Callback
where
    F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Arc::new(move |ctx| callback(ctx).boxed())
}

async fn run(callback: &Option<Callback>, ctx: &PluginContext) -> AppResult<()> {
    match callback {
        Some(callback) => callback(ctx.clone()).await,
        None => Ok(()),
    }
}

impl ClosureLifecycle {
    /// A lifecycle where every phase succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `install` callback.
    pub fn on_install<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.install = Some(wrap(callback));
        self
    }

    /// Sets the `activate` callback.
    pub fn on_activate<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.activate = Some(wrap(callback));
        self
    }

    /// Sets the `deactivate` callback.
    pub fn on_deactivate<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.deactivate = Some(wrap(callback));
        self
    }

    /// Sets the `uninstall` callback.
    pub fn on_uninstall<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.uninstall = Some(wrap(callback));
        self
    }

    /// Returns whether no callback is set.
    pub fn is_empty(&self) -> bool {
        self.install.is_none()
            && self.activate.is_none()
            && self.deactivate.is_none()
            && self.uninstall.is_none()
    }
}

#[async_trait]
impl PluginLifecycle for ClosureLifecycle {
    async fn install(&self, ctx: &PluginContext) -> AppResult<()> {
        run(&self.install, ctx).await
    }

    async fn activate(&self, ctx: &PluginContext) -> AppResult<()> {
        run(&self.activate, ctx).await
    }

    async fn deactivate(&self, ctx: &PluginContext) -> AppResult<()> {
        run(&self.deactivate, ctx).await
    }

    async fn uninstall(&self, ctx: &PluginContext) -> AppResult<()> {
        run(&self.uninstall, ctx).await
    }
}
