//! Extension point renderer: resolves the contributions for a point and
//! renders each in priority order.
//!
//! A contribution that fails, by returning an error or by panicking, is
//! recorded and logged; the remaining contributions still render.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use super::registry::{ExtensionFilter, ExtensionRegistry};

/// What the caller wants rendered at a point.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Which contributions to include.
    pub filter: ExtensionFilter,
    /// Props passed to every contribution.
    pub props: Value,
    /// Rendered instead when no contribution produced output.
    pub fallback: Option<Value>,
}

impl RenderRequest {
    /// A request with props and no filter.
    pub fn new(props: Value) -> Self {
        Self {
            props,
            ..Self::default()
        }
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: ExtensionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the fallback.
    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// One successfully rendered contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedExtension {
    /// Extension id.
    pub extension_id: String,
    /// Contributing plugin.
    pub plugin_id: String,
    /// Contribution priority.
    pub priority: i32,
    /// Rendered view.
    pub output: Value,
}

/// One contribution that failed to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFailure {
    /// Extension id.
    pub extension_id: String,
    /// Contributing plugin.
    pub plugin_id: String,
    /// Error or panic message.
    pub message: String,
    /// Whether the contribution panicked.
    pub panicked: bool,
}

/// Everything rendered at a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    /// Extension point name.
    pub point: String,
    /// Rendered contributions, highest priority first.
    pub rendered: Vec<RenderedExtension>,
    /// Contributions that failed.
    pub failures: Vec<RenderFailure>,
    /// The caller's fallback, present only when no contribution matched.
    pub fallback: Option<Value>,
}

impl RenderOutput {
    /// Returns whether nothing at all is shown.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.fallback.is_none()
    }

    /// The rendered views in display order, or the fallback when no
    /// contribution matched. Failed contributions leave no view.
    pub fn views(&self) -> Vec<Value> {
        match &self.fallback {
            Some(fallback) => vec![fallback.clone()],
            None => self.rendered.iter().map(|r| r.output.clone()).collect(),
        }
    }
}

/// Renders extension points against a registry.
#[derive(Debug, Clone)]
pub struct ExtensionPointRenderer {
    /// Source of contributions.
    registry: Arc<ExtensionRegistry>,
}

impl ExtensionPointRenderer {
    /// Creates a renderer over a registry.
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        Self { registry }
    }

    /// Renders every matching contribution of a point.
    pub async fn render(&self, point: &str, request: &RenderRequest) -> RenderOutput {
        let registrations = self.registry.get_filtered(point, &request.filter).await;

        debug!(
            point = %point,
            contributions = registrations.len(),
            "Rendering extension point"
        );

        let none_matched = registrations.is_empty();
        let mut rendered = Vec::with_capacity(registrations.len());
        let mut failures = Vec::new();

        for registration in registrations {
            let component = registration.component.clone();
            let result = catch_unwind(AssertUnwindSafe(|| component.render(&request.props)));

            match result {
                Ok(Ok(output)) => rendered.push(RenderedExtension {
                    extension_id: registration.id,
                    plugin_id: registration.plugin_id,
                    priority: registration.priority,
                    output,
                }),
                Ok(Err(e)) => {
                    error!(
                        point = %point,
                        plugin_id = %registration.plugin_id,
                        extension_id = %registration.id,
                        error = %e,
                        "Extension failed to render"
                    );
                    failures.push(RenderFailure {
                        extension_id: registration.id,
                        plugin_id: registration.plugin_id,
                        message: e.to_string(),
                        panicked: false,
                    });
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(
                        point = %point,
                        plugin_id = %registration.plugin_id,
                        extension_id = %registration.id,
                        panic = %message,
                        "Extension panicked while rendering"
                    );
                    failures.push(RenderFailure {
                        extension_id: registration.id,
                        plugin_id: registration.plugin_id,
                        message,
                        panicked: true,
                    });
                }
            }
        }

        let fallback = if none_matched {
            request.fallback.clone()
        } else {
            None
        };

        RenderOutput {
            point: point.to_string(),
            rendered,
            failures,
            fallback,
        }
    }

    /// Returns the registry being rendered.
    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
