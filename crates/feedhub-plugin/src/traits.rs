//! Closure-based adapters for the component, reducer and middleware traits.

use std::sync::Arc;

use serde_json::Value;

use feedhub_core::result::AppResult;

use crate::components::Component;
use crate::store::action::Action;
use crate::store::middleware::{Middleware, MiddlewareAction};
use crate::store::reducer::Reducer;

type RenderFn = dyn Fn(&Value) -> AppResult<Value> + Send + Sync;
type ReduceFn = dyn Fn(Option<&Value>, &Action) -> Value + Send + Sync;
type MiddlewareFn = dyn Fn(&Value, &Action) -> MiddlewareAction + Send + Sync;

/// A component backed by a render closure.
pub struct FnComponent {
    /// Name shown in diagnostics.
    name: String,
    /// Render function.
    render: Arc<RenderFn>,
}

impl std::fmt::Debug for FnComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnComponent")
            .field("name", &self.name)
            .field("render", &"<closure>")
            .finish()
    }
}

impl FnComponent {
    /// Creates a component from a render closure.
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Value) -> AppResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Component for FnComponent {
    fn render(&self, props: &Value) -> AppResult<Value> {
        (self.render)(props)
    }
}

/// A reducer backed by a closure.
pub struct FnReducer {
    /// Reduce function.
    reduce: Arc<ReduceFn>,
}

impl std::fmt::Debug for FnReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnReducer")
            .field("reduce", &"<closure>")
            .finish()
    }
}

impl FnReducer {
    /// Creates a reducer from a closure.
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(Option<&Value>, &Action) -> Value + Send + Sync + 'static,
    {
        Self {
            reduce: Arc::new(reduce),
        }
    }
}

impl Reducer for FnReducer {
    fn reduce(&self, state: Option<&Value>, action: &Action) -> Value {
        (self.reduce)(state, action)
    }
}

/// Middleware backed by a closure.
pub struct FnMiddleware {
    /// Handler function.
    handle: Arc<MiddlewareFn>,
}

impl std::fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("handle", &"<closure>")
            .finish()
    }
}

impl FnMiddleware {
    /// Creates middleware from a closure.
    pub fn new<F>(handle: F) -> Self
    where
        F: Fn(&Value, &Action) -> MiddlewareAction + Send + Sync + 'static,
    {
        Self {
            handle: Arc::new(handle),
        }
    }
}

impl Middleware for FnMiddleware {
    fn handle(&self, state: &Value, action: &Action) -> MiddlewareAction {
        (self.handle)(state, action)
    }
}
