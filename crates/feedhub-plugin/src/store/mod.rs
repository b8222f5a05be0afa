//! State integration layer.
//!
//! The store keeps the application's root state as a map of named slices.
//! Each slice has exactly one reducer; plugins add and remove slices at
//! runtime, and every change installs a freshly composed root reducer before
//! the next action is dispatched. Middleware form an append-only chain.

pub mod action;
pub mod middleware;
pub mod reducer;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{PluginError, PluginResult, RegistrationKind};

use self::action::{Action, INIT_ACTION, REPLACE_ACTION};
use self::middleware::{Middleware, MiddlewareAction, MiddlewareEntry, MiddlewareId};
use self::reducer::{CombinedReducer, Reducer};

/// A slice reducer and its owner.
#[derive(Debug, Clone)]
struct SliceReducer {
    /// The reducer.
    reducer: Arc<dyn Reducer>,
    /// Owning plugin, `None` for base reducers supplied by the host.
    owner: Option<String>,
}

/// Slice table plus the root reducer composed from it.
#[derive(Debug, Default)]
struct ReducerTable {
    /// Slice name → reducer.
    slices: BTreeMap<String, SliceReducer>,
    /// Root reducer for the current slice table.
    combined: Arc<CombinedReducer>,
}

impl ReducerTable {
    fn rebuild(&mut self) {
        let slices = self
            .slices
            .iter()
            .map(|(name, slice)| (name.clone(), slice.reducer.clone()))
            .collect();
        self.combined = Arc::new(CombinedReducer::new(slices));
    }
}

/// Result of dispatching an action.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Reducers ran with the (possibly replaced) action.
    Applied {
        /// The action the reducers saw.
        action: Action,
    },
    /// A middleware halted the dispatch.
    Halted {
        /// Middleware that halted.
        middleware: MiddlewareId,
        /// Halt reason.
        reason: String,
    },
}

/// Central state container shared by the host and plugins.
#[derive(Debug)]
pub struct Store {
    /// Root state: slice name → slice state.
    state: RwLock<Map<String, Value>>,
    /// Slice reducers and the composed root reducer.
    reducers: RwLock<ReducerTable>,
    /// Middleware chain in insertion order.
    middleware: RwLock<Vec<MiddlewareEntry>>,
    /// Next middleware identifier.
    next_middleware_id: AtomicU64,
}

impl Store {
    /// Creates a store with no slices.
    pub fn new() -> Self {
        Self::with_reducers(Vec::new())
    }

    /// Creates a store from the host's base reducers and seeds their state.
    pub fn with_reducers(base: Vec<(String, Arc<dyn Reducer>)>) -> Self {
        let mut table = ReducerTable::default();
        for (name, reducer) in base {
            table.slices.insert(
                name,
                SliceReducer {
                    reducer,
                    owner: None,
                },
            );
        }
        table.rebuild();

        let state = table
            .combined
            .reduce(&Map::new(), &Action::new(INIT_ACTION));

        Self {
            state: RwLock::new(state),
            reducers: RwLock::new(table),
            middleware: RwLock::new(Vec::new()),
            next_middleware_id: AtomicU64::new(1),
        }
    }

    /// Adds a plugin slice and installs the recomposed root reducer.
    ///
    /// The new slice is seeded immediately, so it is live for the next
    /// dispatched action.
    pub async fn register_reducer(
        &self,
        name: &str,
        reducer: Arc<dyn Reducer>,
        owner: &str,
    ) -> PluginResult<()> {
        let mut reducers = self.reducers.write().await;

        if reducers.slices.contains_key(name) {
            return Err(PluginError::AlreadyRegistered {
                kind: RegistrationKind::Reducer,
                name: name.to_string(),
            });
        }

        reducers.slices.insert(
            name.to_string(),
            SliceReducer {
                reducer,
                owner: Some(owner.to_string()),
            },
        );
        reducers.rebuild();

        let combined = reducers.combined.clone();
        let mut state = self.state.write().await;
        let next = combined.reduce(&state, &Action::new(REPLACE_ACTION));
        *state = next;

        info!(slice = %name, plugin_id = %owner, "Reducer registered");
        Ok(())
    }

    /// Removes a plugin slice and drops its state.
    ///
    /// Base reducers cannot be removed; returns `false` for them and for
    /// unknown names.
    pub async fn unregister_reducer(&self, name: &str) -> bool {
        let mut reducers = self.reducers.write().await;

        match reducers.slices.get(name) {
            None => return false,
            Some(slice) if slice.owner.is_none() => {
                warn!(slice = %name, "Refusing to remove a base reducer");
                return false;
            }
            Some(_) => {}
        }

        reducers.slices.remove(name);
        reducers.rebuild();
        self.state.write().await.remove(name);

        info!(slice = %name, "Reducer unregistered");
        true
    }

    /// Appends middleware to the chain.
    pub async fn add_middleware(
        &self,
        middleware: Arc<dyn Middleware>,
        owner: Option<&str>,
    ) -> MiddlewareId {
        let id = MiddlewareId(self.next_middleware_id.fetch_add(1, Ordering::Relaxed));
        self.middleware.write().await.push(MiddlewareEntry {
            id,
            owner: owner.map(str::to_string),
            middleware,
        });

        debug!(middleware_id = %id, owner = ?owner, "Middleware added");
        id
    }

    /// Removes middleware from the chain.
    pub async fn remove_middleware(&self, id: MiddlewareId) -> bool {
        let mut chain = self.middleware.write().await;
        let before = chain.len();
        chain.retain(|entry| entry.id != id);
        before != chain.len()
    }

    /// Runs an action through the middleware chain and the root reducer.
    pub async fn dispatch(&self, action: Action) -> DispatchOutcome {
        let chain = self.middleware.read().await.clone();
        let mut action = action;

        if !chain.is_empty() {
            let snapshot = Value::Object(self.state.read().await.clone());
            for entry in &chain {
                match entry.middleware.handle(&snapshot, &action) {
                    MiddlewareAction::Continue => {}
                    MiddlewareAction::Replace(next) => {
                        debug!(
                            middleware_id = %entry.id,
                            from = %action.kind,
                            to = %next.kind,
                            "Middleware replaced action"
                        );
                        action = next;
                    }
                    MiddlewareAction::Halt { reason } => {
                        info!(
                            middleware_id = %entry.id,
                            owner = ?entry.owner,
                            action = %action.kind,
                            reason = %reason,
                            "Middleware halted dispatch"
                        );
                        return DispatchOutcome::Halted {
                            middleware: entry.id,
                            reason,
                        };
                    }
                }
            }
        }

        let combined = self.reducers.read().await.combined.clone();
        let mut state = self.state.write().await;
        let next = combined.reduce(&state, &action);
        *state = next;

        DispatchOutcome::Applied { action }
    }

    /// Snapshot of the root state as a JSON object.
    pub async fn state(&self) -> Value {
        Value::Object(self.state.read().await.clone())
    }

    /// Snapshot of one slice.
    pub async fn slice(&self, name: &str) -> Option<Value> {
        self.state.read().await.get(name).cloned()
    }

    /// Names of all slices, sorted.
    pub async fn reducer_names(&self) -> Vec<String> {
        self.reducers.read().await.combined.slice_names()
    }

    /// Returns whether a slice exists.
    pub async fn has_reducer(&self, name: &str) -> bool {
        self.reducers.read().await.combined.contains(name)
    }

    /// Number of middleware in the chain.
    pub async fn middleware_count(&self) -> usize {
        self.middleware.read().await.len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
