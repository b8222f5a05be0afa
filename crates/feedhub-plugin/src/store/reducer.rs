//! Slice reducers and the combined root reducer.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::action::Action;

/// Computes the next state of one slice.
///
/// `state` is `None` the first time a slice is reduced; the reducer must
/// then return the slice's initial state.
pub trait Reducer: Send + Sync + std::fmt::Debug {
    /// Reduces the slice state for an action.
    fn reduce(&self, state: Option<&Value>, action: &Action) -> Value;
}

/// Root reducer composed from a snapshot of the slice table.
///
/// It is rebuilt on every registration change and never mutated.
#[derive(Debug, Default)]
pub struct CombinedReducer {
    /// Slice name → reducer, iterated in name order.
    slices: BTreeMap<String, Arc<dyn Reducer>>,
}

impl CombinedReducer {
    /// Composes a root reducer from slice reducers.
    pub fn new(slices: BTreeMap<String, Arc<dyn Reducer>>) -> Self {
        Self { slices }
    }

    /// Reduces every slice. Keys without a reducer are dropped.
    pub fn reduce(&self, state: &Map<String, Value>, action: &Action) -> Map<String, Value> {
        self.slices
            .iter()
            .map(|(name, reducer)| (name.clone(), reducer.reduce(state.get(name), action)))
            .collect()
    }

    /// Slice names, sorted.
    pub fn slice_names(&self) -> Vec<String> {
        self.slices.keys().cloned().collect()
    }

    /// Returns whether a slice is present.
    pub fn contains(&self, name: &str) -> bool {
        self.slices.contains_key(name)
    }
}
