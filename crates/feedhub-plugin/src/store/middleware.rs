//! Dispatch middleware with Continue/Replace/Halt semantics.
//!
//! Middleware run in registration order before any reducer sees the action:
//! - `Continue` passes the current action on unchanged.
//! - `Replace` passes a different action to the rest of the chain.
//! - `Halt` drops the action; reducers do not run.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::action::Action;

/// Identifier returned when middleware is added to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MiddlewareId(pub u64);

impl fmt::Display for MiddlewareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mw-{}", self.0)
    }
}

/// What a middleware decided to do with an action.
#[derive(Debug, Clone, PartialEq)]
pub enum MiddlewareAction {
    /// Pass the action on unchanged.
    Continue,
    /// Pass a replacement action on.
    Replace(Action),
    /// Stop the dispatch.
    Halt {
        /// Why the action was dropped.
        reason: String,
    },
}

/// Intercepts actions before they reach the reducers.
pub trait Middleware: Send + Sync + std::fmt::Debug {
    /// Inspects the action against the current root state.
    fn handle(&self, state: &Value, action: &Action) -> MiddlewareAction;
}

/// Entry in the middleware chain.
#[derive(Debug, Clone)]
pub(crate) struct MiddlewareEntry {
    /// Chain identifier.
    pub(crate) id: MiddlewareId,
    /// Plugin that added it, `None` for host middleware.
    pub(crate) owner: Option<String>,
    /// The middleware.
    pub(crate) middleware: Arc<dyn Middleware>,
}
