//! Cross-plugin events.

pub mod bus;

pub use bus::{AppEvent, EventBus, EventHandler, SubscriptionId, WILDCARD};

/// Emitted by the manager after a plugin reaches `activated`.
pub const PLUGIN_ACTIVATED: &str = "plugin:activated";
/// Emitted by the manager when a plugin enters the `error` state.
pub const PLUGIN_ERROR: &str = "plugin:error";
/// Emitted by the manager after a plugin is unloaded.
pub const PLUGIN_UNLOADED: &str = "plugin:unloaded";
