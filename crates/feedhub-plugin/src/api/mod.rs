//! Plugin API: the capability object exposed to plugin code.

pub mod context;

pub use context::{PluginContext, StoreSlot};
