//! # feedhub-plugin-sdk
//!
//! SDK for developing FeedHub plugins.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feedhub_plugin_sdk::prelude::*;
//!
//! pub fn definition() -> PluginDefinition {
//!     PluginBuilder::new("bookmarks", "Bookmarks", "1.0.0")
//!         .depends_on("posts")
//!         .extension("post.actions", 70, |props| {
//!             Ok(json!({ "type": "button", "label": "Save", "post_id": props["post_id"] }))
//!         })
//!         .on_activate(|ctx| async move {
//!             ctx.emit_event("bookmarks:ready", json!({})).await;
//!             Ok(())
//!         })
//!         .build()
//! }
//! ```

pub mod builder;
pub mod lifecycle;
pub mod macros;

#[doc(hidden)]
pub use serde_json;

/// Prelude for convenient imports.
pub mod prelude {
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};

    pub use feedhub_core::error::AppError;
    pub use feedhub_core::result::AppResult;
    pub use feedhub_plugin::api::context::PluginContext;
    pub use feedhub_plugin::components::{Component, ComponentHandle};
    pub use feedhub_plugin::config::schema::{ConfigSchema, ConfigType};
    pub use feedhub_plugin::definition::{PluginDefinition, PluginLifecycle};
    pub use feedhub_plugin::events::bus::AppEvent;
    pub use feedhub_plugin::extensions::registry::ExtensionOptions;
    pub use feedhub_plugin::manifest::PluginManifest;
    pub use feedhub_plugin::services::registry::{ServiceOptions, ServiceProvider};
    pub use feedhub_plugin::store::action::Action;
    pub use feedhub_plugin::store::middleware::MiddlewareAction;
    pub use feedhub_plugin::traits::{FnComponent, FnMiddleware, FnReducer};

    pub use crate::builder::PluginBuilder;
    pub use crate::lifecycle::ClosureLifecycle;

    pub use crate::{action, plugin_manifest};
}
