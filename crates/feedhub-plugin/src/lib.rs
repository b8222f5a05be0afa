//! # feedhub-plugin
//!
//! Plugin framework for FeedHub. Provides:
//!
//! - Plugin lifecycle management (install, activate, deactivate, uninstall)
//! - Extension registry with priority-ordered contributions per point
//! - Extension point renderer with per-contribution failure isolation
//! - Service registry with singleton and factory services
//! - State store with runtime reducer composition and a middleware chain
//! - Event bus for cross-plugin notification
//! - Per-plugin configuration with schema validation
//! - Plugin context, the capability object exposed to plugin code

pub mod api;
pub mod components;
pub mod config;
pub mod definition;
pub mod error;
pub mod events;
pub mod extensions;
pub mod host;
pub mod manager;
pub mod manifest;
pub mod registry;
pub mod services;
pub mod store;
pub mod traits;

pub use api::context::PluginContext;
pub use components::{Component, ComponentHandle, ComponentKind, ComponentRegistry};
pub use definition::{NoopLifecycle, PluginDefinition, PluginLifecycle};
pub use error::{LifecyclePhase, PluginError, PluginResult, RegistrationKind};
pub use events::EventBus;
pub use extensions::{ExtensionFilter, ExtensionOptions, ExtensionPointRenderer, ExtensionRegistry};
pub use host::HostRegistries;
pub use manager::{LoadReport, ManagerSummary, PluginManager};
pub use manifest::PluginManifest;
pub use registry::{LoadedPlugin, PluginState};
pub use services::{ServiceOptions, ServiceProvider, ServiceRegistry};
pub use store::{DispatchOutcome, Store};
