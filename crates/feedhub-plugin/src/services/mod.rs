//! Shared services exposed by plugins.

pub mod registry;

pub use registry::{
    ServiceFactory, ServiceInfo, ServiceInstance, ServiceOptions, ServiceProvider,
    ServiceRegistry,
};
