//! Service registry: named, optionally singleton services shared between
//! plugins without direct code imports.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{PluginError, PluginResult, RegistrationKind};

/// A type-erased service instance.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Produces service instances on demand.
pub type ServiceFactory = Arc<dyn Fn() -> ServiceInstance + Send + Sync>;

/// How a service is provided.
#[derive(Clone)]
pub enum ServiceProvider {
    /// A ready instance, returned as is.
    Instance(ServiceInstance),
    /// A factory, invoked per lookup or once if the service is a singleton.
    Factory(ServiceFactory),
}

impl ServiceProvider {
    /// Wraps a concrete value.
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        Self::Instance(Arc::new(value))
    }

    /// Wraps a factory producing concrete values.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move || Arc::new(factory()) as ServiceInstance))
    }

    /// Returns whether this provider is a factory.
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_))
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(<service>)"),
            Self::Factory(_) => f.write_str("Factory(<closure>)"),
        }
    }
}

/// Registration options for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Cache the first factory result. Ignored for instance providers.
    pub singleton: bool,
    /// Names of services this one needs at resolution time.
    pub dependencies: Vec<String>,
    /// Free-form tags for discovery.
    pub tags: Vec<String>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            singleton: true,
            dependencies: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl ServiceOptions {
    /// Options for a factory invoked on every lookup.
    pub fn transient() -> Self {
        Self {
            singleton: false,
            ..Self::default()
        }
    }

    /// Declares a dependency.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Public metadata about a registered service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Owning plugin.
    pub plugin_id: String,
    /// Singleton flag.
    pub singleton: bool,
    /// Factory flag.
    pub factory: bool,
    /// Declared dependency names.
    pub dependencies: Vec<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

/// Entry in the service registry.
#[derive(Debug)]
struct ServiceEntry {
    /// How instances are obtained.
    provider: ServiceProvider,
    /// Registration options.
    options: ServiceOptions,
    /// Owning plugin.
    plugin_id: String,
    /// Cached factory result for singleton factories.
    cached: Option<ServiceInstance>,
    /// Registration time.
    registered_at: DateTime<Utc>,
}

impl ServiceEntry {
    fn info(&self, name: &str) -> ServiceInfo {
        ServiceInfo {
            name: name.to_string(),
            plugin_id: self.plugin_id.clone(),
            singleton: self.options.singleton,
            factory: self.provider.is_factory(),
            dependencies: self.options.dependencies.clone(),
            tags: self.options.tags.clone(),
            registered_at: self.registered_at,
        }
    }
}

/// Keyed store of service instances and factories.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    /// Service name → entry.
    services: RwLock<HashMap<String, ServiceEntry>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under a unique name.
    pub async fn register(
        &self,
        name: &str,
        provider: ServiceProvider,
        plugin_id: &str,
        options: ServiceOptions,
    ) -> PluginResult<()> {
        let mut services = self.services.write().await;

        if services.contains_key(name) {
            return Err(PluginError::AlreadyRegistered {
                kind: RegistrationKind::Service,
                name: name.to_string(),
            });
        }

        info!(
            service = %name,
            plugin_id = %plugin_id,
            factory = provider.is_factory(),
            singleton = options.singleton,
            "Service registered"
        );

        services.insert(
            name.to_string(),
            ServiceEntry {
                provider,
                options,
                plugin_id: plugin_id.to_string(),
                cached: None,
                registered_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Removes a service. Returns whether it was registered.
    pub async fn unregister(&self, name: &str) -> bool {
        let removed = self.services.write().await.remove(name).is_some();
        if removed {
            info!(service = %name, "Service unregistered");
        }
        removed
    }

    /// Resolves a service instance.
    ///
    /// Instance providers are returned directly. Transient factories run on
    /// every call; singleton factories run once and the result is cached.
    pub async fn get(&self, name: &str) -> Option<ServiceInstance> {
        let factory = {
            let services = self.services.read().await;
            let entry = services.get(name)?;
            match &entry.provider {
                ServiceProvider::Instance(instance) => return Some(instance.clone()),
                ServiceProvider::Factory(_) if entry.options.singleton => {
                    if let Some(cached) = &entry.cached {
                        return Some(cached.clone());
                    }
                    None
                }
                ServiceProvider::Factory(factory) => Some(factory.clone()),
            }
        };

        if let Some(factory) = factory {
            return Some(factory());
        }

        let mut services = self.services.write().await;
        let entry = services.get_mut(name)?;
        if let Some(cached) = &entry.cached {
            return Some(cached.clone());
        }
        let ServiceProvider::Factory(factory) = &entry.provider else {
            return None;
        };
        let instance = factory();
        entry.cached = Some(instance.clone());
        debug!(service = %name, "Singleton service instantiated");
        Some(instance)
    }

    /// Resolves a service and downcasts it to its concrete type.
    pub async fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).await?.downcast::<T>().ok()
    }

    /// Resolves every declared dependency of a service.
    pub async fn resolve_dependencies(
        &self,
        name: &str,
    ) -> PluginResult<HashMap<String, ServiceInstance>> {
        let dependencies = {
            let services = self.services.read().await;
            services
                .get(name)
                .map(|entry| entry.options.dependencies.clone())
                .ok_or_else(|| PluginError::ServiceNotFound(name.to_string()))?
        };

        let mut resolved = HashMap::with_capacity(dependencies.len());
        for dependency in dependencies {
            let instance =
                self.get(&dependency)
                    .await
                    .ok_or_else(|| PluginError::DependencyNotFound {
                        service: name.to_string(),
                        dependency: dependency.clone(),
                    })?;
            resolved.insert(dependency, instance);
        }
        Ok(resolved)
    }

    /// Returns whether a service is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.services.read().await.contains_key(name)
    }

    /// Metadata for one service.
    pub async fn info(&self, name: &str) -> Option<ServiceInfo> {
        self.services
            .read()
            .await
            .get(name)
            .map(|entry| entry.info(name))
    }

    /// Metadata for every service, sorted by name.
    pub async fn list(&self) -> Vec<ServiceInfo> {
        let services = self.services.read().await;
        let mut infos: Vec<ServiceInfo> = services
            .iter()
            .map(|(name, entry)| entry.info(name))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Metadata for services carrying a tag, sorted by name.
    pub async fn find_by_tag(&self, tag: &str) -> Vec<ServiceInfo> {
        self.list()
            .await
            .into_iter()
            .filter(|info| info.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Number of registered services.
    pub async fn count(&self) -> usize {
        self.services.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CommentService {
        max_depth: usize,
    }

    #[tokio::test]
    async fn test_instance_lookup_and_downcast() {
        let registry = ServiceRegistry::new();
        registry
            .register(
                "comments",
                ServiceProvider::instance(CommentService { max_depth: 3 }),
                "comments",
                ServiceOptions::default(),
            )
            .await
            .unwrap();

        let service = registry.get_as::<CommentService>("comments").await.unwrap();
        assert_eq!(service.max_depth, 3);
        assert!(registry.get_as::<String>("comments").await.is_none());
        assert!(registry.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_until_unregistered() {
        let registry = ServiceRegistry::new();
        let register = || {
            registry.register(
                "feed",
                ServiceProvider::instance(1_u32),
                "posts",
                ServiceOptions::default(),
            )
        };

        register().await.unwrap();
        let err = register().await.unwrap_err();
        assert!(matches!(
            err,
            PluginError::AlreadyRegistered {
                kind: RegistrationKind::Service,
                ..
            }
        ));

        assert!(registry.unregister("feed").await);
        register().await.unwrap();
    }

    #[tokio::test]
    async fn test_factory_singleton_and_transient() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        registry
            .register(
                "cached",
                ServiceProvider::factory(move || c.fetch_add(1, Ordering::SeqCst)),
                "posts",
                ServiceOptions::default(),
            )
            .await
            .unwrap();
        let first = registry.get_as::<usize>("cached").await.unwrap();
        let second = registry.get_as::<usize>("cached").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let c = calls.clone();
        registry
            .register(
                "fresh",
                ServiceProvider::factory(move || c.fetch_add(1, Ordering::SeqCst)),
                "posts",
                ServiceOptions::transient(),
            )
            .await
            .unwrap();
        let a = registry.get_as::<usize>("fresh").await.unwrap();
        let b = registry.get_as::<usize>("fresh").await.unwrap();
        assert_eq!((*a, *b), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let info = registry.info("fresh").await.unwrap();
        assert!(info.factory);
        assert!(!info.singleton);
    }

    #[tokio::test]
    async fn test_resolve_dependencies() {
        let registry = ServiceRegistry::new();
        registry
            .register(
                "comments",
                ServiceProvider::instance(CommentService { max_depth: 2 }),
                "comments",
                ServiceOptions::default()
                    .depends_on("posts")
                    .with_tag("social"),
            )
            .await
            .unwrap();

        let err = registry.resolve_dependencies("comments").await.unwrap_err();
        assert!(matches!(
            err,
            PluginError::DependencyNotFound { ref dependency, .. } if dependency == "posts"
        ));
        assert!(matches!(
            registry.resolve_dependencies("missing").await,
            Err(PluginError::ServiceNotFound(_))
        ));

        registry
            .register(
                "posts",
                ServiceProvider::instance("feed".to_string()),
                "posts",
                ServiceOptions::default(),
            )
            .await
            .unwrap();
        let resolved = registry.resolve_dependencies("comments").await.unwrap();
        assert!(resolved.contains_key("posts"));
        assert_eq!(registry.find_by_tag("social").await.len(), 1);
        assert_eq!(registry.count().await, 2);
    }
}
