//! Integration tests for the service registry.

mod helpers;

use std::sync::Arc;

use feedhub_plugin::error::{PluginError, RegistrationKind};
use feedhub_plugin::services::registry::{ServiceOptions, ServiceProvider};

use helpers::{TestHost, plugin};

#[derive(Debug)]
struct Clock {
    offset: i64,
}

#[tokio::test]
async fn test_service_reregistration_after_unregister() {
    let host = TestHost::new();
    let services = &host.manager.registries().services;

    services
        .register(
            "clock",
            ServiceProvider::instance(Clock { offset: 1 }),
            "host",
            ServiceOptions::default(),
        )
        .await
        .unwrap();

    let err = services
        .register(
            "clock",
            ServiceProvider::instance(Clock { offset: 2 }),
            "host",
            ServiceOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PluginError::AlreadyRegistered {
            kind: RegistrationKind::Service,
            ..
        }
    ));
    assert_eq!(services.get_as::<Clock>("clock").await.unwrap().offset, 1);

    assert!(services.unregister("clock").await);
    services
        .register(
            "clock",
            ServiceProvider::instance(Clock { offset: 2 }),
            "host",
            ServiceOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(services.get_as::<Clock>("clock").await.unwrap().offset, 2);
}

#[tokio::test]
async fn test_plugin_service_name_collision_fails_the_load() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .service("clock", ServiceProvider::instance(Clock { offset: 0 }), ServiceOptions::default())
            .build(),
    )
    .await
    .unwrap();

    let err = host
        .load(
            plugin("beta")
                .extension("post.actions", 1, helpers::label("B"))
                .service("clock", ServiceProvider::instance(Clock { offset: 9 }), ServiceOptions::default())
                .build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Lifecycle { .. }));
    assert!(host.manager.get_extensions("post.actions").await.is_empty());

    let clock = host
        .manager
        .registries()
        .services
        .get_as::<Clock>("clock")
        .await
        .unwrap();
    assert_eq!(clock.offset, 0);
}

#[tokio::test]
async fn test_singleton_and_transient_factories() {
    let host = TestHost::new();
    let services = &host.manager.registries().services;

    services
        .register(
            "singleton",
            ServiceProvider::factory(|| Clock { offset: 3 }),
            "host",
            ServiceOptions::default(),
        )
        .await
        .unwrap();
    services
        .register(
            "transient",
            ServiceProvider::factory(|| Clock { offset: 4 }),
            "host",
            ServiceOptions::transient(),
        )
        .await
        .unwrap();

    let a = services.get_as::<Clock>("singleton").await.unwrap();
    let b = services.get_as::<Clock>("singleton").await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let c = services.get_as::<Clock>("transient").await.unwrap();
    let d = services.get_as::<Clock>("transient").await.unwrap();
    assert!(!Arc::ptr_eq(&c, &d));
    assert_eq!(d.offset, 4);
}

#[tokio::test]
async fn test_dependency_resolution() {
    let host = TestHost::new();
    let services = &host.manager.registries().services;

    services
        .register(
            "feed",
            ServiceProvider::instance(Clock { offset: 0 }),
            "host",
            ServiceOptions::default().depends_on("clock"),
        )
        .await
        .unwrap();

    let err = services.resolve_dependencies("feed").await.unwrap_err();
    assert!(matches!(err, PluginError::DependencyNotFound { ref dependency, .. } if dependency == "clock"));

    let err = services.resolve_dependencies("ghost").await.unwrap_err();
    assert!(matches!(err, PluginError::ServiceNotFound(_)));

    services
        .register(
            "clock",
            ServiceProvider::instance(Clock { offset: 0 }),
            "host",
            ServiceOptions::default().with_tag("time"),
        )
        .await
        .unwrap();
    assert!(services.resolve_dependencies("feed").await.is_ok());
    assert_eq!(services.find_by_tag("time").await.len(), 1);
}

#[tokio::test]
async fn test_get_all_services_reports_owner() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .service("alpha.clock", ServiceProvider::instance(Clock { offset: 0 }), ServiceOptions::default())
            .build(),
    )
    .await
    .unwrap();

    let all = host.manager.get_all_services().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "alpha.clock");
    assert_eq!(all[0].plugin_id, "alpha");
}
