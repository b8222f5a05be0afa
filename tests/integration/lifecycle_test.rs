//! Integration tests for the plugin lifecycle.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use feedhub_core::config::plugin::PluginSystemConfig;
use feedhub_core::error::AppError;
use feedhub_plugin::error::{LifecyclePhase, PluginError};
use feedhub_plugin::events::{PLUGIN_ACTIVATED, PLUGIN_ERROR, PLUGIN_UNLOADED};
use feedhub_plugin::registry::PluginState;
use feedhub_plugin::services::registry::{ServiceOptions, ServiceProvider};
use feedhub_plugin::store::action::Action;
use feedhub_plugin::store::middleware::MiddlewareAction;

use helpers::{TestHost, failing_activate, label, plugin};

fn counter_slice(state: Option<&Value>, _: &Action) -> Value {
    state.cloned().unwrap_or_else(|| json!(0))
}

#[tokio::test]
async fn test_duplicate_id_never_mutates_state() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .extension("post.actions", 50, label("A"))
            .reducer("alpha", counter_slice)
            .build(),
    )
    .await
    .unwrap();

    let before = host.snapshot().await;

    let activated = Arc::new(AtomicUsize::new(0));
    let calls = activated.clone();
    let duplicate = plugin("alpha")
        .extension("post.actions", 90, label("A2"))
        .extension("feed.header", 10, label("H"))
        .service("alpha.svc", ServiceProvider::instance(1u32), ServiceOptions::default())
        .on_activate(move |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .build();

    let err = host.load(duplicate).await.unwrap_err();
    assert!(matches!(err, PluginError::DuplicateId(ref id) if id == "alpha"));
    assert_eq!(activated.load(Ordering::SeqCst), 0);
    assert_eq!(host.snapshot().await, before);
    assert!(host.manager.get_service("alpha.svc").await.is_none());
}

#[tokio::test]
async fn test_missing_dependency_registers_nothing() {
    let host = TestHost::new();
    let before = host.snapshot().await;

    let err = host
        .load(
            plugin("comments")
                .depends_on("posts")
                .extension("post.actions", 90, label("Comment"))
                .reducer("comments", counter_slice)
                .service("comments.svc", ServiceProvider::instance(1u32), ServiceOptions::default())
                .build(),
        )
        .await
        .unwrap_err();

    match err {
        PluginError::DependencyMissing {
            plugin_id,
            dependency,
        } => {
            assert_eq!(plugin_id, "comments");
            assert_eq!(dependency, "posts");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(host.snapshot().await, before);
    assert!(host.manager.get_plugin("comments").await.is_none());
    assert!(host.manager.get_plugin_state("comments").await.is_none());
}

#[tokio::test]
async fn test_dependency_in_error_state_is_not_satisfied() {
    let host = TestHost::new();
    assert!(host.load(failing_activate("posts", "feed.header")).await.is_err());

    let err = host
        .load(plugin("comments").depends_on("posts").build())
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::DependencyMissing { .. }));
}

#[tokio::test]
async fn test_activate_failure_leaves_error_state_and_no_extensions() {
    let host = TestHost::new();
    let events = host.manager.registries().events.clone();

    let err = host
        .load(failing_activate("broken", "post.actions"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PluginError::Lifecycle {
            phase: LifecyclePhase::Activate,
            ..
        }
    ));

    assert_eq!(
        host.manager.get_plugin_state("broken").await,
        Some(PluginState::Error)
    );
    assert!(host.manager.get_extensions("post.actions").await.is_empty());
    assert!(host.manager.get_plugin_error("broken").await.is_some());

    let errors = events.history_for(PLUGIN_ERROR).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].data["plugin_id"], "broken");
    assert!(events.history_for(PLUGIN_ACTIVATED).await.is_empty());

    // An errored plugin still occupies its id until unloaded.
    let err = host.load(plugin("broken").build()).await.unwrap_err();
    assert!(matches!(err, PluginError::DuplicateId(_)));
    host.manager.unload_plugin("broken").await.unwrap();
    host.load(plugin("broken").build()).await.unwrap();
}

#[tokio::test]
async fn test_unload_sweeps_every_registration() {
    let host = TestHost::new();
    host.load(
        plugin("posts")
            .component("PostCard", label("card"))
            .screen("PostDetail", label("detail"))
            .extension("post.actions", 100, label("Like"))
            .extension("feed.header", 10, label("Compose"))
            .reducer("posts", counter_slice)
            .middleware(|_, _| MiddlewareAction::Continue)
            .service("posts.feed", ServiceProvider::instance(7u32), ServiceOptions::default())
            .on_activate(|ctx| async move {
                ctx.subscribe_to_event("post:created", |_| {}).await;
                ctx.update_plugin_config(json!({ "page_size": 5 })).await?;
                Ok(())
            })
            .build(),
    )
    .await
    .unwrap();

    let registries = host.manager.registries();
    assert_eq!(registries.extensions.total().await, 2);
    assert!(host.store.has_reducer("posts").await);
    assert_eq!(host.store.middleware_count().await, 1);
    assert_eq!(registries.events.subscriber_count("post:created").await, 1);
    assert!(registries.configs.get("posts").await.is_some());

    host.manager.unload_plugin("posts").await.unwrap();

    assert!(host.manager.get_plugin("posts").await.is_none());
    assert!(host.manager.get_plugin_state("posts").await.is_none());
    assert_eq!(registries.extensions.total().await, 0);
    assert!(registries.extensions.points().await.is_empty());
    assert!(host.manager.get_service("posts.feed").await.is_none());
    assert!(!host.store.has_reducer("posts").await);
    assert!(host.store.slice("posts").await.is_none());
    assert_eq!(host.store.middleware_count().await, 0);
    assert_eq!(registries.events.subscriber_count("post:created").await, 0);
    assert!(registries.configs.get("posts").await.is_none());

    let unloaded = registries.events.history_for(PLUGIN_UNLOADED).await;
    assert_eq!(unloaded.len(), 1);
}

#[tokio::test]
async fn test_unload_continues_after_callback_error() {
    let host = TestHost::new();
    host.load(
        plugin("flaky")
            .extension("post.actions", 10, label("Flaky"))
            .on_deactivate(|_| async { Err(AppError::plugin("deactivate failed")) })
            .on_uninstall(|_| async { Err(AppError::plugin("uninstall failed")) })
            .build(),
    )
    .await
    .unwrap();

    let err = host.manager.unload_plugin("flaky").await.unwrap_err();
    assert!(matches!(
        err,
        PluginError::Lifecycle {
            phase: LifecyclePhase::Deactivate,
            ..
        }
    ));
    assert!(host.manager.get_plugin("flaky").await.is_none());
    assert!(host.manager.get_extensions("post.actions").await.is_empty());
}

#[tokio::test]
async fn test_conflicts_are_checked_both_ways() {
    let host = TestHost::new();
    host.load(plugin("light-theme").build()).await.unwrap();

    let err = host
        .load(plugin("dark-theme").conflicts_with("light-theme").build())
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Conflict { ref other, .. } if other == "light-theme"));

    host.manager.unload_plugin("light-theme").await.unwrap();
    host.load(plugin("dark-theme").conflicts_with("light-theme").build())
        .await
        .unwrap();

    let err = host.load(plugin("light-theme").build()).await.unwrap_err();
    assert!(matches!(err, PluginError::Conflict { ref other, .. } if other == "dark-theme"));
}

#[tokio::test]
async fn test_invalid_manifest_rejected() {
    let host = TestHost::new();
    let err = host
        .load(feedhub_plugin_sdk::builder::PluginBuilder::new("odd", "Odd", "one").build())
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::InvalidManifest { .. }));

    for id in ["../escape", "nested/dir", "Posts"] {
        let err = host.load(plugin(id).build()).await.unwrap_err();
        assert!(matches!(err, PluginError::InvalidManifest { .. }), "{id}");
    }

    let err = host
        .load(plugin("loop").depends_on("loop").build())
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::InvalidManifest { .. }));
    assert_eq!(host.manager.summary().await.plugins, 0);
}

#[tokio::test]
async fn test_reload_runs_lifecycle_again() {
    let host = TestHost::new();
    let activations = Arc::new(AtomicUsize::new(0));
    let calls = activations.clone();

    host.load(
        plugin("posts")
            .extension("post.actions", 100, label("Like"))
            .on_activate(move |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build(),
    )
    .await
    .unwrap();

    assert!(host.manager.reload_plugin("posts").await.unwrap());
    assert!(!host.manager.reload_plugin("missing").await.unwrap());

    assert_eq!(activations.load(Ordering::SeqCst), 2);
    assert_eq!(host.priorities("post.actions").await, vec![100]);
    assert_eq!(
        host.manager.get_plugin_state("posts").await,
        Some(PluginState::Activated)
    );
}

#[tokio::test]
async fn test_load_all_honors_settings() {
    let host = TestHost::new();
    let manager = feedhub_plugin::manager::PluginManager::with_store(
        host.manager.registries().clone(),
        host.store.clone(),
    )
    .with_settings(PluginSystemConfig {
        disabled: vec!["beta".to_string()],
        continue_on_error: true,
        ..PluginSystemConfig::default()
    });

    let report = manager
        .load_all(vec![
            plugin("alpha").build(),
            plugin("beta").build(),
            failing_activate("gamma", "post.actions"),
            plugin("delta").depends_on("alpha").build(),
        ])
        .await
        .unwrap();

    assert_eq!(report.loaded, vec!["alpha".to_string(), "delta".to_string()]);
    assert_eq!(report.skipped, vec!["beta".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_success());

    manager.unload_all().await;
    assert!(manager.get_loaded_plugins().await.is_empty());
}

#[tokio::test]
async fn test_load_all_stops_on_first_error_when_configured() {
    let host = TestHost::new();
    let manager = feedhub_plugin::manager::PluginManager::with_store(
        host.manager.registries().clone(),
        host.store.clone(),
    )
    .with_settings(PluginSystemConfig {
        continue_on_error: false,
        ..PluginSystemConfig::default()
    });

    let err = manager
        .load_all(vec![
            plugin("alpha").build(),
            plugin("beta").depends_on("missing").build(),
            plugin("gamma").build(),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::DependencyMissing { .. }));
    assert!(manager.get_plugin("alpha").await.is_some());
    assert!(manager.get_plugin("gamma").await.is_none());
}
